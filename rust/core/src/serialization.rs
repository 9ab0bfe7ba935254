// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loading and saving the store through [`LabelFile`] and [`AnnotationTable`].
//!
//! Saves never touch disk; they enqueue a request on the session. Loads
//! replace the in-memory state wholesale and normalize whatever the file
//! contains so the one-label-per-face invariant holds afterwards.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::annotation::{Annotation, AnnotationTable};
use crate::error::{Error, Result};
use crate::keys::FaceIndex;
use crate::markers::MarkedFeature;
use crate::persistence::{
    LabelFile, LabelRecord, MarkedFeatureRecord, PersistenceRequest, RequestId,
};
use crate::session::SelectionSession;
use crate::store::{LabelEntry, LabelStore};

/// What [`LabelStore::load_labels`] found in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub labels: usize,
    pub markers: usize,
    /// Faces claimed by more than one label; the later claim was kept.
    pub conflicts: usize,
}

impl LabelStore {
    /// Snapshot of labels and markers in the combined file shape.
    pub fn to_label_file(&self) -> LabelFile {
        LabelFile {
            labels: self
                .entries
                .iter()
                .map(|e| LabelRecord {
                    label: e.label.clone(),
                    faces: e.faces.clone(),
                })
                .collect(),
            marked_features: self
                .markers
                .values()
                .map(|m| MarkedFeatureRecord {
                    label: m.label.clone(),
                    position: m.position.into(),
                })
                .collect(),
        }
    }

    /// Replaces labels and markers with the contents of `file`.
    ///
    /// Repeated records for one label are merged. A face claimed by several
    /// labels goes to the last claim; entries emptied that way are dropped,
    /// while entries that were empty in the file (marker placeholders) are
    /// kept. Toggled labels and the highlight are cleared.
    pub fn load_labels(&mut self, session: &mut SelectionSession, file: LabelFile) -> LoadSummary {
        let mut entries: Vec<LabelEntry> = Vec::new();
        let mut positions: FxHashMap<String, usize> = FxHashMap::default();
        let mut owner: FxHashMap<FaceIndex, usize> = FxHashMap::default();
        let mut claimed_any: FxHashSet<usize> = FxHashSet::default();
        let mut conflicts = 0;

        for record in file.labels {
            if record.label.trim().is_empty() {
                tracing::warn!(faces = record.faces.len(), "Skipping label record without a name");
                continue;
            }
            let index = *positions.entry(record.label.clone()).or_insert_with(|| {
                entries.push(LabelEntry::new(record.label.clone()));
                entries.len() - 1
            });
            if !record.faces.is_empty() {
                claimed_any.insert(index);
            }
            for face in record.faces {
                match owner.insert(face, index) {
                    Some(previous) if previous == index => {}
                    Some(previous) => {
                        conflicts += 1;
                        entries[previous].faces.retain(|f| *f != face);
                        entries[index].faces.push(face);
                    }
                    None => entries[index].faces.push(face),
                }
            }
        }

        let mut kept = 0;
        let mut dropped = 0;
        let mut keep = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.faces.is_empty() && claimed_any.contains(&index) {
                dropped += 1;
            } else {
                kept += 1;
                keep.push(entry);
            }
        }
        self.entries = keep;

        let mut markers = SlotMap::with_key();
        for record in file.marked_features {
            markers.insert(MarkedFeature {
                position: record.position.into(),
                label: record.label,
            });
        }
        self.markers = markers;
        self.rebuild_face_index();

        session.clear_toggled();
        session.set_show_features_active(false);
        session.clear_transient_highlight();

        if conflicts > 0 {
            tracing::warn!(conflicts, dropped, "Resolved duplicate face claims in label file");
        }
        tracing::info!(labels = kept, markers = self.markers.len(), "Loaded labels");
        debug_assert!(self.verify_consistency().is_ok());

        LoadSummary {
            labels: kept,
            markers: self.markers.len(),
            conflicts,
        }
    }

    /// Parses a label document (combined or legacy) and loads it.
    pub fn load_labels_json(
        &mut self,
        session: &mut SelectionSession,
        json: &str,
    ) -> Result<LoadSummary> {
        let file = LabelFile::from_json(json)?;
        Ok(self.load_labels(session, file))
    }

    /// Queues a save of labels and markers under the session's base name.
    pub fn save_labels(&self, session: &mut SelectionSession) -> Result<RequestId> {
        if self.is_empty() {
            return Err(Error::NothingToSave);
        }
        let base_name = session.base_name().to_string();
        tracing::info!(
            base_name = %base_name,
            labels = self.entries.len(),
            markers = self.markers.len(),
            "Saving labels"
        );
        Ok(session.enqueue(PersistenceRequest::SaveLabels {
            base_name,
            file: self.to_label_file(),
        }))
    }

    /// Replaces the annotation table.
    pub fn load_annotations(&mut self, table: AnnotationTable) {
        tracing::info!(count = table.len(), "Loaded annotations");
        self.annotations = table;
    }

    /// Queues a save of the annotation table.
    pub fn save_annotations(&self, session: &mut SelectionSession) -> RequestId {
        session.enqueue(PersistenceRequest::SaveAnnotations(self.annotations.clone()))
    }

    /// The annotation for `label`.
    pub fn annotation(&self, label: &str) -> Option<&Annotation> {
        self.annotations.get(label)
    }

    /// Stores the annotation for `label`, returning the one it replaced.
    pub fn set_annotation(&mut self, label: &str, annotation: Annotation) -> Option<Annotation> {
        self.annotations.insert(label.to_string(), annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Condition;
    use crate::keys::FaceSet;
    use crate::persistence::Position;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn set(faces: &[FaceIndex]) -> FaceSet {
        faces.iter().copied().collect()
    }

    #[test]
    fn save_then_load_reproduces_labels_and_markers() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::with_base_name("site");
        store.assign_label("Wall", &set(&[4, 1, 9])).unwrap();
        store.assign_label("Floor", &set(&[2, 3])).unwrap();
        store.mark_feature(&mut session, Some("Post"), Point3::new(0.5, -1.0, 2.0));

        store.save_labels(&mut session).unwrap();
        let (_, request) = session.drain_requests().pop().unwrap();
        let PersistenceRequest::SaveLabels { base_name, file } = request else {
            panic!("expected a label save");
        };
        assert_eq!(base_name, "site");
        let json = file.to_json().unwrap();

        let mut restored = LabelStore::new();
        let mut fresh = SelectionSession::new();
        let summary = restored.load_labels_json(&mut fresh, &json).unwrap();
        assert_eq!(summary.labels, 3);
        assert_eq!(summary.markers, 1);
        assert_eq!(summary.conflicts, 0);

        for entry in store.entries() {
            assert_eq!(restored.entry(&entry.label).unwrap().face_set(), entry.face_set());
        }
        assert_eq!(restored.entries().len(), store.entries().len());
        let markers: Vec<MarkedFeature> = restored.markers().map(|(_, m)| m.clone()).collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].label, "Post");
        assert_relative_eq!(markers[0].position, Point3::new(0.5, -1.0, 2.0), epsilon = 1e-12);
        assert_eq!(restored.labeled_faces().len(), 5);
    }

    #[test]
    fn legacy_array_loads_with_no_markers() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        store
            .load_labels_json(&mut session, r#"[{"label":"X","faces":[1,2]}]"#)
            .unwrap();
        assert_eq!(store.marker_count(), 0);
        assert_eq!(
            store.entries(),
            &[LabelEntry {
                label: "X".into(),
                faces: vec![1, 2]
            }]
        );
    }

    #[test]
    fn load_normalizes_duplicate_claims() {
        let file = LabelFile {
            labels: vec![
                LabelRecord {
                    label: "A".into(),
                    faces: vec![1, 2],
                },
                LabelRecord {
                    label: "B".into(),
                    faces: vec![2, 3, 3],
                },
                LabelRecord {
                    label: "C".into(),
                    faces: vec![1],
                },
                LabelRecord {
                    label: "Marker".into(),
                    faces: vec![],
                },
                LabelRecord {
                    label: "B".into(),
                    faces: vec![4],
                },
            ],
            marked_features: vec![MarkedFeatureRecord {
                label: "Marker".into(),
                position: Position {
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                },
            }],
        };
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        let summary = store.load_labels(&mut session, file);

        assert_eq!(summary.conflicts, 2);
        assert!(store.entry("A").is_none());
        assert_eq!(store.entry("B").unwrap().faces, vec![2, 3, 4]);
        assert_eq!(store.entry("C").unwrap().faces, vec![1]);
        assert!(store.entry("Marker").unwrap().faces.is_empty());
        assert!(store.verify_consistency().is_ok());
    }

    #[test]
    fn load_resets_view_state() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        store.assign_label("A", &set(&[1])).unwrap();
        store.toggle_label(&mut session, "A", true);

        store.load_labels(&mut session, LabelFile::default());
        assert!(session.toggled_labels().is_empty());
        assert_eq!(session.currently_highlighted(), None);
        assert!(session.finalized_faces().is_empty());
        assert!(store.labeled_faces().is_empty());
    }

    #[test]
    fn saving_empty_store_is_refused() {
        let store = LabelStore::new();
        let mut session = SelectionSession::new();
        assert!(matches!(store.save_labels(&mut session), Err(Error::NothingToSave)));
        assert!(session.requests().pending().is_empty());
    }

    #[test]
    fn annotations_survive_face_loss() {
        let mut store = LabelStore::new();
        store.assign_label("A", &set(&[1])).unwrap();
        store.set_annotation(
            "A",
            Annotation {
                condition: Condition::NotInPhase,
                ..Annotation::default()
            },
        );
        store.assign_label("B", &set(&[1])).unwrap();
        assert!(store.entry("A").is_none());
        assert_eq!(store.annotation("A").unwrap().condition, Condition::NotInPhase);

        let mut session = SelectionSession::new();
        store.save_annotations(&mut session);
        assert!(matches!(
            &session.requests().pending()[0].1,
            PersistenceRequest::SaveAnnotations(t) if t.contains_key("A")
        ));
    }
}
