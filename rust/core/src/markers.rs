// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marked features: labeled points on the mesh, independent of face ownership.

use nalgebra::Point3;

use crate::annotation::{Annotation, Condition};
use crate::error::{Error, Result};
use crate::keys::MarkerKey;
use crate::persistence::PersistenceRequest;
use crate::session::SelectionSession;
use crate::store::{LabelEntry, LabelStore};

/// Name given to a feature when the operator confirms an empty name.
pub const DEFAULT_FEATURE_NAME: &str = "Feature";

/// A labeled point in mesh-local (pivot) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedFeature {
    pub position: Point3<f64>,
    pub label: String,
}

impl LabelStore {
    /// Every marker with its key.
    pub fn markers(&self) -> impl Iterator<Item = (MarkerKey, &MarkedFeature)> {
        self.markers.iter()
    }

    /// The marker behind `key`.
    pub fn marker(&self, key: MarkerKey) -> Option<&MarkedFeature> {
        self.markers.get(key)
    }

    /// Number of markers.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Whether any marker carries `label`.
    pub fn is_marker_label(&self, label: &str) -> bool {
        self.markers.values().any(|m| m.label == label)
    }

    /// Places a feature marker at `position`.
    ///
    /// `name` is the operator's answer to the name prompt: `None` means the
    /// prompt was cancelled and nothing is added; a blank name becomes
    /// [`DEFAULT_FEATURE_NAME`]. The label gets an empty placeholder entry if
    /// it has none, is switched on for highlight, and its annotation is
    /// created (or updated) with Condition `In Phase`.
    pub fn mark_feature(
        &mut self,
        session: &mut SelectionSession,
        name: Option<&str>,
        position: Point3<f64>,
    ) -> Option<MarkerKey> {
        let name = name?.trim();
        let label = if name.is_empty() {
            DEFAULT_FEATURE_NAME
        } else {
            name
        };

        let key = self.markers.insert(MarkedFeature {
            position,
            label: label.to_string(),
        });
        if self.entry_position(label).is_none() {
            self.entries.push(LabelEntry::new(label));
        }
        session.insert_toggled(label);
        self.annotations
            .entry(label.to_string())
            .and_modify(|a| a.condition = Condition::InPhase)
            .or_insert_with(Annotation::for_marked_feature);

        tracing::info!(label, x = position.x, y = position.y, z = position.z, "Marked feature");
        Some(key)
    }

    /// Deletes the marker behind `key`.
    ///
    /// The label's entry is removed only when it owns no faces, so a label
    /// that also names a face selection keeps its faces. The label is switched
    /// off, its annotation is deleted, and saves of the label file and the
    /// annotation table are queued.
    pub fn delete_marked_feature(
        &mut self,
        session: &mut SelectionSession,
        label: &str,
        key: MarkerKey,
    ) -> Result<MarkedFeature> {
        match self.markers.get(key) {
            Some(marker) if marker.label == label => {}
            _ => return Err(Error::MarkerNotFound(key)),
        }
        let removed = self.markers.remove(key).ok_or(Error::MarkerNotFound(key))?;

        if let Some(index) = self.entry_position(label) {
            if self.entries[index].faces.is_empty() {
                self.entries.remove(index);
            }
        }
        session.remove_toggled(label);
        let had_annotation = self.annotations.remove(label).is_some();

        self.enqueue_label_save(session);
        if had_annotation {
            session.enqueue(PersistenceRequest::SaveAnnotations(self.annotations.clone()));
        }

        tracing::info!(label, "Deleted marked feature");
        debug_assert!(self.verify_consistency().is_ok());
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::FaceSet;

    fn origin() -> Point3<f64> {
        Point3::new(0.0, 0.0, 0.0)
    }

    #[test]
    fn cancelled_prompt_adds_nothing() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        assert!(store.mark_feature(&mut session, None, origin()).is_none());
        assert!(store.is_empty());
        assert!(session.toggled_labels().is_empty());
    }

    #[test]
    fn blank_name_uses_default_and_creates_placeholder() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        let key = store
            .mark_feature(&mut session, Some("  "), Point3::new(1.0, 2.0, 3.0))
            .unwrap();

        assert_eq!(store.marker(key).unwrap().label, DEFAULT_FEATURE_NAME);
        assert!(store.entry(DEFAULT_FEATURE_NAME).unwrap().faces.is_empty());
        assert!(session.is_toggled(DEFAULT_FEATURE_NAME));
        let annotation = &store.annotations()[DEFAULT_FEATURE_NAME];
        assert_eq!(annotation.condition, Condition::InPhase);
        assert_eq!(annotation.photo_done, "yes");
    }

    #[test]
    fn marking_existing_label_only_sets_condition() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        store.annotations.insert(
            "Hearth".into(),
            Annotation {
                condition: Condition::NotInPhase,
                find_code: "H-1".into(),
                ..Annotation::default()
            },
        );
        store.mark_feature(&mut session, Some("Hearth"), origin());
        let annotation = &store.annotations()["Hearth"];
        assert_eq!(annotation.condition, Condition::InPhase);
        assert_eq!(annotation.find_code, "H-1");
        assert_eq!(annotation.photo_done, "");
    }

    #[test]
    fn delete_keeps_entry_that_owns_faces() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        let faces: FaceSet = [4, 5].into_iter().collect();
        store.assign_label("Pit", &faces).unwrap();
        let key = store.mark_feature(&mut session, Some("Pit"), origin()).unwrap();

        store.delete_marked_feature(&mut session, "Pit", key).unwrap();
        assert_eq!(store.entry("Pit").unwrap().faces.len(), 2);
        assert!(!session.is_toggled("Pit"));
        assert!(!store.annotations().contains_key("Pit"));
        assert_eq!(store.marker_count(), 0);
    }

    #[test]
    fn delete_removes_placeholder_and_spares_other_markers() {
        let mut store = LabelStore::new();
        let mut session = SelectionSession::new();
        let a = store.mark_feature(&mut session, Some("Post"), origin()).unwrap();
        let b = store
            .mark_feature(&mut session, Some("Post"), Point3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(store.entries().len(), 1);
        session.drain_requests();

        store.delete_marked_feature(&mut session, "Post", a).unwrap();
        assert!(store.entry("Post").is_none());
        assert!(store.marker(b).is_some());
        assert!(store.marker(a).is_none());

        let requests = session.drain_requests();
        assert!(matches!(
            &requests[0].1,
            PersistenceRequest::SaveLabels { file, .. } if file.marked_features.len() == 1
        ));
        assert!(matches!(requests[1].1, PersistenceRequest::SaveAnnotations(_)));

        let err = store.delete_marked_feature(&mut session, "Post", a).unwrap_err();
        assert!(matches!(err, Error::MarkerNotFound(k) if k == a));
    }
}
