// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The label store: face ownership, marked features and annotations.
//!
//! The ordered [`LabelEntry`] list is the source of truth for face ownership.
//! `labeled_faces` is its exact inverse and is patched on every mutation; any
//! divergence found by [`LabelStore::verify_consistency`] is repaired by
//! rebuilding the index from the entries.
//!
//! Marker operations live in `markers.rs`, highlight queries in
//! `highlight.rs` and load/save in `serialization.rs`; all of them are further
//! `impl LabelStore` blocks over the same fields.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::annotation::AnnotationTable;
use crate::error::{Error, Result};
use crate::keys::{FaceIndex, FaceSet, MarkerKey};
use crate::markers::MarkedFeature;
use crate::persistence::PersistenceRequest;
use crate::session::SelectionSession;

/// Faces are appended to an entry in chunks of this size.
pub const ASSIGN_BATCH_SIZE: usize = 1000;

/// A label and the faces it currently owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub label: String,
    /// Faces in the order they were assigned. Never contains duplicates.
    pub faces: Vec<FaceIndex>,
}

impl LabelEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            faces: Vec::new(),
        }
    }

    /// Faces as a set, for order-insensitive comparisons.
    pub fn face_set(&self) -> FaceSet {
        self.faces.iter().copied().collect()
    }
}

/// What [`LabelStore::assign_label`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOutcome {
    /// The trimmed label the faces now belong to.
    pub label: String,
    /// Faces newly appended to the entry.
    pub added: usize,
    /// Faces taken away from other labels.
    pub reassigned: usize,
    /// Labels whose entries were emptied and removed.
    pub removed_labels: Vec<String>,
    /// Whether the entry did not exist before.
    pub created: bool,
}

/// Owner of labels, face ownership, marked features and annotations.
#[derive(Debug, Default)]
pub struct LabelStore {
    pub(crate) entries: Vec<LabelEntry>,
    pub(crate) labeled_faces: FxHashMap<FaceIndex, String>,
    pub(crate) annotations: AnnotationTable,
    pub(crate) markers: SlotMap<MarkerKey, MarkedFeature>,
}

impl LabelStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Label entries in insertion order.
    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    /// The entry for `label`, if any.
    pub fn entry(&self, label: &str) -> Option<&LabelEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub(crate) fn entry_position(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.label == label)
    }

    /// The derived `face -> label` index.
    pub fn labeled_faces(&self) -> &FxHashMap<FaceIndex, String> {
        &self.labeled_faces
    }

    /// The label owning `face`.
    pub fn label_of(&self, face: FaceIndex) -> Option<&str> {
        self.labeled_faces.get(&face).map(String::as_str)
    }

    /// All annotation records.
    pub fn annotations(&self) -> &AnnotationTable {
        &self.annotations
    }

    /// Whether the store holds no entries and no markers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.markers.is_empty()
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    /// Assigns `faces` to `label`, taking them away from any other label.
    ///
    /// Entries left without faces are removed, including empty marker
    /// placeholders belonging to other labels. Faces already owned by `label`
    /// keep their position; new ones are appended in ascending order.
    pub fn assign_label(&mut self, label: &str, faces: &FaceSet) -> Result<AssignOutcome> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::EmptyLabel);
        }
        if faces.is_empty() {
            return Err(Error::NoFacesSelected);
        }

        let mut reassigned = 0;
        for face in faces {
            if let Some(owner) = self.labeled_faces.get(face) {
                if owner != label {
                    reassigned += 1;
                }
            }
        }

        for entry in self.entries.iter_mut().filter(|e| e.label != label) {
            entry.faces.retain(|f| !faces.contains(f));
        }
        let mut removed_labels = Vec::new();
        self.entries.retain(|e| {
            if e.label != label && e.faces.is_empty() {
                removed_labels.push(e.label.clone());
                false
            } else {
                true
            }
        });

        let (index, created) = match self.entry_position(label) {
            Some(index) => (index, false),
            None => {
                self.entries.push(LabelEntry::new(label));
                (self.entries.len() - 1, true)
            }
        };

        let entry = &mut self.entries[index];
        let present: FxHashSet<FaceIndex> = entry.faces.iter().copied().collect();
        let mut new_faces: Vec<FaceIndex> = faces
            .iter()
            .copied()
            .filter(|f| !present.contains(f))
            .collect();
        new_faces.sort_unstable();
        let added = new_faces.len();
        for chunk in new_faces.chunks(ASSIGN_BATCH_SIZE) {
            entry.faces.extend_from_slice(chunk);
        }

        for &face in faces {
            self.labeled_faces.insert(face, label.to_string());
        }

        tracing::info!(
            label,
            added,
            reassigned,
            removed = removed_labels.len(),
            "Assigned faces to label"
        );
        debug_assert!(self.verify_consistency().is_ok());

        Ok(AssignOutcome {
            label: label.to_string(),
            added,
            reassigned,
            removed_labels,
            created,
        })
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes a label: its entry, its face claims and its annotation.
    ///
    /// Marked features carrying the label are left in place. Attached images
    /// are scheduled for deletion, followed by saves of the annotation table
    /// and the label file. Clears the transient highlight when `label` was the
    /// one highlighted.
    pub fn delete_label(&mut self, session: &mut SelectionSession, label: &str) -> Result<()> {
        let entry = self.entry_position(label).map(|i| self.entries.remove(i));
        let annotation = self.annotations.remove(label);
        let before = self.labeled_faces.len();
        self.labeled_faces.retain(|_, owner| owner != label);
        let unclaimed = before - self.labeled_faces.len();

        if entry.is_none() && annotation.is_none() && unclaimed == 0 {
            return Err(Error::LabelNotFound(label.to_string()));
        }

        if let Some(annotation) = &annotation {
            for filename in annotation.attached_image_files() {
                session.enqueue(PersistenceRequest::DeleteImage { filename });
            }
            session.enqueue(PersistenceRequest::SaveAnnotations(self.annotations.clone()));
        }

        if session.currently_highlighted() == Some(label) {
            session.clear_transient_highlight();
        }
        session.remove_toggled(label);

        self.enqueue_label_save(session);

        tracing::info!(
            label,
            faces = entry.as_ref().map_or(0, |e| e.faces.len()),
            had_annotation = annotation.is_some(),
            "Deleted label"
        );
        self.ensure_consistent();
        Ok(())
    }

    /// Removes `faces` from whichever labels own them, dropping emptied entries.
    pub fn unassign_faces(&mut self, faces: &FaceSet) -> Vec<String> {
        for entry in &mut self.entries {
            entry.faces.retain(|f| !faces.contains(f));
        }
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            if e.faces.is_empty() && faces_were_claimed(&self.labeled_faces, &e.label, faces) {
                removed.push(e.label.clone());
                false
            } else {
                true
            }
        });
        for face in faces {
            self.labeled_faces.remove(face);
        }
        debug_assert!(self.verify_consistency().is_ok());
        removed
    }

    pub(crate) fn enqueue_label_save(&self, session: &mut SelectionSession) {
        let base_name = session.base_name().to_string();
        session.enqueue(PersistenceRequest::SaveLabels {
            base_name,
            file: self.to_label_file(),
        });
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Checks that no face is claimed twice and that `labeled_faces` is the
    /// exact inverse of the entries.
    pub fn verify_consistency(&self) -> Result<()> {
        let mut expected: FxHashMap<FaceIndex, &str> = FxHashMap::default();
        for entry in &self.entries {
            for &face in &entry.faces {
                if let Some(previous) = expected.insert(face, entry.label.as_str()) {
                    return Err(Error::ConsistencyViolation(format!(
                        "face {face} is claimed by both {previous:?} and {:?}",
                        entry.label
                    )));
                }
            }
        }
        if expected.len() != self.labeled_faces.len() {
            return Err(Error::ConsistencyViolation(format!(
                "index holds {} faces, entries hold {}",
                self.labeled_faces.len(),
                expected.len()
            )));
        }
        for (face, label) in &self.labeled_faces {
            match expected.get(face) {
                Some(owner) if *owner == label.as_str() => {}
                Some(owner) => {
                    return Err(Error::ConsistencyViolation(format!(
                        "face {face} indexed as {label:?} but owned by {owner:?}"
                    )))
                }
                None => {
                    return Err(Error::ConsistencyViolation(format!(
                        "face {face} indexed as {label:?} but owned by no entry"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Verifies the index and rebuilds it from the entries when it diverged.
    /// Returns `true` when a rebuild was needed.
    pub fn ensure_consistent(&mut self) -> bool {
        match self.verify_consistency() {
            Ok(()) => false,
            Err(err) => {
                tracing::error!(error = %err, "Rebuilding labeled-faces index");
                self.rebuild_face_index();
                true
            }
        }
    }

    /// Rebuilds `labeled_faces` from the entries. A face listed by several
    /// entries goes to the last one, and is removed from the earlier ones.
    pub fn rebuild_face_index(&mut self) {
        self.labeled_faces.clear();
        for entry in &self.entries {
            for &face in &entry.faces {
                self.labeled_faces.insert(face, entry.label.clone());
            }
        }
        let owners = &self.labeled_faces;
        for entry in &mut self.entries {
            let mut seen = FxHashSet::default();
            entry
                .faces
                .retain(|f| owners.get(f) == Some(&entry.label) && seen.insert(*f));
        }
    }

    #[cfg(test)]
    pub(crate) fn corrupt_index_for_test(&mut self, face: FaceIndex, label: &str) {
        self.labeled_faces.insert(face, label.to_string());
    }
}

fn faces_were_claimed(
    labeled_faces: &FxHashMap<FaceIndex, String>,
    label: &str,
    faces: &FaceSet,
) -> bool {
    faces
        .iter()
        .any(|f| labeled_faces.get(f).is_some_and(|owner| owner == label))
}
