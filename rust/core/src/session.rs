// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! View state for one operator session.
//!
//! Nothing in here is persisted. The session is handed explicitly to every
//! store and engine call that reads or changes what the operator sees, so the
//! order of those changes is visible at the call site.

use crate::error::Error;
use crate::keys::{FaceIndex, FaceSet};
use crate::persistence::{
    PersistenceQueue, PersistenceRequest, RequestId, DEFAULT_BASE_NAME,
};

/// Severity of a message surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message the host should show the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Selection and highlight state plus outgoing persistence work.
#[derive(Debug)]
pub struct SelectionSession {
    selected_faces: FaceSet,
    finalized_faces: FaceSet,
    toggled_labels: Vec<String>,
    currently_highlighted: Option<String>,
    show_features_active: bool,
    base_name: String,
    requests: PersistenceQueue,
    notices: Vec<Notice>,
}

impl Default for SelectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSession {
    /// Creates an empty session saving under the `"default"` base name.
    pub fn new() -> Self {
        Self {
            selected_faces: FaceSet::default(),
            finalized_faces: FaceSet::default(),
            toggled_labels: Vec::new(),
            currently_highlighted: None,
            show_features_active: false,
            base_name: DEFAULT_BASE_NAME.to_string(),
            requests: PersistenceQueue::new(),
            notices: Vec::new(),
        }
    }

    /// Creates an empty session saving under `base_name`.
    pub fn with_base_name(base_name: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.set_base_name(base_name);
        session
    }

    // ---- Selection ----

    /// Transient selection: the latest Mode A result or the live drag result.
    pub fn selected_faces(&self) -> &FaceSet {
        &self.selected_faces
    }

    /// Sticky selection accumulated across polygon operations.
    pub fn finalized_faces(&self) -> &FaceSet {
        &self.finalized_faces
    }

    /// Replaces the transient selection.
    pub fn set_selected_faces(&mut self, faces: FaceSet) {
        self.selected_faces = faces;
    }

    /// Adds one face to the transient selection.
    pub fn select_face(&mut self, face: FaceIndex) {
        self.selected_faces.insert(face);
    }

    /// Merges the transient selection into the finalized one.
    pub fn finalize_selected(&mut self) {
        self.finalized_faces
            .extend(self.selected_faces.iter().copied());
    }

    /// Union of the finalized and transient selections.
    pub fn pending_faces(&self) -> FaceSet {
        let mut faces = self.finalized_faces.clone();
        faces.extend(self.selected_faces.iter().copied());
        faces
    }

    /// Clears the transient selection only.
    pub fn clear_selected(&mut self) {
        self.selected_faces.clear();
    }

    /// Clears both selections.
    pub fn clear_selection(&mut self) {
        self.selected_faces.clear();
        self.finalized_faces.clear();
    }

    /// Clears both selections and the currently highlighted label.
    ///
    /// Label assignments and toggled labels are untouched.
    pub fn clear_transient_highlight(&mut self) {
        self.clear_selection();
        self.currently_highlighted = None;
    }

    pub(crate) fn replace_selection(&mut self, faces: FaceSet) {
        self.selected_faces.clear();
        self.finalized_faces = faces;
    }

    // ---- Highlight ----

    /// Labels requested for highlight, in the order they were switched on.
    pub fn toggled_labels(&self) -> &[String] {
        &self.toggled_labels
    }

    pub fn is_toggled(&self, label: &str) -> bool {
        self.toggled_labels.iter().any(|l| l == label)
    }

    pub(crate) fn insert_toggled(&mut self, label: &str) -> bool {
        if self.is_toggled(label) {
            return false;
        }
        self.toggled_labels.push(label.to_string());
        true
    }

    pub(crate) fn remove_toggled(&mut self, label: &str) -> bool {
        let before = self.toggled_labels.len();
        self.toggled_labels.retain(|l| l != label);
        before != self.toggled_labels.len()
    }

    pub(crate) fn clear_toggled(&mut self) {
        self.toggled_labels.clear();
    }

    /// Label whose faces are the focus of the current highlight.
    pub fn currently_highlighted(&self) -> Option<&str> {
        self.currently_highlighted.as_deref()
    }

    pub(crate) fn set_currently_highlighted(&mut self, label: Option<String>) {
        self.currently_highlighted = label;
    }

    /// Whether "show features" is switched on.
    pub fn show_features_active(&self) -> bool {
        self.show_features_active
    }

    pub(crate) fn set_show_features_active(&mut self, on: bool) {
        self.show_features_active = on;
    }

    // ---- Persistence ----

    /// Base name the label file is saved under.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Sets the label-file base name; blank names fall back to `"default"`.
    pub fn set_base_name(&mut self, base_name: impl Into<String>) {
        let base_name = base_name.into();
        self.base_name = if base_name.trim().is_empty() {
            DEFAULT_BASE_NAME.to_string()
        } else {
            base_name
        };
    }

    /// Queues work for the persistence collaborator.
    pub fn enqueue(&mut self, request: PersistenceRequest) -> RequestId {
        self.requests.enqueue(request)
    }

    /// Read access to the request queue.
    pub fn requests(&self) -> &PersistenceQueue {
        &self.requests
    }

    /// Hands every queued request to the host.
    pub fn drain_requests(&mut self) -> Vec<(RequestId, PersistenceRequest)> {
        self.requests.drain()
    }

    /// Reports the outcome of a drained request.
    ///
    /// A failure becomes a warning notice; in-memory state is left as is so
    /// the operator can retry the save.
    pub fn complete_request(&mut self, id: RequestId, outcome: Result<(), String>) {
        if let Err(err) = self.requests.complete(id, outcome) {
            self.notify(NoticeLevel::Warning, err.to_string());
        }
    }

    // ---- Notices ----

    /// Pushes an operator-facing message.
    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Surfaces an error as a notice at the level its category implies.
    pub fn report(&mut self, err: &Error) {
        let level = if err.is_user_input() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Error
        };
        self.notify(level, err.to_string());
    }

    /// Messages not yet shown.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Takes every pending message.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
