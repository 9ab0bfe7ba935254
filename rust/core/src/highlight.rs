// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Highlight state and the queries the renderer reads.

use nalgebra::Point3;

use crate::annotation::{Condition, HighlightColor};
use crate::keys::{FaceIndex, FaceSet, MarkerKey};
use crate::session::SelectionSession;
use crate::store::LabelStore;

/// How a visible marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Green, unit scale.
    Default,
    /// Yellow, scaled up: the marker of the highlighted label.
    Emphasized,
}

impl MarkerStyle {
    pub fn rgb(self) -> [f32; 3] {
        match self {
            MarkerStyle::Default => [0.0, 1.0, 0.0],
            MarkerStyle::Emphasized => [1.0, 1.0, 0.0],
        }
    }

    pub fn scale(self) -> f32 {
        match self {
            MarkerStyle::Default => 1.0,
            MarkerStyle::Emphasized => 1.5,
        }
    }
}

/// A marker the renderer should show.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub key: MarkerKey,
    pub label: String,
    pub position: Point3<f64>,
    pub style: MarkerStyle,
}

/// One row of the face-label list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelListItem {
    pub label: String,
    pub face_count: usize,
    pub toggled: bool,
    /// `None` when the annotation sets no recognized Condition.
    pub color: Option<HighlightColor>,
}

impl LabelStore {
    /// Color of a highlighted face: the owning label's Condition, red when
    /// the face is unlabeled.
    pub fn face_color(&self, face: FaceIndex) -> HighlightColor {
        let condition = self
            .label_of(face)
            .and_then(|label| self.annotations.get(label))
            .map(|a| &a.condition);
        HighlightColor::for_condition(condition)
    }

    /// List color for a label: green for `In Phase`, red for `Not in Phase`,
    /// uncolored otherwise.
    pub fn label_color(&self, label: &str) -> Option<HighlightColor> {
        match self.annotations.get(label).map(|a| &a.condition) {
            Some(Condition::InPhase) => Some(HighlightColor::Green),
            Some(Condition::NotInPhase) => Some(HighlightColor::Red),
            _ => None,
        }
    }

    /// Every highlighted face (transient and finalized) with its color,
    /// ordered by face index.
    pub fn highlighted_faces(&self, session: &SelectionSession) -> Vec<(FaceIndex, HighlightColor)> {
        let mut faces: Vec<FaceIndex> = session.pending_faces().into_iter().collect();
        faces.sort_unstable();
        faces
            .into_iter()
            .map(|face| (face, self.face_color(face)))
            .collect()
    }

    /// Replaces both selections with the union of the toggled labels' faces.
    ///
    /// The highlighted label becomes the toggled label when exactly one is
    /// toggled, and `None` otherwise.
    pub fn highlight_faces_by_labels(&self, session: &mut SelectionSession) {
        let mut faces = FaceSet::default();
        for label in session.toggled_labels() {
            if let Some(entry) = self.entry(label) {
                faces.extend(entry.faces.iter().copied());
            }
        }
        session.replace_selection(faces);

        let current = match session.toggled_labels() {
            [only] => Some(only.clone()),
            _ => None,
        };
        session.set_currently_highlighted(current);
    }

    /// Switches a label's highlight on or off and recomputes the highlight.
    ///
    /// A label switched on takes the focus even when others stay toggled.
    pub fn toggle_label(&self, session: &mut SelectionSession, label: &str, on: bool) {
        if on {
            session.insert_toggled(label);
        } else {
            session.remove_toggled(label);
        }
        self.highlight_faces_by_labels(session);
        if on {
            session.set_currently_highlighted(Some(label.to_string()));
        }
        tracing::debug!(label, on, toggled = session.toggled_labels().len(), "Toggled label");
    }

    /// Switches every marker label on or off.
    pub fn show_features(&self, session: &mut SelectionSession, on: bool) {
        session.set_show_features_active(on);
        for marker in self.markers.values() {
            if on {
                session.insert_toggled(&marker.label);
            } else {
                session.remove_toggled(&marker.label);
            }
        }
        self.highlight_faces_by_labels(session);
    }

    /// Markers whose label is toggled; the highlighted label's markers are
    /// emphasized.
    pub fn visible_markers(&self, session: &SelectionSession) -> Vec<MarkerView> {
        let current = session.currently_highlighted();
        self.markers
            .iter()
            .filter(|(_, m)| session.is_toggled(&m.label))
            .map(|(key, m)| MarkerView {
                key,
                label: m.label.clone(),
                position: m.position,
                style: if current == Some(m.label.as_str()) {
                    MarkerStyle::Emphasized
                } else {
                    MarkerStyle::Default
                },
            })
            .collect()
    }

    /// Face labels for the label list, excluding labels that name a marker.
    pub fn label_list(&self, session: &SelectionSession) -> Vec<LabelListItem> {
        self.entries
            .iter()
            .filter(|e| !self.is_marker_label(&e.label))
            .map(|e| LabelListItem {
                label: e.label.clone(),
                face_count: e.faces.len(),
                toggled: session.is_toggled(&e.label),
                color: self.label_color(&e.label),
            })
            .collect()
    }
}
