// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The selection lifecycle: when points may be added, when a polygon is
//! resolved into faces, and when those faces are offered for labeling.
//!
//! ```text
//! Idle --click--> Drawing --secondary--> Resolving --poll...--> Finalized
//!  ^                 |  (< 3 points: error)                         |
//!  |                 v                                            click
//!  +------------- Idle                                              v
//!  +---------------------------- Cleared <--yes/no------------ LabelPrompt
//! ```
//!
//! Cancel returns to `Idle` from every state except `LabelPrompt`. The
//! [`Labeler`] owns only the polygon and the in-flight scan; selection and
//! highlight state live in the [`SelectionSession`] passed to each call.

use facemark_core::{AssignOutcome, FaceSet, LabelStore, NoticeLevel, SelectionSession};
use nalgebra::Point2;

use crate::camera::Viewport;
use crate::capture::{CaptureOutcome, PolygonCapture};
use crate::centroid_scan::{CentroidScan, ScanStatus};
use crate::config::SelectionConfig;
use crate::error::{Error, Result};
use crate::geometry::GeometryAccessor;
use crate::overlap::DragPolygon;

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No polygon.
    Idle,
    /// Points are being added.
    Drawing,
    /// The centroid scan is running.
    Resolving { progress: u8 },
    /// The polygon is resolved; its faces are in the finalized selection.
    Finalized,
    /// The operator is being asked whether to label the selection.
    LabelPrompt,
    /// The prompt was answered and the selection reset. Behaves like `Idle`.
    Cleared,
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Drawing => "drawing",
            LifecycleState::Resolving { .. } => "resolving",
            LifecycleState::Finalized => "finalized",
            LifecycleState::LabelPrompt => "label prompt",
            LifecycleState::Cleared => "cleared",
        }
    }

    /// Whether a primary click may add a polygon point.
    pub fn accepts_points(&self) -> bool {
        matches!(
            self,
            LifecycleState::Idle | LifecycleState::Drawing | LifecycleState::Cleared
        )
    }
}

/// How the label prompt was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The faces were assigned.
    Assigned(AssignOutcome),
    /// The selection was discarded.
    Discarded,
}

/// Drives polygon capture and resolution for one mesh.
#[derive(Debug, Clone)]
pub struct Labeler {
    config: SelectionConfig,
    state: LifecycleState,
    capture: PolygonCapture,
    scan: Option<CentroidScan>,
}

impl Default for Labeler {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl Labeler {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            state: LifecycleState::Idle,
            capture: PolygonCapture::new(config),
            scan: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// The polygon being drawn.
    pub fn capture(&self) -> &PolygonCapture {
        &self.capture
    }

    /// Returns and resets the overlay refresh flag.
    pub fn take_redraw(&mut self) -> bool {
        self.capture.take_redraw()
    }

    /// Progress of the running scan, if any.
    pub fn progress(&self) -> Option<u8> {
        match self.state {
            LifecycleState::Resolving { progress } => Some(progress),
            _ => None,
        }
    }

    // =========================================================================
    // Operator input
    // =========================================================================

    /// Primary click at a screen point.
    ///
    /// While drawing, offers the point to the capture. Once finalized, opens
    /// the label prompt if anything is selected; with nothing selected the
    /// click starts a new polygon instead.
    pub fn primary_click<G>(
        &mut self,
        geometry: &G,
        session: &mut SelectionSession,
        point: Point2<f64>,
    ) -> LifecycleState
    where
        G: GeometryAccessor + ?Sized,
    {
        match self.state {
            LifecycleState::Resolving { .. } | LifecycleState::LabelPrompt => {}
            LifecycleState::Finalized if !session.pending_faces().is_empty() => {
                self.transition(LifecycleState::LabelPrompt);
            }
            LifecycleState::Finalized
            | LifecycleState::Idle
            | LifecycleState::Cleared
            | LifecycleState::Drawing => {
                if let CaptureOutcome::Accepted { .. } = self.capture.add_point(geometry, point) {
                    self.transition(LifecycleState::Drawing);
                }
            }
        }
        self.state
    }

    /// Secondary click: closes the polygon and starts the centroid scan.
    ///
    /// A polygon with fewer than three points is discarded, the transient
    /// selection cleared, and [`Error::TooFewPoints`] returned (also pushed
    /// to the session as a notice).
    pub fn secondary_click<G>(
        &mut self,
        geometry: &G,
        session: &mut SelectionSession,
    ) -> Result<LifecycleState>
    where
        G: GeometryAccessor + ?Sized,
    {
        if self.state != LifecycleState::Drawing {
            return Ok(self.state);
        }

        // Interpolated points do not count towards the minimum.
        let clicks = self.capture.accepted_count();
        let scan = if clicks < 3 {
            Err(Error::TooFewPoints(clicks))
        } else {
            CentroidScan::new(self.capture.points().to_vec(), geometry.face_count(), &self.config)
        };
        match scan {
            Ok(scan) => {
                session.clear_selected();
                self.scan = Some(scan);
                self.transition(LifecycleState::Resolving { progress: 0 });
                Ok(self.state)
            }
            Err(err) => {
                self.capture.clear();
                session.clear_selected();
                self.transition(LifecycleState::Idle);
                self.surface(session, &err);
                Err(err)
            }
        }
    }

    /// Runs one batch of the scan. On the last batch the result is merged
    /// into the finalized selection and the polygon is cleared.
    pub fn poll<G>(&mut self, geometry: &G, session: &mut SelectionSession) -> LifecycleState
    where
        G: GeometryAccessor + ?Sized,
    {
        if !matches!(self.state, LifecycleState::Resolving { .. }) {
            return self.state;
        }
        let Some(scan) = self.scan.as_mut() else {
            self.transition(LifecycleState::Idle);
            return self.state;
        };

        match scan.step(geometry) {
            ScanStatus::InProgress { progress } => {
                self.state = LifecycleState::Resolving { progress };
            }
            ScanStatus::Finished => {
                let selected = self.scan.take().map(CentroidScan::into_selected).unwrap_or_default();
                tracing::info!(faces = selected.len(), "Polygon resolved");
                session.set_selected_faces(selected);
                session.finalize_selected();
                self.capture.clear();
                self.transition(LifecycleState::Finalized);
            }
            ScanStatus::Cancelled => {
                self.scan = None;
                self.transition(LifecycleState::Idle);
            }
        }
        self.state
    }

    /// Polls until the scan has finished.
    pub fn resolve_blocking<G>(&mut self, geometry: &G, session: &mut SelectionSession) -> LifecycleState
    where
        G: GeometryAccessor + ?Sized,
    {
        while matches!(self.state, LifecycleState::Resolving { .. }) {
            self.poll(geometry, session);
        }
        self.state
    }

    /// Answers "Yes" to the prompt with the operator's label text.
    ///
    /// `None` (the name dialog was cancelled) and blank text discard the
    /// selection. Otherwise the finalized and transient selections are
    /// assigned to the label. Either way the selection is reset and the state
    /// becomes `Cleared`.
    pub fn confirm_prompt(
        &mut self,
        store: &mut LabelStore,
        session: &mut SelectionSession,
        label: Option<&str>,
    ) -> Result<PromptOutcome> {
        self.require(LifecycleState::LabelPrompt, "confirming the label prompt")?;

        let label = label.map(str::trim).filter(|l| !l.is_empty());
        let outcome = match label {
            None => Ok(PromptOutcome::Discarded),
            Some(label) => {
                let faces: FaceSet = session.pending_faces();
                store
                    .assign_label(label, &faces)
                    .map(PromptOutcome::Assigned)
                    .map_err(Error::from)
            }
        };

        self.clear_and_reset(session);
        match outcome {
            Ok(PromptOutcome::Assigned(assigned)) => {
                session.notify(
                    NoticeLevel::Info,
                    format!("Label \"{}\" assigned to selected faces.", assigned.label),
                );
                Ok(PromptOutcome::Assigned(assigned))
            }
            Ok(discarded) => Ok(discarded),
            Err(err) => {
                self.surface(session, &err);
                Err(err)
            }
        }
    }

    /// Answers "No" to the prompt: the selection is discarded.
    pub fn decline_prompt(&mut self, session: &mut SelectionSession) -> Result<LifecycleState> {
        self.require(LifecycleState::LabelPrompt, "declining the label prompt")?;
        self.clear_and_reset(session);
        Ok(self.state)
    }

    /// Escape: drops the polygon and any running scan and clears the
    /// transient selection. Refused while the label prompt is open.
    pub fn cancel(&mut self, session: &mut SelectionSession) -> Result<LifecycleState> {
        if self.state == LifecycleState::LabelPrompt {
            return Err(Error::InvalidState {
                operation: "cancel",
                state: self.state.name(),
            });
        }
        if let Some(scan) = self.scan.as_mut() {
            scan.cancel();
        }
        self.scan = None;
        self.capture.clear();
        session.clear_selected();
        self.transition(LifecycleState::Idle);
        Ok(self.state)
    }

    /// Resets everything tied to the previous mesh's face numbering.
    pub fn reload_mesh(&mut self, session: &mut SelectionSession) {
        if let Some(scan) = self.scan.as_mut() {
            scan.cancel();
        }
        self.scan = None;
        self.capture.clear();
        session.clear_transient_highlight();
        self.transition(LifecycleState::Idle);
    }

    /// Re-evaluates the drag polygon against the current camera and makes
    /// the overlapping faces the transient selection. Only meaningful while
    /// drawing; returns the number of faces selected.
    pub fn live_selection<G>(
        &self,
        geometry: &G,
        session: &mut SelectionSession,
        viewport: &Viewport,
    ) -> usize
    where
        G: GeometryAccessor + ?Sized,
    {
        if self.state != LifecycleState::Drawing {
            return 0;
        }
        let polygon = DragPolygon::from(self.capture.drag_polygon());
        let selected = polygon.select_overlapping(geometry, viewport);
        let count = selected.len();
        session.set_selected_faces(selected);
        count
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn clear_and_reset(&mut self, session: &mut SelectionSession) {
        session.clear_selection();
        self.capture.clear();
        self.transition(LifecycleState::Cleared);
    }

    fn require(&self, expected: LifecycleState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }

    fn surface(&self, session: &mut SelectionSession, err: &Error) {
        if err.is_user_input() {
            session.notify(NoticeLevel::Warning, err.to_string());
        } else {
            session.notify(NoticeLevel::Error, err.to_string());
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        if self.state != next {
            tracing::debug!(from = self.state.name(), to = next.name(), "Lifecycle transition");
        }
        self.state = next;
    }
}
