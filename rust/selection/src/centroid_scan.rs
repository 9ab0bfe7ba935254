// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed-polygon selection: a face is selected when the centroid of its
//! projected triangle lies inside the polygon.
//!
//! The scan is a resumable task. Each [`CentroidScan::step`] processes one
//! batch (about a twentieth of the mesh) and returns, so the caller can
//! handle input, show progress or cancel between batches.

use facemark_core::{FaceIndex, FaceSet};
use nalgebra::Point2;

use crate::config::SelectionConfig;
use crate::error::{Error, Result};
use crate::geometry::GeometryAccessor;
use crate::polygon::{point_in_polygon, triangle_centroid};

/// Where a scan stands after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// More batches remain. `progress` is 0–100.
    InProgress { progress: u8 },
    /// Every face has been tested.
    Finished,
    /// The scan was cancelled; its partial result is meaningless.
    Cancelled,
}

/// In-flight centroid scan over every face of a mesh.
#[derive(Debug, Clone)]
pub struct CentroidScan {
    polygon: Vec<Point2<f64>>,
    total_faces: usize,
    processed_faces: usize,
    batch_size: usize,
    selected: FaceSet,
    cancelled: bool,
}

impl CentroidScan {
    /// Prepares a scan of `total_faces` faces against a closed polygon.
    pub fn new(polygon: Vec<Point2<f64>>, total_faces: usize, config: &SelectionConfig) -> Result<Self> {
        if polygon.len() < 3 {
            return Err(Error::TooFewPoints(polygon.len()));
        }
        let batch_size = config.batch_size(total_faces);
        tracing::debug!(
            points = polygon.len(),
            total_faces,
            batch_size,
            "Starting centroid scan"
        );
        Ok(Self {
            polygon,
            total_faces,
            processed_faces: 0,
            batch_size,
            selected: FaceSet::default(),
            cancelled: false,
        })
    }

    /// Processes the next batch.
    pub fn step<G>(&mut self, geometry: &G) -> ScanStatus
    where
        G: GeometryAccessor + ?Sized,
    {
        if self.cancelled {
            return ScanStatus::Cancelled;
        }
        if self.is_finished() {
            return ScanStatus::Finished;
        }

        let start = self.processed_faces;
        let end = (start + self.batch_size).min(self.total_faces);
        let faces = geometry.faces();
        for index in start..end {
            let Some(face) = faces.get(index) else {
                continue;
            };
            let Some(projected) = geometry.project_face(face) else {
                continue;
            };
            if point_in_polygon(&triangle_centroid(&projected), &self.polygon) {
                self.selected.insert(index as FaceIndex);
            }
        }
        self.processed_faces = end;

        let progress = self.progress();
        tracing::debug!(processed = end, total = self.total_faces, progress, "Scanned batch");
        if self.is_finished() {
            ScanStatus::Finished
        } else {
            ScanStatus::InProgress { progress }
        }
    }

    /// Steps until the scan finishes or is cancelled.
    pub fn run_to_completion<G>(&mut self, geometry: &G) -> ScanStatus
    where
        G: GeometryAccessor + ?Sized,
    {
        loop {
            match self.step(geometry) {
                ScanStatus::InProgress { .. } => continue,
                done => return done,
            }
        }
    }

    /// Percentage of faces processed, rounded down.
    pub fn progress(&self) -> u8 {
        if self.total_faces == 0 {
            return 100;
        }
        (self.processed_faces * 100 / self.total_faces) as u8
    }

    /// Drops every remaining batch.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            tracing::debug!(processed = self.processed_faces, "Cancelled centroid scan");
        }
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.processed_faces >= self.total_faces
    }

    pub fn processed_faces(&self) -> usize {
        self.processed_faces
    }

    pub fn total_faces(&self) -> usize {
        self.total_faces
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Faces selected so far.
    pub fn selected(&self) -> &FaceSet {
        &self.selected
    }

    pub fn into_selected(self) -> FaceSet {
        self.selected
    }
}

/// Runs a whole centroid scan synchronously.
pub fn select_by_centroid<G>(
    geometry: &G,
    polygon: Vec<Point2<f64>>,
    config: &SelectionConfig,
) -> Result<FaceSet>
where
    G: GeometryAccessor + ?Sized,
{
    let mut scan = CentroidScan::new(polygon, geometry.face_count(), config)?;
    scan.run_to_completion(geometry);
    Ok(scan.into_selected())
}
