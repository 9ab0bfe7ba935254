// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tuning knobs for capture and scanning.

/// Selection engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Points inserted between two consecutive accepted points.
    pub interpolation_points: usize,
    /// The centroid scan is split into roughly this many batches.
    pub scan_batches: usize,
    /// Decimal places of the raycast cache key.
    pub cache_precision: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            interpolation_points: 5,
            scan_batches: 20,
            cache_precision: 5,
        }
    }
}

impl SelectionConfig {
    /// Batch size for a scan over `total_faces` faces, never below 1.
    pub fn batch_size(&self, total_faces: usize) -> usize {
        (total_faces / self.scan_batches.max(1)).max(1)
    }

    /// Raycast cache key for a screen point.
    pub fn cache_key(&self, x: f64, y: f64) -> String {
        let p = self.cache_precision;
        format!("{x:.p$},{y:.p$}")
    }
}
