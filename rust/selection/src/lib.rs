// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Facemark Selection
//!
//! Turns operator-drawn polygons into sets of mesh faces.
//!
//! Two selection modes exist side by side:
//!
//! - **Centroid scan** ([`CentroidScan`]): for a closed polygon, selects every
//!   face whose projected centroid is inside it (even-odd rule). Runs in
//!   batches so the host stays responsive and can show progress.
//! - **Drag overlap** ([`DragPolygon`]): for the polygon being drawn, selects
//!   every face whose projected triangle overlaps it (separating axis test in
//!   pixel space). Synchronous.
//!
//! The two can disagree near the polygon boundary: a face that straddles an
//! edge with its centroid outside is selected by the drag overlap but not by
//! the scan.
//!
//! The [`Labeler`] sequences capture, resolution and the label prompt, and
//! hands the result to a [`facemark_core::LabelStore`].

pub mod camera;
pub mod capture;
pub mod centroid_scan;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod mesh;
pub mod overlap;
pub mod polygon;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use camera::{Camera, Viewport};
pub use capture::{CaptureOutcome, PolygonCapture};
pub use centroid_scan::{select_by_centroid, CentroidScan, ScanStatus};
pub use config::SelectionConfig;
pub use error::{Error, Result};
pub use geometry::{Face, GeometryAccessor, ScreenBox};
pub use lifecycle::{Labeler, LifecycleState, PromptOutcome};
pub use mesh::{ray_triangle_distance, FaceRanges, MeshGeometry, SubMesh};
pub use overlap::DragPolygon;
pub use polygon::{interpolate_points, point_in_polygon, polygons_intersect, triangle_centroid};
