// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live drag selection: faces whose projected triangle overlaps the drag
//! polygon in pixel space.
//!
//! The drag polygon is kept in mesh-local coordinates so it follows the mesh
//! when the camera moves; it is re-projected on every evaluation. Unlike the
//! centroid scan this runs synchronously over every face, and a face that
//! merely touches the polygon edge is selected here even when its centroid
//! lies outside.

use facemark_core::{FaceIndex, FaceSet};
use nalgebra::{Point2, Point3};
use smallvec::SmallVec;

use crate::camera::Viewport;
use crate::geometry::GeometryAccessor;
use crate::polygon::polygons_intersect;

/// A polygon anchored to the mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragPolygon {
    points: Vec<Point3<f64>>,
}

impl DragPolygon {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The polygon in pixel coordinates under the current camera.
    pub fn to_pixels<G>(&self, geometry: &G, viewport: &Viewport) -> Vec<Point2<f64>>
    where
        G: GeometryAccessor + ?Sized,
    {
        self.points
            .iter()
            .map(|p| viewport.to_pixels(&geometry.project_to_screen(p)))
            .collect()
    }

    /// Every face whose projected triangle overlaps the polygon.
    /// A polygon with fewer than three points selects nothing.
    pub fn select_overlapping<G>(&self, geometry: &G, viewport: &Viewport) -> FaceSet
    where
        G: GeometryAccessor + ?Sized,
    {
        let mut selected = FaceSet::default();
        if self.points.len() < 3 {
            return selected;
        }

        let polygon = self.to_pixels(geometry, viewport);
        for (index, face) in geometry.faces().iter().enumerate() {
            let Some(projected) = geometry.project_face(face) else {
                continue;
            };
            let triangle: SmallVec<[Point2<f64>; 3]> =
                projected.iter().map(|p| viewport.to_pixels(p)).collect();
            if polygons_intersect(&triangle, &polygon) {
                selected.insert(index as FaceIndex);
            }
        }

        tracing::trace!(
            points = self.points.len(),
            selected = selected.len(),
            "Evaluated drag polygon"
        );
        selected
    }
}

impl From<&[Point3<f64>]> for DragPolygon {
    fn from(points: &[Point3<f64>]) -> Self {
        Self::new(points.to_vec())
    }
}
