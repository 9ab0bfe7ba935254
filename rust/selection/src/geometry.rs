// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only view over a triangle mesh plus its camera projection.
//!
//! Screen coordinates are normalized device coordinates: `x` and `y` in
//! `[-1, 1]`, `y` pointing up. 3D points are in mesh-local (pivot)
//! coordinates unless stated otherwise.

use nalgebra::{Point2, Point3};

/// A triangle as three global vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Face {
    #[inline]
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn vertices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }
}

/// Axis-aligned box in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ScreenBox {
    /// A box containing nothing; growing it by a point yields that point.
    pub const EMPTY: ScreenBox = ScreenBox {
        min_x: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        min_y: f64::INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Smallest box containing every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        bounds
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

/// What the selection engine needs from the loaded mesh and camera.
///
/// Face `i` of [`faces`](GeometryAccessor::faces) has global face index `i`.
pub trait GeometryAccessor {
    /// Every face of the mesh, in global face order.
    fn faces(&self) -> &[Face];

    /// Number of faces.
    fn face_count(&self) -> usize {
        self.faces().len()
    }

    /// Position of a vertex, `None` for an out-of-range index.
    fn vertex_position(&self, index: u32) -> Option<Point3<f64>>;

    /// Projects a mesh-local point to normalized screen coordinates.
    fn project_to_screen(&self, point: &Point3<f64>) -> Point2<f64>;

    /// Mesh-local point under a screen point, at NDC depth 0.
    fn unproject(&self, screen: &Point2<f64>) -> Point3<f64>;

    /// Nearest mesh intersection under a screen point, in mesh-local
    /// coordinates.
    fn raycast(&self, screen: &Point2<f64>) -> Option<Point3<f64>>;

    /// Screen box of the mesh's projected 3D bounding box.
    fn screen_bounds(&self) -> ScreenBox;

    /// Projects the three vertices of a face. `None` when an index is invalid.
    fn project_face(&self, face: &Face) -> Option<[Point2<f64>; 3]> {
        let a = self.vertex_position(face.a)?;
        let b = self.vertex_position(face.b)?;
        let c = self.vertex_position(face.c)?;
        Some([
            self.project_to_screen(&a),
            self.project_to_screen(&b),
            self.project_to_screen(&c),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_box_grows_from_points() {
        let points = [Point2::new(-0.5, 0.2), Point2::new(0.3, -0.7)];
        let bounds = ScreenBox::from_points(points.iter());
        assert_eq!(bounds.min_x, -0.5);
        assert_eq!(bounds.max_y, 0.2);
        assert!(bounds.contains(&Point2::new(0.3, 0.2)));
        assert!(!bounds.contains(&Point2::new(0.31, 0.0)));
        assert!(ScreenBox::EMPTY.is_empty());
        assert!(!ScreenBox::EMPTY.contains(&Point2::origin()));
    }
}
