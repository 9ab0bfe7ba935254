// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accumulates operator clicks into a selection polygon.
//!
//! Each accepted click also records the mesh-local point under it (the
//! vertex of the drag polygon) and memoizes the raycast hit under it. The
//! screen bounds, the memo and both point lists live for one polygon; they
//! are reset together by [`PolygonCapture::clear`].

use nalgebra::{Point2, Point3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::SelectionConfig;
use crate::geometry::{GeometryAccessor, ScreenBox};
use crate::polygon::interpolate_points;

/// Result of offering a point to the capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureOutcome {
    /// The point was appended after `interpolated` smoothing points.
    Accepted {
        interpolated: usize,
        /// Mesh intersection under the point, if any.
        hit: Option<Point3<f64>>,
    },
    /// The point lies outside the mesh's screen bounds and was ignored.
    OutsideMesh,
}

/// The polygon being drawn.
#[derive(Debug, Clone, Default)]
pub struct PolygonCapture {
    config: SelectionConfig,
    points: Vec<Point2<f64>>,
    drag_polygon: Vec<Point3<f64>>,
    bounds: Option<ScreenBox>,
    raycast_cache: FxHashMap<String, Option<Point3<f64>>>,
    needs_redraw: bool,
}

impl PolygonCapture {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Offers a screen point (normalized coordinates).
    pub fn add_point<G>(&mut self, geometry: &G, point: Point2<f64>) -> CaptureOutcome
    where
        G: GeometryAccessor + ?Sized,
    {
        let bounds = *self.bounds.get_or_insert_with(|| geometry.screen_bounds());
        if !bounds.contains(&point) {
            tracing::trace!(x = point.x, y = point.y, "Point outside mesh bounds");
            return CaptureOutcome::OutsideMesh;
        }

        self.drag_polygon.push(geometry.unproject(&point));

        let key = self.config.cache_key(point.x, point.y);
        let hit = *self
            .raycast_cache
            .entry(key)
            .or_insert_with(|| geometry.raycast(&point));

        let interpolated = match self.points.last() {
            Some(previous) => {
                let between: SmallVec<[Point2<f64>; 8]> =
                    interpolate_points(previous, &point, self.config.interpolation_points)
                        .collect();
                self.points.extend(between.iter().copied());
                between.len()
            }
            None => 0,
        };
        self.points.push(point);
        self.needs_redraw = true;

        CaptureOutcome::Accepted { interpolated, hit }
    }

    /// Polygon vertices, interpolated points included.
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Mesh-local points under each accepted click.
    pub fn drag_polygon(&self) -> &[Point3<f64>] {
        &self.drag_polygon
    }

    /// Number of clicks accepted since the last clear.
    pub fn accepted_count(&self) -> usize {
        self.drag_polygon.len()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Memoized raycast result for a screen point: `None` when the point was
    /// never cast, `Some(None)` for a cached miss.
    pub fn cached_hit(&self, point: &Point2<f64>) -> Option<Option<Point3<f64>>> {
        self.raycast_cache
            .get(&self.config.cache_key(point.x, point.y))
            .copied()
    }

    pub fn cache_len(&self) -> usize {
        self.raycast_cache.len()
    }

    /// Screen bounds computed for the current polygon, if any point was offered.
    pub fn bounds(&self) -> Option<ScreenBox> {
        self.bounds
    }

    /// Returns and resets the overlay refresh flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Drops the polygon, its drag polygon, the bounds and the raycast memo.
    pub fn clear(&mut self) {
        if !self.points.is_empty() {
            self.needs_redraw = true;
        }
        self.points.clear();
        self.drag_polygon.clear();
        self.bounds = None;
        self.raycast_cache.clear();
    }

    /// Takes the polygon vertices, leaving the capture cleared.
    pub fn take_points(&mut self) -> Vec<Point2<f64>> {
        let points = std::mem::take(&mut self.points);
        self.clear();
        self.needs_redraw = true;
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Face;
    use std::cell::Cell;

    /// Flat geometry: screen and mesh-local coordinates coincide.
    struct Flat {
        bounds: ScreenBox,
        casts: Cell<usize>,
        bound_queries: Cell<usize>,
    }

    impl Flat {
        fn new() -> Self {
            Self {
                bounds: ScreenBox {
                    min_x: -0.8,
                    max_x: 0.8,
                    min_y: -0.8,
                    max_y: 0.8,
                },
                casts: Cell::new(0),
                bound_queries: Cell::new(0),
            }
        }
    }

    impl GeometryAccessor for Flat {
        fn faces(&self) -> &[Face] {
            &[]
        }
        fn vertex_position(&self, _index: u32) -> Option<Point3<f64>> {
            None
        }
        fn project_to_screen(&self, point: &Point3<f64>) -> Point2<f64> {
            point.xy()
        }
        fn unproject(&self, screen: &Point2<f64>) -> Point3<f64> {
            Point3::new(screen.x, screen.y, 0.0)
        }
        fn raycast(&self, screen: &Point2<f64>) -> Option<Point3<f64>> {
            self.casts.set(self.casts.get() + 1);
            (screen.x >= 0.0).then(|| Point3::new(screen.x, screen.y, 0.0))
        }
        fn screen_bounds(&self) -> ScreenBox {
            self.bound_queries.set(self.bound_queries.get() + 1);
            self.bounds
        }
    }

    #[test]
    fn second_point_inserts_five_interpolated() {
        let geometry = Flat::new();
        let mut capture = PolygonCapture::new(SelectionConfig::default());

        assert_eq!(
            capture.add_point(&geometry, Point2::new(0.0, 0.0)),
            CaptureOutcome::Accepted {
                interpolated: 0,
                hit: Some(Point3::new(0.0, 0.0, 0.0))
            }
        );
        let outcome = capture.add_point(&geometry, Point2::new(0.6, 0.0));
        assert!(matches!(outcome, CaptureOutcome::Accepted { interpolated: 5, .. }));
        assert_eq!(capture.len(), 7);
        assert_eq!(capture.accepted_count(), 2);
        assert_eq!(capture.points()[6], Point2::new(0.6, 0.0));
        assert!((capture.points()[3].x - 0.3).abs() < 1e-12);
    }

    #[test]
    fn points_outside_bounds_are_ignored() {
        let geometry = Flat::new();
        let mut capture = PolygonCapture::new(SelectionConfig::default());
        assert_eq!(
            capture.add_point(&geometry, Point2::new(0.9, 0.0)),
            CaptureOutcome::OutsideMesh
        );
        assert!(capture.is_empty());
        assert!(!capture.take_redraw());
    }

    #[test]
    fn bounds_are_computed_once_per_polygon() {
        let geometry = Flat::new();
        let mut capture = PolygonCapture::new(SelectionConfig::default());
        capture.add_point(&geometry, Point2::new(0.0, 0.0));
        capture.add_point(&geometry, Point2::new(0.1, 0.0));
        capture.add_point(&geometry, Point2::new(0.9, 0.0));
        assert_eq!(geometry.bound_queries.get(), 1);

        capture.clear();
        assert!(capture.bounds().is_none());
        capture.add_point(&geometry, Point2::new(0.0, 0.0));
        assert_eq!(geometry.bound_queries.get(), 2);
    }

    #[test]
    fn raycast_memo_covers_hits_and_misses() {
        let geometry = Flat::new();
        let mut capture = PolygonCapture::new(SelectionConfig::default());
        capture.add_point(&geometry, Point2::new(-0.5, 0.0));
        capture.add_point(&geometry, Point2::new(0.2, 0.0));
        capture.add_point(&geometry, Point2::new(-0.5, 0.000001));
        assert_eq!(geometry.casts.get(), 2);
        assert_eq!(capture.cache_len(), 2);
        assert_eq!(capture.cached_hit(&Point2::new(-0.5, 0.0)), Some(None));
        assert!(matches!(
            capture.cached_hit(&Point2::new(0.2, 0.0)),
            Some(Some(_))
        ));
        assert_eq!(capture.cached_hit(&Point2::new(0.7, 0.7)), None);
    }

    #[test]
    fn redraw_flag_is_consumed() {
        let geometry = Flat::new();
        let mut capture = PolygonCapture::new(SelectionConfig::default());
        capture.add_point(&geometry, Point2::new(0.0, 0.0));
        assert!(capture.take_redraw());
        assert!(!capture.take_redraw());

        let points = capture.take_points();
        assert_eq!(points.len(), 1);
        assert!(capture.is_empty());
        assert!(capture.drag_polygon().is_empty());
        assert!(capture.take_redraw());
    }
}
