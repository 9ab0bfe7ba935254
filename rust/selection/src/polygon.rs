// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon predicates used by both selection modes.

use nalgebra::{Point2, Vector2};

/// Even-odd ray-casting point-in-polygon test.
///
/// The polygon is closed implicitly (last vertex back to first). Fewer than
/// three vertices never contain anything.
pub fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = polygon.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Separating-axis overlap test between two polygons.
///
/// Every edge normal of both shapes is tried as a separating axis; touching
/// intervals count as overlap. The test is exact for convex shapes; for a
/// concave polygon it tests against its edge normals only, so shapes inside
/// a concavity can report overlap.
pub fn polygons_intersect(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    for polygon in [a, b] {
        let n = polygon.len();
        for i in 0..n {
            let p1 = polygon[i];
            let p2 = polygon[(i + 1) % n];
            let axis = Vector2::new(p2.y - p1.y, p1.x - p2.x);

            let (min_a, max_a) = project_onto(a, &axis);
            let (min_b, max_b) = project_onto(b, &axis);
            if max_a < min_b || max_b < min_a {
                return false;
            }
        }
    }
    true
}

fn project_onto(polygon: &[Point2<f64>], axis: &Vector2<f64>) -> (f64, f64) {
    polygon
        .iter()
        .map(|p| axis.x * p.x + axis.y * p.y)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

/// `count` points evenly spaced strictly between `from` and `to`
/// (`t = i / (count + 1)` for `i` in `1..=count`).
pub fn interpolate_points(
    from: &Point2<f64>,
    to: &Point2<f64>,
    count: usize,
) -> impl Iterator<Item = Point2<f64>> {
    let (from, to) = (*from, *to);
    (1..=count).map(move |i| {
        let t = i as f64 / (count + 1) as f64;
        Point2::new(from.x + t * (to.x - from.x), from.y + t * (to.y - from.y))
    })
}

/// Centroid of a projected triangle.
#[inline]
pub fn triangle_centroid(triangle: &[Point2<f64>; 3]) -> Point2<f64> {
    let [a, b, c] = triangle;
    Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
}
