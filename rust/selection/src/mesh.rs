// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle mesh made of sub-meshes, with global face numbering.
//!
//! A face's global index is the triangle count of every preceding sub-mesh
//! plus its local triangle offset. [`FaceRanges`] is the single place that
//! arithmetic lives.

use std::ops::Range;

use facemark_core::FaceIndex;
use nalgebra::{Point2, Point3, Vector3};

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::geometry::{Face, GeometryAccessor, ScreenBox};

/// One indexed triangle list, as loaded from a mesh file.
#[derive(Debug, Clone, Default)]
pub struct SubMesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Triangle indices (i0, i1, i2), local to this sub-mesh
    pub indices: Vec<u32>,
}

impl SubMesh {
    pub fn new(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Cumulative face offsets per sub-mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceRanges {
    ranges: Vec<Range<FaceIndex>>,
}

impl FaceRanges {
    /// Builds ranges from per-sub-mesh triangle counts.
    pub fn from_counts(counts: impl IntoIterator<Item = usize>) -> Self {
        let mut start: FaceIndex = 0;
        let ranges = counts
            .into_iter()
            .map(|count| {
                let end = start + count as FaceIndex;
                let range = start..end;
                start = end;
                range
            })
            .collect();
        Self { ranges }
    }

    /// Global index of local triangle `local` in sub-mesh `sub_mesh`.
    pub fn global_index(&self, sub_mesh: usize, local: u32) -> Option<FaceIndex> {
        let range = self.ranges.get(sub_mesh)?;
        let global = range.start.checked_add(local)?;
        (global < range.end).then_some(global)
    }

    /// Sub-mesh and local triangle of a global face index.
    pub fn locate(&self, face: FaceIndex) -> Option<(usize, u32)> {
        let sub_mesh = self.ranges.partition_point(|r| r.end <= face);
        let range = self.ranges.get(sub_mesh)?;
        range.contains(&face).then(|| (sub_mesh, face - range.start))
    }

    /// Face range of one sub-mesh.
    pub fn range(&self, sub_mesh: usize) -> Option<Range<FaceIndex>> {
        self.ranges.get(sub_mesh).cloned()
    }

    /// Total face count.
    pub fn total(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end as usize)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// A loaded mesh plus the camera it is viewed through.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    positions: Vec<f32>,
    faces: Vec<Face>,
    ranges: FaceRanges,
    bounds: (Point3<f64>, Point3<f64>),
    camera: Camera,
}

impl MeshGeometry {
    /// Merges sub-meshes into one vertex buffer, rebasing their indices.
    pub fn new(sub_meshes: &[SubMesh], camera: Camera) -> Result<Self> {
        let total_positions: usize = sub_meshes.iter().map(|m| m.positions.len()).sum();
        let total_faces: usize = sub_meshes.iter().map(|m| m.triangle_count()).sum();
        let mut positions = Vec::with_capacity(total_positions);
        let mut faces = Vec::with_capacity(total_faces);

        for (i, sub) in sub_meshes.iter().enumerate() {
            if sub.positions.len() % 3 != 0 {
                return Err(Error::InvalidMesh(format!(
                    "sub-mesh {i} has {} position components",
                    sub.positions.len()
                )));
            }
            if sub.indices.len() % 3 != 0 {
                return Err(Error::InvalidMesh(format!(
                    "sub-mesh {i} has {} indices",
                    sub.indices.len()
                )));
            }
            let vertex_count = sub.vertex_count() as u32;
            if let Some(bad) = sub.indices.iter().find(|&&idx| idx >= vertex_count) {
                return Err(Error::InvalidMesh(format!(
                    "sub-mesh {i} references vertex {bad} of {vertex_count}"
                )));
            }

            let vertex_offset = (positions.len() / 3) as u32;
            positions.extend_from_slice(&sub.positions);
            faces.extend(sub.indices.chunks_exact(3).map(|tri| {
                Face::new(
                    tri[0] + vertex_offset,
                    tri[1] + vertex_offset,
                    tri[2] + vertex_offset,
                )
            }));
        }

        let ranges = FaceRanges::from_counts(sub_meshes.iter().map(SubMesh::triangle_count));
        let bounds = compute_bounds(&positions);
        tracing::debug!(
            sub_meshes = sub_meshes.len(),
            faces = faces.len(),
            vertices = positions.len() / 3,
            "Built mesh geometry"
        );

        Ok(Self {
            positions,
            faces,
            ranges,
            bounds,
            camera,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replaces the camera after the operator moved the view.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn face_ranges(&self) -> &FaceRanges {
        &self.ranges
    }

    /// Axis-aligned bounds (min, max) in mesh-local coordinates.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        self.bounds
    }

    /// The eight corners of the bounding box.
    pub fn bounding_corners(&self) -> [Point3<f64>; 8] {
        let (min, max) = self.bounds;
        [
            Point3::new(min.x, min.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(min.x, max.y, max.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(max.x, max.y, max.z),
        ]
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

impl GeometryAccessor for MeshGeometry {
    fn faces(&self) -> &[Face] {
        &self.faces
    }

    fn vertex_position(&self, index: u32) -> Option<Point3<f64>> {
        let i = index as usize * 3;
        let p = self.positions.get(i..i + 3)?;
        Some(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
    }

    fn project_to_screen(&self, point: &Point3<f64>) -> Point2<f64> {
        self.camera.project(point).xy()
    }

    fn unproject(&self, screen: &Point2<f64>) -> Point3<f64> {
        self.camera.unproject(&Point3::new(screen.x, screen.y, 0.0))
    }

    fn raycast(&self, screen: &Point2<f64>) -> Option<Point3<f64>> {
        let (origin, dir) = self.camera.ray(screen);
        let mut nearest: Option<f64> = None;
        for face in &self.faces {
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertex_position(face.a),
                self.vertex_position(face.b),
                self.vertex_position(face.c),
            ) else {
                continue;
            };
            if let Some(t) = ray_triangle_distance(&origin, &dir, &v0, &v1, &v2) {
                if nearest.map_or(true, |best| t < best) {
                    nearest = Some(t);
                }
            }
        }
        nearest.map(|t| origin + dir * t)
    }

    fn screen_bounds(&self) -> ScreenBox {
        if self.faces.is_empty() {
            return ScreenBox::EMPTY;
        }
        let projected: Vec<Point2<f64>> = self
            .bounding_corners()
            .iter()
            .map(|corner| self.project_to_screen(corner))
            .collect();
        ScreenBox::from_points(projected.iter())
    }
}

fn compute_bounds(positions: &[f32]) -> (Point3<f64>, Point3<f64>) {
    if positions.len() < 3 {
        return (Point3::origin(), Point3::origin());
    }
    let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
    let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
    positions.chunks_exact(3).for_each(|chunk| {
        let (x, y, z) = (chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
        min.x = min.x.min(x);
        min.y = min.y.min(y);
        min.z = min.z.min(z);
        max.x = max.x.max(x);
        max.y = max.y.max(y);
        max.z = max.z.max(z);
    });
    (min, max)
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter `t` of the hit (`origin + t * dir`), or `None`
/// when the ray misses or runs parallel to the triangle.
pub fn ray_triangle_distance(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < 1e-12 {
        return None; // ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > 1e-12).then_some(t)
}
