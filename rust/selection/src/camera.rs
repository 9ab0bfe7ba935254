// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera and viewport transforms.
//!
//! The camera maps mesh-local points through the pivot (local → world) and
//! the view-projection (world → clip) matrices. Both directions are cached so
//! projecting and unprojecting are a single matrix product each.

use nalgebra::{Matrix4, Orthographic3, Perspective3, Point2, Point3, Vector3};

use crate::error::{Error, Result};

/// Projection of mesh-local points to normalized device coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view_projection: Matrix4<f64>,
    pivot: Matrix4<f64>,
    clip_from_local: Matrix4<f64>,
    local_from_clip: Matrix4<f64>,
}

impl Camera {
    /// Builds a camera from a view-projection matrix and a pivot (model)
    /// matrix. Fails when the combined matrix cannot be inverted.
    pub fn from_matrices(view_projection: Matrix4<f64>, pivot: Matrix4<f64>) -> Result<Self> {
        let clip_from_local = view_projection * pivot;
        let local_from_clip = clip_from_local
            .try_inverse()
            .ok_or(Error::DegenerateCamera)?;
        Ok(Self {
            view_projection,
            pivot,
            clip_from_local,
            local_from_clip,
        })
    }

    /// Right-handed perspective camera at `eye` looking at `target`, +Y up.
    /// `fovy` is in radians.
    pub fn perspective(
        eye: Point3<f64>,
        target: Point3<f64>,
        fovy: f64,
        aspect: f64,
        znear: f64,
        zfar: f64,
    ) -> Result<Self> {
        let view = Matrix4::look_at_rh(&eye, &target, &Vector3::y());
        let projection = Perspective3::new(aspect, fovy, znear, zfar).to_homogeneous();
        Self::from_matrices(projection * view, Matrix4::identity())
    }

    /// Right-handed orthographic camera; the view volume spans
    /// `±half_width` by `±half_height` around the view axis.
    pub fn orthographic(
        eye: Point3<f64>,
        target: Point3<f64>,
        half_width: f64,
        half_height: f64,
        znear: f64,
        zfar: f64,
    ) -> Result<Self> {
        let view = Matrix4::look_at_rh(&eye, &target, &Vector3::y());
        let projection =
            Orthographic3::new(-half_width, half_width, -half_height, half_height, znear, zfar)
                .to_homogeneous();
        Self::from_matrices(projection * view, Matrix4::identity())
    }

    /// Same camera with a different pivot transform.
    pub fn with_pivot(&self, pivot: Matrix4<f64>) -> Result<Self> {
        Self::from_matrices(self.view_projection, pivot)
    }

    pub fn view_projection(&self) -> &Matrix4<f64> {
        &self.view_projection
    }

    pub fn pivot(&self) -> &Matrix4<f64> {
        &self.pivot
    }

    /// Mesh-local point to NDC (depth included).
    #[inline]
    pub fn project(&self, local: &Point3<f64>) -> Point3<f64> {
        self.clip_from_local.transform_point(local)
    }

    /// NDC point (depth included) back to mesh-local coordinates.
    #[inline]
    pub fn unproject(&self, ndc: &Point3<f64>) -> Point3<f64> {
        self.local_from_clip.transform_point(ndc)
    }

    /// Mesh-local ray through a screen point: origin on the near plane,
    /// direction towards the far plane.
    pub fn ray(&self, screen: &Point2<f64>) -> (Point3<f64>, Vector3<f64>) {
        let near = self.unproject(&Point3::new(screen.x, screen.y, -1.0));
        let far = self.unproject(&Point3::new(screen.x, screen.y, 1.0));
        (near, far - near)
    }
}

/// Canvas size used to convert NDC to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// NDC to pixel coordinates, origin top-left, `y` pointing down.
    #[inline]
    pub fn to_pixels(&self, ndc: &Point2<f64>) -> Point2<f64> {
        Point2::new(
            (ndc.x + 1.0) / 2.0 * self.width,
            (1.0 - ndc.y) / 2.0 * self.height,
        )
    }
}
