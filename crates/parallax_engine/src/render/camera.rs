//! # Parallax Camera
//!
//! Camera abstraction consumed by the billboard generator and the scroll
//! distribution pass.
//!
//! ## Design Principles
//! - **Library-agnostic**: the host engine copies its camera state in; nothing
//!   here talks to a graphics API
//! - **Immutable math**: matrix getters never modify camera state
//! - **Orthographic first**: billboard sizing assumes orthographic projection.
//!   Perspective cameras are accepted, but geometry is only exact for
//!   orthographic math
//!
//! # Coordinate System
//! Standard right-handed Y-up view space:
//! - X+ = Right
//! - Y+ = Up
//! - Z- = Forward (the camera looks down its local -Z axis)
//!
//! Clip space follows the OpenGL convention (NDC z in `[-1, 1]`).

use serde::{Deserialize, Serialize};

use crate::error::ParallaxError;
use crate::foundation::math::{Mat4, Point3, Quat, Vec2, Vec3, Vec4};

/// Projection model of a camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Orthographic projection
    Orthographic {
        /// Half of the vertical view size in world units
        size: f32,
    },
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
    },
}

/// Camera used as the orthographic projection source for parallax layers
///
/// Holds the world transform (position + rotation), the projection model, the
/// clipping planes and the pixel size of the viewport it renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Camera orientation; identity looks down world -Z with +Y up
    pub rotation: Quat,

    /// Projection model
    pub projection: Projection,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    /// Viewport width in pixels
    pub pixel_width: u32,

    /// Viewport height in pixels
    pub pixel_height: u32,
}

impl Camera {
    /// Create an orthographic camera looking down world -Z
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `size` - Orthographic half-height in world units
    /// * `pixel_width` - Viewport width in pixels
    /// * `pixel_height` - Viewport height in pixels
    ///
    /// # Example
    /// ```rust
    /// use parallax_engine::foundation::math::Vec3;
    /// use parallax_engine::render::Camera;
    ///
    /// let camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 1280, 720);
    /// assert!(camera.is_orthographic());
    /// assert_eq!(camera.ortho_size(), 5.0);
    /// ```
    pub fn orthographic(position: Vec3, size: f32, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            projection: Projection::Orthographic { size },
            near: 0.3,
            far: 1000.0,
            pixel_width,
            pixel_height,
        }
    }

    /// Create a perspective camera looking down world -Z
    ///
    /// Accepted for completeness; billboard geometry generated against a
    /// perspective camera is only approximately pixel-accurate.
    pub fn perspective(position: Vec3, fov_radians: f32, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            projection: Projection::Perspective { fov: fov_radians },
            near: 0.3,
            far: 1000.0,
            pixel_width,
            pixel_height,
        }
    }

    /// Orient the camera towards a world-space point
    ///
    /// # Arguments
    /// * `target` - Point in world space to look at
    /// * `up` - Approximate up vector; orthonormalized against the view direction
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.position;
        if forward.norm_squared() <= f32::EPSILON {
            log::warn!("Camera look_at target coincides with camera position, ignoring");
            return;
        }
        // face_towards maps local +Z onto the given direction; the camera looks down -Z.
        self.rotation = Quat::face_towards(&(-forward), &up);
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Builder-style variant of [`Camera::look_at`]
    #[must_use]
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        self.look_at(target, up);
        self
    }

    /// Update the viewport pixel size (window resize)
    pub fn set_pixel_size(&mut self, pixel_width: u32, pixel_height: u32) {
        if (self.pixel_width, self.pixel_height) != (pixel_width, pixel_height) {
            log::info!(
                "Camera viewport resized: {}x{} -> {}x{}",
                self.pixel_width,
                self.pixel_height,
                pixel_width,
                pixel_height
            );
        }
        self.pixel_width = pixel_width;
        self.pixel_height = pixel_height;
    }

    /// Whether the projection is orthographic
    pub const fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    /// Orthographic half-height in world units.
    ///
    /// For perspective cameras this is the half-height of the frustum one
    /// world unit in front of the camera.
    pub fn ortho_size(&self) -> f32 {
        match self.projection {
            Projection::Orthographic { size } => size,
            Projection::Perspective { fov } => (fov * 0.5).tan(),
        }
    }

    /// Pixel aspect ratio (width / height); 1.0 for a degenerate viewport
    pub fn aspect(&self) -> f32 {
        if self.pixel_height == 0 {
            1.0
        } else {
            self.pixel_width as f32 / self.pixel_height as f32
        }
    }

    /// Camera right axis in world space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// Camera up axis in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Camera view direction in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    /// Signed distance from the camera to `point` along the view axis
    pub fn depth_of(&self, point: &Vec3) -> f32 {
        (point - self.position).dot(&self.forward())
    }

    /// Euclidean distance from the camera to `point`
    pub fn distance_to(&self, point: &Vec3) -> f32 {
        (point - self.position).norm()
    }

    /// Camera-to-world transformation matrix
    pub fn camera_to_world(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.rotation.to_homogeneous()
    }

    /// World-to-camera (view) matrix
    pub fn world_to_camera(&self) -> Mat4 {
        self.rotation.inverse().to_homogeneous() * Mat4::new_translation(&-self.position)
    }

    /// Projection matrix for the given aspect ratio
    ///
    /// Orthographic projections map `[-size * aspect, size * aspect]` and
    /// `[-size, size]` onto NDC `[-1, 1]`.
    ///
    /// Degenerate parameters yield the identity matrix; use
    /// [`Camera::inverse_projection_with_aspect`] to detect them.
    pub fn projection_matrix_with_aspect(&self, aspect: f32) -> Mat4 {
        self.checked_projection(aspect).unwrap_or_else(Mat4::identity)
    }

    fn checked_projection(&self, aspect: f32) -> Option<Mat4> {
        // nalgebra asserts on these, so reject them before building the matrix.
        let usable = |v: f32| v.is_finite() && v.abs() > f32::EPSILON;
        if !usable(aspect) || !usable(self.far - self.near) {
            return None;
        }
        match self.projection {
            Projection::Orthographic { size } => {
                if !usable(size) {
                    return None;
                }
                let half_width = size * aspect;
                Some(Mat4::new_orthographic(-half_width, half_width, -size, size, self.near, self.far))
            }
            Projection::Perspective { fov } => {
                if !usable(fov) || self.near.abs() <= f32::EPSILON {
                    return None;
                }
                Some(Mat4::new_perspective(aspect, fov, self.near, self.far))
            }
        }
    }

    /// Projection matrix using the camera's own pixel aspect ratio
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix_with_aspect(self.aspect())
    }

    /// Inverse projection matrix for the given aspect ratio
    ///
    /// # Errors
    /// Returns [`ParallaxError::SingularProjection`] when the projection is
    /// degenerate (zero size, zero aspect or coincident clip planes).
    pub fn inverse_projection_with_aspect(&self, aspect: f32) -> Result<Mat4, ParallaxError> {
        self.checked_projection(aspect)
            .and_then(Mat4::try_inverse)
            .ok_or(ParallaxError::SingularProjection)
    }

    /// Inverse projection matrix using the camera's own aspect ratio
    ///
    /// # Errors
    /// See [`Camera::inverse_projection_with_aspect`].
    pub fn inverse_projection(&self) -> Result<Mat4, ParallaxError> {
        self.inverse_projection_with_aspect(self.aspect())
    }

    /// NDC depth of a point `depth` units in front of the camera
    pub fn ndc_depth(&self, depth: f32, aspect: f32) -> f32 {
        let clip = self.projection_matrix_with_aspect(aspect) * Vec4::new(0.0, 0.0, -depth, 1.0);
        if clip.w.abs() <= f32::EPSILON {
            clip.z
        } else {
            clip.z / clip.w
        }
    }

    /// World-space size of one screen pixel at `depth` units in front of the camera
    ///
    /// Derived from the inverse projection: the camera-space distance between
    /// two points one pixel apart in NDC at that depth.
    ///
    /// # Errors
    /// Returns [`ParallaxError::SingularProjection`] for degenerate projections.
    pub fn pixel_world_size(&self, depth: f32) -> Result<f32, ParallaxError> {
        if self.pixel_height == 0 {
            return Err(ParallaxError::SingularProjection);
        }
        let aspect = self.aspect();
        let inverse = self.inverse_projection_with_aspect(aspect)?;
        let z = self.ndc_depth(depth, aspect);
        let step = 2.0 / self.pixel_height as f32;
        let p0 = unproject(&inverse, Vec3::new(0.0, 0.0, z));
        let p1 = unproject(&inverse, Vec3::new(0.0, step, z));
        Ok((p1.y - p0.y).abs())
    }

    /// Project a world-space point to viewport pixel coordinates
    ///
    /// Origin is the bottom-left corner of the viewport, Y up.
    pub fn world_to_viewport(&self, point: &Vec3) -> Vec2 {
        let view = self.world_to_camera().transform_point(&Point3::from(*point));
        let clip = self.projection_matrix() * view.to_homogeneous();
        let ndc = if clip.w.abs() <= f32::EPSILON {
            clip.xy()
        } else {
            clip.xy() / clip.w
        };
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.pixel_width as f32,
            (ndc.y + 1.0) * 0.5 * self.pixel_height as f32,
        )
    }
}

/// Effective viewport size in pixels used for layer sizing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Viewport {
    /// Create a viewport
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Viewport matching a camera's pixel size
    pub fn from_camera(camera: &Camera) -> Self {
        Self::new(camera.pixel_width as f32, camera.pixel_height as f32)
    }

    /// Width / height; 1.0 when the height is zero
    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Whether both dimensions are positive
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Camera {
    /// Orthographic camera ten units above the origin on +Z, 1280x720, half-height 5
    fn default() -> Self {
        Self::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 1280, 720)
    }
}

/// Map an NDC point through an inverse projection into camera space
pub fn unproject(inverse_projection: &Mat4, ndc: Vec3) -> Vec3 {
    let h = inverse_projection * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
    if h.w.abs() <= f32::EPSILON {
        h.xyz()
    } else {
        h.xyz() / h.w
    }
}
