//! Math utilities and types
//!
//! Provides the fundamental math types shared by the camera, billboard and
//! scroll code. Conventions are right-handed and Y-up; cameras look down
//! their local -Z axis.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }

    /// Map a world-space point into this transform's local space.
    ///
    /// Zero scale components are treated as one so a collapsed transform
    /// still yields finite coordinates.
    pub fn inverse_transform_point(&self, point: &Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (point - self.position);
        Vec3::new(
            safe_div(local.x, self.scale.x),
            safe_div(local.y, self.scale.y),
            safe_div(local.z, self.scale.z),
        )
    }
}

fn safe_div(value: f32, divisor: f32) -> f32 {
    if divisor.abs() <= f32::EPSILON {
        value
    } else {
        value / divisor
    }
}

/// Math utility functions
pub mod utils {
    /// Wrap a scalar into `[0, 1)`.
    ///
    /// Uses floor semantics so negative inputs land on the positive side:
    /// `-0.3` wraps to `0.7`. Rounding can make `v - floor(v)` evaluate to
    /// exactly `1.0` for tiny negative inputs; that case maps to `0.0`.
    pub fn wrap_unit(value: f32) -> f32 {
        if !value.is_finite() {
            return 0.0;
        }
        let wrapped = value - value.floor();
        if wrapped >= 1.0 {
            0.0
        } else {
            wrapped
        }
    }

    /// Wrap both components of a texture offset into `[0, 1)`.
    pub fn wrap_unit_vec2(value: super::Vec2) -> super::Vec2 {
        super::Vec2::new(wrap_unit(value.x), wrap_unit(value.y))
    }

    /// Shortest distance between two values on the unit circle `[0, 1)`.
    pub fn wrapped_distance(a: f32, b: f32) -> f32 {
        let d = wrap_unit(a - b);
        d.min(1.0 - d)
    }
}

#[cfg(test)]
mod tests {
    use super::utils::{wrap_unit, wrap_unit_vec2, wrapped_distance};
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_wrap_unit_positive_and_negative() {
        assert_abs_diff_eq!(wrap_unit(2.25), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(wrap_unit(-0.3), 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(wrap_unit(-2.75), 0.25, epsilon = 1e-6);
        assert_eq!(wrap_unit(0.0), 0.0);
        assert_eq!(wrap_unit(1.0), 0.0);
    }

    #[test]
    fn test_wrap_unit_range_and_idempotence() {
        let samples = [
            -1000.5, -3.0, -1.0, -0.999_999, -1e-9, 0.0, 1e-9, 0.5, 0.999_999, 7.125, 12345.678,
        ];
        for &v in &samples {
            let once = wrap_unit(v);
            assert!((0.0..1.0).contains(&once), "{v} wrapped to {once}");
            assert_eq!(wrap_unit(once), once, "wrapping {once} again changed it");
        }
    }

    #[test]
    fn test_wrap_unit_non_finite() {
        assert_eq!(wrap_unit(f32::NAN), 0.0);
        assert_eq!(wrap_unit(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_wrap_vec2_and_distance() {
        let wrapped = wrap_unit_vec2(Vec2::new(1.5, -0.25));
        assert_relative_eq!(wrapped, Vec2::new(0.5, 0.75), epsilon = 1e-6);
        assert_abs_diff_eq!(wrapped_distance(0.999_9, 0.0), 0.000_1, epsilon = 1e-5);
        assert_abs_diff_eq!(wrapped_distance(0.25, 0.75), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_transform_point_round_trip() {
        let transform = Transform {
            position: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.5),
            scale: Vec3::new(2.0, 2.0, 1.0),
        };
        let world = transform.transform_point(Point3::new(0.5, 1.0, -1.0));
        let local = transform.inverse_transform_point(&world.coords);
        assert_relative_eq!(local, Vec3::new(0.5, 1.0, -1.0), epsilon = 1e-5);
    }
}
