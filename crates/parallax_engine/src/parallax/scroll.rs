//! Scroll distribution math
//!
//! Pure functions shared by the per-frame tick and the raw scroll query, so
//! both always agree on what a layer receives.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::foundation::math::utils::wrap_unit_vec2;
use crate::foundation::math::{Vec2, Vec3};

/// Added to a weight before inverting it, so weight zero stays finite
pub const WEIGHT_EPSILON: f32 = 1e-5;

/// Axes of the scroll input the manager honors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScrollAxes {
    /// Horizontal only
    #[default]
    X,
    /// Vertical only
    Y,
    /// Both axes
    XY,
}

impl ScrollAxes {
    /// Zero the components this constraint ignores
    pub fn constrain(self, scroll: Vec2) -> Vec2 {
        match self {
            Self::X => Vec2::new(scroll.x, 0.0),
            Self::Y => Vec2::new(0.0, scroll.y),
            Self::XY => scroll,
        }
    }
}

/// Scroll speed derived from a weight: lighter layers move faster
pub fn speed_from_weight(weight: f32) -> f32 {
    1.0 / (weight + WEIGHT_EPSILON)
}

/// Combined multiplier a layer applies to the constrained scroll input
pub fn layer_factor(base_speed: f32, scroll_speed: f32, scroll_mod: f32) -> f32 {
    base_speed * scroll_speed * scroll_mod
}

/// Add a scroll step to a texture offset and wrap it back into `[0, 1)`
pub fn advance_offset(offset: Vec2, step: Vec2) -> Vec2 {
    wrap_unit_vec2(offset + step)
}

/// World translation for an object layer
///
/// The layer moves against the scroll direction along the camera axes, so an
/// object layer and a UV layer with the same speed appear to travel together.
pub fn object_translation(step: Vec2, right: &Vec3, up: &Vec3) -> Vec3 {
    -(right * step.x + up * step.y)
}

/// Vector a layer would receive for a scroll input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawScroll {
    /// Texture offset delta for UV-scrolled layers (before wrapping)
    Uv(Vec2),
    /// World translation for object layers
    World(Vec3),
}

impl RawScroll {
    /// Two-dimensional view: the UV delta, or the world vector's X and Y
    pub fn as_vec2(&self) -> Vec2 {
        match self {
            Self::Uv(v) => *v,
            Self::World(v) => v.xy(),
        }
    }

    /// Three-dimensional view: the world vector, or the UV delta with zero Z
    pub fn as_vec3(&self) -> Vec3 {
        match self {
            Self::Uv(v) => Vec3::new(v.x, v.y, 0.0),
            Self::World(v) => *v,
        }
    }
}

/// Ordering of two layer weights
///
/// A missing counterpart always sorts after a present one. Incomparable
/// weights (NaN) compare equal so a stable sort keeps their input order.
pub fn compare_weights(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
