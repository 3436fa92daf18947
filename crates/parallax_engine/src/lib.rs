//! # Parallax Engine
//!
//! Multi-layer parallax scrolling for orthographic cameras.
//!
//! ## Features
//!
//! - **Auto-billboards**: camera-facing quads sized so textures render
//!   pixel for pixel, regenerated when the camera view changes
//! - **Weighted scrolling**: one scroll input per frame, spread over layers
//!   by weight, with lighter layers moving faster
//! - **Three layer kinds**: auto-billboards, host meshes with scrollable
//!   materials, and object layers that move in world space
//! - **Configuration**: scenes bootstrap from RON or TOML files
//!
//! ## Quick Start
//!
//! ```rust
//! use parallax_engine::prelude::*;
//!
//! let scene = SceneContext::new();
//! let mut manager = ParallaxManager::new(&scene);
//! manager.set_camera(Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 1280, 720));
//!
//! let sky = manager.attach(
//!     ScrollLayer::new("sky")
//!         .with_weight(4.0)
//!         .with_texture(Texture::new("sky", 256, 256)),
//! );
//!
//! // Once per frame
//! manager.scroll(0.5, 0.0);
//! manager.tick();
//! manager.end_frame();
//!
//! assert!(manager.layer(sky).is_some());
//! ```

#![warn(missing_docs)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod parallax;
pub mod render;

pub use error::ParallaxError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ParallaxConfig},
        error::ParallaxError,
        foundation::{
            collections::LayerId,
            math::{Transform, Vec2, Vec3},
        },
        parallax::{
            LayerMode, ParallaxManager, RawScroll, RefreshFlags, SceneContext, ScrollAxes, ScrollLayer, ViewportMode,
        },
        render::{
            billboard::{Alignment, BillboardSettings},
            Camera, Material, ScrollMaterial, Texture,
        },
    };
}
