//! Parallax scrolling
//!
//! A [`ParallaxManager`] owns a set of [`ScrollLayer`]s and, once per frame,
//! turns a single scroll input into per-layer motion. Layers closer to the
//! camera (lower weight) move faster than distant ones.

pub mod layer;
pub mod manager;
pub mod scene;
pub mod scheduler;
pub mod scroll;

#[cfg(test)]
mod tests;

pub use layer::{AutoBillboard, LayerKind, LayerMode, RefreshFlags, ScrollLayer};
pub use manager::{LayerMut, ParallaxManager, ViewportMode};
pub use scene::{ManagerId, SceneContext};
pub use scheduler::{FrameScheduler, FrameTask};
pub use scroll::{RawScroll, ScrollAxes};
