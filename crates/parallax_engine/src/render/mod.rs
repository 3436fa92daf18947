//! Render-side primitives consumed by the parallax core
//!
//! The host renderer owns GPU resources. This module only models what the
//! layers need: the camera projection, texture sizes, named material slots
//! and the generated billboard meshes.

pub mod billboard;
pub mod camera;
pub mod material;
pub mod mesh;
pub mod texture;

pub use camera::{Camera, Projection, Viewport};
pub use material::{Material, MaterialId, ScrollMaterial, TextureSlot, MAIN_TEXTURE_SLOT};
pub use mesh::{Mesh, Vertex};
pub use texture::{Texture, WrapMode};
