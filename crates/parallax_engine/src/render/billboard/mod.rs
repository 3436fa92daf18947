//! Auto-billboard geometry
//!
//! Camera-facing quads sized from the camera projection so layer textures
//! land on exact screen pixels.

pub mod generator;
pub mod types;

pub use generator::{build_mesh, generate_billboard, BillboardInput, QUAD_INDICES};
pub use types::{Alignment, BillboardGeometry, BillboardSettings, Sizing};
