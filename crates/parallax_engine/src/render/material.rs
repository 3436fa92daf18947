//! Materials with named texture slots
//!
//! Scroll layers drive texture offsets by slot name, mirroring how shaders
//! bind their samplers. [`ScrollMaterial`] is the seam for host materials;
//! [`Material`] is the built-in implementation used by auto-billboard layers.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::math::Vec2;
use crate::render::texture::Texture;

/// Slot name of the main texture
pub const MAIN_TEXTURE_SLOT: &str = "_MainTex";

/// Shader used by the default parallax material
pub const PARALLAX_SHADER: &str = "parallax/unlit_transparent";

/// Material surface the scroll pass can drive
///
/// Implemented by [`Material`], and by host materials attached to
/// manual UV mesh layers.
pub trait ScrollMaterial: Debug {
    /// Whether the material exposes a texture slot with this name
    fn has_property(&self, name: &str) -> bool;

    /// Current offset of a texture slot, `None` if the slot does not exist
    fn texture_offset(&self, name: &str) -> Option<Vec2>;

    /// Overwrite the offset of a texture slot; returns false if the slot does not exist
    fn set_texture_offset(&mut self, name: &str, offset: Vec2) -> bool;
}

/// Unique identifier for materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    fn next() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One named texture binding
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    /// Bound texture, if any
    pub texture: Option<Texture>,
    /// UV offset
    pub offset: Vec2,
    /// UV scale
    pub scale: Vec2,
}

impl Default for TextureSlot {
    fn default() -> Self {
        Self {
            texture: None,
            offset: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

/// Material resource with named texture slots
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Unique identifier for this material
    pub id: MaterialId,
    /// Optional name for debugging
    pub name: Option<String>,
    /// Shader the host should render with
    pub shader: String,
    slots: BTreeMap<String, TextureSlot>,
}

impl Material {
    /// Create an empty material for a shader
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            id: MaterialId::next(),
            name: None,
            shader: shader.into(),
            slots: BTreeMap::new(),
        }
    }

    /// Default material for auto-billboard layers: one empty `_MainTex` slot
    pub fn parallax_default() -> Self {
        Self::new(PARALLAX_SHADER)
            .with_name("Parallax Material")
            .with_slot(MAIN_TEXTURE_SLOT)
    }

    /// Set the material name for debugging
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an empty texture slot
    #[must_use]
    pub fn with_slot(mut self, name: impl Into<String>) -> Self {
        self.slots.entry(name.into()).or_default();
        self
    }

    /// Bind a texture to a slot, creating the slot if needed
    pub fn set_texture(&mut self, slot: &str, texture: Option<Texture>) {
        self.slots.entry(slot.to_string()).or_default().texture = texture;
    }

    /// Texture bound to a slot
    pub fn texture(&self, slot: &str) -> Option<&Texture> {
        self.slots.get(slot).and_then(|s| s.texture.as_ref())
    }

    /// Access a slot
    pub fn slot(&self, name: &str) -> Option<&TextureSlot> {
        self.slots.get(name)
    }

    /// Slot names in sorted order
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

impl ScrollMaterial for Material {
    fn has_property(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    fn texture_offset(&self, name: &str) -> Option<Vec2> {
        self.slots.get(name).map(|s| s.offset)
    }

    fn set_texture_offset(&mut self, name: &str, offset: Vec2) -> bool {
        match self.slots.get_mut(name) {
            Some(slot) => {
                slot.offset = offset;
                true
            }
            None => false,
        }
    }
}
