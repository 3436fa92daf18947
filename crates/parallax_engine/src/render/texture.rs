//! Texture descriptors
//!
//! The parallax core only needs a texture's pixel size and a name; pixel data
//! and GPU upload stay with the host renderer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParallaxError;

/// Texture wrapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Repeat the texture; required for scrolling layers
    #[default]
    Repeat,
    /// Mirror the texture
    MirroredRepeat,
    /// Clamp to edge
    ClampToEdge,
}

/// Texture bound to a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    /// Name for debugging and material binding
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Sampler wrap mode
    pub wrap_mode: WrapMode,
}

impl Texture {
    /// Create a texture descriptor with repeat wrapping
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            wrap_mode: WrapMode::Repeat,
        }
    }

    /// Read pixel dimensions from an image file
    ///
    /// Only the image header is decoded. The texture is named after the file
    /// stem.
    ///
    /// # Errors
    /// Returns [`ParallaxError::TextureLoad`] if the file cannot be opened or
    /// is not a supported image.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParallaxError> {
        let path = path.as_ref();
        let (width, height) = image::image_dimensions(path).map_err(|source| ParallaxError::TextureLoad {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

        log::debug!("Loaded texture '{}' ({}x{}) from {}", name, width, height, path.display());
        Ok(Self::new(name, width, height))
    }

    /// Builder-style wrap mode override
    #[must_use]
    pub const fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    /// Pixel size as floats
    pub fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Whether either dimension is zero
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
