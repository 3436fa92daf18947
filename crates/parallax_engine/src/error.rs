//! Error types for the parallax core

use crate::config::ConfigError;
use crate::foundation::collections::LayerId;
use crate::parallax::LayerMode;

/// Errors reported by manager and layer operations.
///
/// None of these escape the per-frame tick: the tick logs and degrades to a
/// no-op instead. They are returned from explicit configuration calls so the
/// caller can decide what to do.
#[derive(thiserror::Error, Debug)]
pub enum ParallaxError {
    /// Another manager is already authoritative in the same scene context
    #[error("there can only be one parallax manager per scene")]
    DuplicateManager,

    /// The operation needs a camera and none is assigned
    #[error("parallax manager has no camera")]
    MissingCamera,

    /// The layer handle does not belong to this manager (or was detached)
    #[error("unknown scroll layer {0:?}")]
    UnknownLayer(LayerId),

    /// Texture name index outside the configured name list
    #[error("texture name index {index} out of range (layer has {len} names)")]
    TextureNameOutOfRange {
        /// Requested index
        index: usize,
        /// Number of configured texture names
        len: usize,
    },

    /// The bound material has no texture slot with this name
    #[error("material has no texture slot named '{0}'")]
    UnknownTextureSlot(String),

    /// Operation only valid for a different layer mode
    #[error("operation requires a {expected:?} layer, but the layer is {actual:?}")]
    WrongLayerMode {
        /// Mode the operation needs
        expected: LayerMode,
        /// Mode the layer is in
        actual: LayerMode,
    },

    /// Camera projection matrix could not be inverted
    #[error("camera projection matrix is not invertible")]
    SingularProjection,

    /// Texture dimensions could not be read from disk
    #[error("failed to load texture '{path}': {source}")]
    TextureLoad {
        /// Path that failed to load
        path: String,
        /// Underlying image error
        #[source]
        source: image::ImageError,
    },

    /// Configuration loading or validation failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}
