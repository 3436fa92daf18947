//! Configuration system
//!
//! Bootstrap configuration for a parallax scene: manager settings, an
//! optional camera and a list of layer descriptors. Files are `.toml` or
//! `.ron`, picked by extension.

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::parallax::{LayerMode, RefreshFlags, ScrollAxes, ViewportMode};
use crate::render::billboard::BillboardSettings;
use crate::render::camera::{Camera, Projection};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let is_toml = path.ends_with(".toml");
        if !is_toml && !path.ends_with(".ron") {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = if is_toml {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        log::debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values parsed but are not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete parallax scene bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    /// Manager-wide settings
    pub manager: ManagerSettings,

    /// Camera to create; the host may also assign one later
    pub camera: Option<CameraSettings>,

    /// Layers attached at startup, in declaration order
    pub layers: Vec<LayerDescriptor>,
}

impl Config for ParallaxConfig {}

impl ParallaxConfig {
    /// Reject values the manager cannot work with
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.manager.base_speed.is_finite() {
            return Err(ConfigError::Invalid("manager.base_speed must be finite".into()));
        }
        if let ViewportMode::Manual { min, max } = self.manager.viewport {
            if min.0 > max.0 || min.1 > max.1 {
                return Err(ConfigError::Invalid(format!(
                    "manager.viewport min {min:?} exceeds max {max:?}"
                )));
            }
        }
        if let Some(camera) = &self.camera {
            if camera.pixel_width == 0 || camera.pixel_height == 0 {
                return Err(ConfigError::Invalid("camera pixel size must be non-zero".into()));
            }
            if camera.near >= camera.far {
                return Err(ConfigError::Invalid("camera near plane must be before far plane".into()));
            }
        }
        for layer in &self.layers {
            if !layer.weight.is_finite() || layer.weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "layer '{}' has invalid weight {}",
                    layer.name, layer.weight
                )));
            }
            if let Some(texture) = &layer.texture {
                if texture.path.is_none() && (texture.width == 0 || texture.height == 0) {
                    return Err(ConfigError::Invalid(format!(
                        "layer '{}' texture '{}' needs a path or non-zero size",
                        layer.name, texture.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Manager-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Axes of the scroll input that are honored
    pub scroll_axes: ScrollAxes,

    /// Global speed multiplier
    pub base_speed: f32,

    /// How the viewport size is derived from the camera
    pub viewport: ViewportMode,

    /// Regenerate billboard vertices every tick
    pub auto_refresh_geometry: bool,

    /// Editor-style context; forces per-tick geometry refresh
    pub design_time: bool,

    /// `env_logger` filter string used by hosts that initialize logging from config
    pub log_level: String,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            scroll_axes: ScrollAxes::X,
            base_speed: 1.0,
            viewport: ViewportMode::Automatic,
            auto_refresh_geometry: false,
            design_time: false,
            log_level: "info".to_string(),
        }
    }
}

/// Camera bootstrap settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// World position
    pub position: Vec3,

    /// Optional point to orient towards
    pub look_at: Option<Vec3>,

    /// Up hint used with `look_at`
    pub up: Vec3,

    /// Projection model
    pub projection: Projection,

    /// Near clip distance
    pub near: f32,

    /// Far clip distance
    pub far: f32,

    /// Viewport width in pixels
    pub pixel_width: u32,

    /// Viewport height in pixels
    pub pixel_height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            look_at: None,
            up: Vec3::y(),
            projection: Projection::Orthographic { size: 5.0 },
            near: 0.3,
            far: 1000.0,
            pixel_width: 1280,
            pixel_height: 720,
        }
    }
}

impl CameraSettings {
    /// Camera described by these settings
    pub fn to_camera(&self) -> Camera {
        let mut camera = match self.projection {
            Projection::Orthographic { size } => {
                Camera::orthographic(self.position, size, self.pixel_width, self.pixel_height)
            }
            Projection::Perspective { fov } => {
                Camera::perspective(self.position, fov, self.pixel_width, self.pixel_height)
            }
        };
        camera.near = self.near;
        camera.far = self.far;
        if let Some(target) = self.look_at {
            camera.look_at(target, self.up);
        }
        camera
    }
}

/// Texture source for an auto-billboard layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureDescriptor {
    /// Texture name
    pub name: String,

    /// Image file to read dimensions from; takes precedence over `width`/`height`
    pub path: Option<String>,

    /// Pixel width when no path is given
    pub width: u32,

    /// Pixel height when no path is given
    pub height: u32,
}

/// One layer to attach at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerDescriptor {
    /// Display name
    pub name: String,

    /// World position of the layer transform
    pub position: Vec3,

    /// Layer kind
    pub mode: LayerMode,

    /// Manual weight (ignored while auto-configured)
    pub weight: f32,

    /// Derive weight from camera distance
    pub auto_configured: bool,

    /// Explicit scroll speed overriding the weight-derived one
    pub scroll_speed: Option<f32>,

    /// Per-layer speed multiplier
    pub scroll_mod: f32,

    /// Material slots receiving the scroll offset
    pub texture_names: Vec<String>,

    /// Geometry settings for auto-billboard layers
    pub billboard: BillboardSettings,

    /// Texture bound to auto-billboard layers
    pub texture: Option<TextureDescriptor>,

    /// Parts refreshed one frame after attach
    pub refresh_on_attach: RefreshFlags,

    /// Object layers scroll in screen pixels instead of world units
    pub pixel_space: bool,

    /// Whether the layer takes part in scroll distribution
    pub enabled: bool,
}

impl Default for LayerDescriptor {
    fn default() -> Self {
        Self {
            name: "Scroll Layer".to_string(),
            position: Vec3::zeros(),
            mode: LayerMode::AutoBillboard,
            weight: 0.0,
            auto_configured: true,
            scroll_speed: None,
            scroll_mod: 1.0,
            texture_names: vec![crate::render::material::MAIN_TEXTURE_SLOT.to_string()],
            billboard: BillboardSettings::default(),
            texture: None,
            refresh_on_attach: RefreshFlags::all(),
            pixel_space: false,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_RON: &str = r#"(
        manager: (
            scroll_axes: X,
            base_speed: 2.0,
            viewport: Manual(min: (320, 200), max: (1920, 1080)),
        ),
        camera: Some((
            position: (0.0, 0.0, 10.0),
            projection: Orthographic(size: 5.0),
            pixel_width: 800,
            pixel_height: 600,
        )),
        layers: [
            (name: "sky", weight: 4.0, auto_configured: false),
            (name: "props", mode: ObjectLayer, pixel_space: true),
        ],
    )"#;

    #[test]
    fn test_parse_ron_scene() {
        let config: ParallaxConfig = ron::from_str(SCENE_RON).unwrap();
        assert_eq!(config.manager.scroll_axes, ScrollAxes::X);
        assert_eq!(config.manager.base_speed, 2.0);
        assert_eq!(
            config.manager.viewport,
            ViewportMode::Manual { min: (320, 200), max: (1920, 1080) }
        );
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[0].name, "sky");
        assert!(!config.layers[0].auto_configured);
        assert_eq!(config.layers[1].mode, LayerMode::ObjectLayer);
        assert!(config.layers[1].pixel_space);
        // Unspecified fields fall back to defaults
        assert_eq!(config.layers[1].texture_names, vec!["_MainTex".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_viewport_bounds() {
        let mut config = ParallaxConfig::default();
        config.manager.viewport = ViewportMode::Manual { min: (800, 600), max: (640, 480) };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_sizeless_texture() {
        let mut config = ParallaxConfig::default();
        config.layers.push(LayerDescriptor {
            texture: Some(TextureDescriptor { name: "bg".into(), ..Default::default() }),
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ParallaxConfig::load_from_file("scene.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let missing = ParallaxConfig::load_from_file("does_not_exist_parallax.ron");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let path = std::env::temp_dir().join(format!("parallax_config_{}.ron", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let mut config = ParallaxConfig::default();
        config.manager.base_speed = 0.5;
        config.layers.push(LayerDescriptor { name: "clouds".into(), ..Default::default() });
        config.save_to_file(&path).unwrap();

        let loaded = ParallaxConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
