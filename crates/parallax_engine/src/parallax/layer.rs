//! Scroll layers
//!
//! A layer is one depth slice of the parallax scene. It either scrolls the
//! texture offsets of a generated billboard, scrolls the texture offsets of a
//! host-supplied mesh material, or translates its own transform.
//!
//! Layers are plain values until attached to a
//! [`ParallaxManager`](super::ParallaxManager). Setters only record what
//! changed; the manager regenerates geometry and re-sorts when the change is
//! committed (see [`LayerMut`](super::LayerMut)).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::LayerDescriptor;
use crate::error::ParallaxError;
use crate::foundation::math::{Transform, Vec2, Vec3};
use crate::render::billboard::{
    build_mesh, generate_billboard, Alignment, BillboardGeometry, BillboardInput, BillboardSettings,
};
use crate::render::camera::{Camera, Viewport};
use crate::render::material::{Material, ScrollMaterial, MAIN_TEXTURE_SLOT};
use crate::render::mesh::Mesh;
use crate::render::texture::Texture;

use super::scroll::{advance_offset, speed_from_weight};

bitflags! {
    /// Parts of an auto-billboard that can be refreshed independently
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RefreshFlags: u8 {
        /// Regenerate the quad vertices and UVs
        const VERTICES = 1 << 0;
        /// Replace the material with the default parallax material
        const MATERIAL = 1 << 1;
        /// Bind the layer texture into the main texture slot
        const TEXTURE = 1 << 2;
    }
}

impl Default for RefreshFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Layer kind without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayerMode {
    /// Generated camera-facing quad with UV scrolling
    #[default]
    AutoBillboard,
    /// Host-supplied mesh with UV scrolling
    ManualUvMesh,
    /// Transform translation
    ObjectLayer,
}

/// Resources owned by an auto-billboard layer
#[derive(Debug, Clone)]
pub struct AutoBillboard {
    mesh: Option<Mesh>,
    geometry: Option<BillboardGeometry>,
    material: Material,
}

impl AutoBillboard {
    fn new() -> Self {
        Self {
            mesh: None,
            geometry: None,
            material: Material::parallax_default(),
        }
    }

    /// Generated mesh, in layer-local space
    pub const fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Last generated geometry, in world space
    pub const fn geometry(&self) -> Option<&BillboardGeometry> {
        self.geometry.as_ref()
    }

    /// Material the quad renders with
    pub const fn material(&self) -> &Material {
        &self.material
    }
}

/// Layer kind and the state only that kind needs
#[derive(Debug)]
pub enum LayerKind {
    /// Generated billboard
    AutoBillboard(AutoBillboard),
    /// Host mesh; the material is supplied externally
    ManualUvMesh {
        /// Material whose texture offsets are scrolled
        material: Option<Box<dyn ScrollMaterial>>,
    },
    /// Translates the layer transform
    ObjectLayer {
        /// Scroll input is in screen pixels instead of world units
        pixel_space: bool,
    },
}

impl LayerKind {
    /// Discriminant of this kind
    pub const fn mode(&self) -> LayerMode {
        match self {
            Self::AutoBillboard(_) => LayerMode::AutoBillboard,
            Self::ManualUvMesh { .. } => LayerMode::ManualUvMesh,
            Self::ObjectLayer { .. } => LayerMode::ObjectLayer,
        }
    }
}

/// Work a committed layer change asks the manager to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingWork {
    pub(crate) refresh: RefreshFlags,
    pub(crate) resort: bool,
    pub(crate) refresh_layers: bool,
}

impl Default for PendingWork {
    fn default() -> Self {
        Self {
            refresh: RefreshFlags::empty(),
            resort: false,
            refresh_layers: false,
        }
    }
}

/// One parallax layer
#[derive(Debug)]
pub struct ScrollLayer {
    name: String,
    kind: LayerKind,
    weight: f32,
    scroll_speed: f32,
    scroll_mod: f32,
    auto_configured: bool,
    billboard: BillboardSettings,
    texture: Option<Texture>,
    texture_names: Vec<String>,
    transform: Transform,
    last_known_position: Vec3,
    enabled: bool,
    refresh_on_attach: RefreshFlags,
    pending: PendingWork,
}

impl Default for ScrollLayer {
    fn default() -> Self {
        Self::new("Scroll Layer")
    }
}

impl ScrollLayer {
    /// Create an auto-billboard layer at the origin with weight zero
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::AutoBillboard(AutoBillboard::new()),
            weight: 0.0,
            scroll_speed: 1.0,
            scroll_mod: 1.0,
            auto_configured: true,
            billboard: BillboardSettings::default(),
            texture: None,
            texture_names: vec![MAIN_TEXTURE_SLOT.to_string()],
            transform: Transform::identity(),
            last_known_position: Vec3::zeros(),
            enabled: true,
            refresh_on_attach: RefreshFlags::all(),
            pending: PendingWork::default(),
        }
    }

    /// Create an object layer
    pub fn object_layer(name: impl Into<String>, pixel_space: bool) -> Self {
        let mut layer = Self::new(name);
        layer.kind = LayerKind::ObjectLayer { pixel_space };
        layer
    }

    /// Create a layer that scrolls a host material
    pub fn manual_uv_mesh(name: impl Into<String>, material: Box<dyn ScrollMaterial>) -> Self {
        let mut layer = Self::new(name);
        layer.kind = LayerKind::ManualUvMesh { material: Some(material) };
        layer
    }

    /// Build a layer from a configuration descriptor
    ///
    /// # Errors
    /// Returns [`ParallaxError::TextureLoad`] if the descriptor names a
    /// texture file that cannot be read.
    pub fn from_descriptor(descriptor: &LayerDescriptor) -> Result<Self, ParallaxError> {
        let mut layer = match descriptor.mode {
            LayerMode::AutoBillboard => Self::new(descriptor.name.clone()),
            LayerMode::ManualUvMesh => {
                let mut layer = Self::new(descriptor.name.clone());
                layer.kind = LayerKind::ManualUvMesh { material: None };
                layer
            }
            LayerMode::ObjectLayer => Self::object_layer(descriptor.name.clone(), descriptor.pixel_space),
        };

        // Weight zero keeps the default speed of 1 instead of 1 / epsilon
        if descriptor.weight != 0.0 {
            layer.set_weight(descriptor.weight);
        }
        if let Some(speed) = descriptor.scroll_speed {
            layer.set_scroll_speed(speed);
        }
        layer.set_scroll_mod(descriptor.scroll_mod);
        layer.auto_configured = descriptor.auto_configured;
        layer.set_billboard_settings(descriptor.billboard.clone());
        layer.set_texture_names(descriptor.texture_names.clone());
        layer.set_position(descriptor.position);
        layer.enabled = descriptor.enabled;
        layer.refresh_on_attach = descriptor.refresh_on_attach;

        if let Some(texture) = &descriptor.texture {
            let loaded = match &texture.path {
                Some(path) => {
                    let mut loaded = Texture::from_file(path)?;
                    if !texture.name.is_empty() {
                        loaded.name.clone_from(&texture.name);
                    }
                    loaded
                }
                None => Texture::new(texture.name.clone(), texture.width, texture.height),
            };
            layer.set_texture(Some(loaded));
        }

        Ok(layer)
    }

    /// Builder-style position
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self.last_known_position = position;
        self
    }

    /// Builder-style texture
    #[must_use]
    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.set_texture(Some(texture));
        self
    }

    /// Builder-style manual weight; turns auto-configuration off
    #[must_use]
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.auto_configured = false;
        self.set_weight(weight);
        self
    }

    /// Builder-style billboard settings
    #[must_use]
    pub fn with_billboard(mut self, settings: BillboardSettings) -> Self {
        self.set_billboard_settings(settings);
        self
    }

    // --- identity and kind ---

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the layer
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current kind with its payload
    pub const fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// Current kind discriminant
    pub const fn mode(&self) -> LayerMode {
        self.kind.mode()
    }

    /// Switch kind
    ///
    /// Entering [`LayerMode::AutoBillboard`] creates fresh billboard resources
    /// and requests a full refresh. Leaving it releases the mesh and material.
    /// A manual UV mesh layer starts without a material; supply one with
    /// [`ScrollLayer::set_material`]. Object layers start in pixel space.
    pub fn set_mode(&mut self, mode: LayerMode) {
        let from = self.mode();
        if from == mode {
            return;
        }
        self.kind = match mode {
            LayerMode::AutoBillboard => {
                self.pending.refresh |= RefreshFlags::all();
                LayerKind::AutoBillboard(AutoBillboard::new())
            }
            LayerMode::ManualUvMesh => LayerKind::ManualUvMesh { material: None },
            LayerMode::ObjectLayer => LayerKind::ObjectLayer { pixel_space: true },
        };
        log::debug!("Layer '{}' mode {:?} -> {:?}", self.name, from, mode);
    }

    /// Billboard resources, if this is an auto-billboard layer
    pub const fn billboard(&self) -> Option<&AutoBillboard> {
        match &self.kind {
            LayerKind::AutoBillboard(billboard) => Some(billboard),
            _ => None,
        }
    }

    /// Generated mesh, if any
    pub fn mesh(&self) -> Option<&Mesh> {
        self.billboard().and_then(AutoBillboard::mesh)
    }

    /// Generated geometry, if any
    pub fn geometry(&self) -> Option<&BillboardGeometry> {
        self.billboard().and_then(AutoBillboard::geometry)
    }

    /// Material whose offsets this layer scrolls
    pub fn material(&self) -> Option<&dyn ScrollMaterial> {
        match &self.kind {
            LayerKind::AutoBillboard(billboard) => Some(&billboard.material),
            LayerKind::ManualUvMesh { material } => material.as_deref(),
            LayerKind::ObjectLayer { .. } => None,
        }
    }

    /// Mutable material access
    pub fn material_mut(&mut self) -> Option<&mut dyn ScrollMaterial> {
        match &mut self.kind {
            LayerKind::AutoBillboard(billboard) => Some(&mut billboard.material),
            LayerKind::ManualUvMesh { material: Some(material) } => {
                let material: &mut dyn ScrollMaterial = material.as_mut();
                Some(material)
            }
            LayerKind::ManualUvMesh { material: None } | LayerKind::ObjectLayer { .. } => None,
        }
    }

    /// Supply the material of a manual UV mesh layer
    ///
    /// # Errors
    /// Returns [`ParallaxError::WrongLayerMode`] for other layer kinds.
    pub fn set_material(&mut self, new_material: Box<dyn ScrollMaterial>) -> Result<(), ParallaxError> {
        match &mut self.kind {
            LayerKind::ManualUvMesh { material } => {
                *material = Some(new_material);
                Ok(())
            }
            other => Err(ParallaxError::WrongLayerMode {
                expected: LayerMode::ManualUvMesh,
                actual: other.mode(),
            }),
        }
    }

    /// Pixel-space flag of an object layer
    pub const fn object_pixel_space(&self) -> Option<bool> {
        match self.kind {
            LayerKind::ObjectLayer { pixel_space } => Some(pixel_space),
            _ => None,
        }
    }

    /// Set the pixel-space flag of an object layer
    ///
    /// # Errors
    /// Returns [`ParallaxError::WrongLayerMode`] for other layer kinds.
    pub fn set_object_pixel_space(&mut self, value: bool) -> Result<(), ParallaxError> {
        match &mut self.kind {
            LayerKind::ObjectLayer { pixel_space } => {
                *pixel_space = value;
                Ok(())
            }
            other => Err(ParallaxError::WrongLayerMode {
                expected: LayerMode::ObjectLayer,
                actual: other.mode(),
            }),
        }
    }

    // --- weight and speed ---

    /// Inverse speed; heavier layers scroll slower
    pub const fn weight(&self) -> f32 {
        self.weight
    }

    /// Set the weight and derive the scroll speed from it
    pub fn set_weight(&mut self, weight: f32) {
        self.assign_weight(weight);
        self.pending.resort = true;
    }

    pub(crate) fn assign_weight(&mut self, weight: f32) {
        self.weight = weight;
        self.scroll_speed = speed_from_weight(weight);
    }

    /// Speed multiplier, normally derived from the weight
    pub const fn scroll_speed(&self) -> f32 {
        self.scroll_speed
    }

    /// Override the weight-derived speed
    pub fn set_scroll_speed(&mut self, scroll_speed: f32) {
        self.scroll_speed = scroll_speed;
    }

    /// Extra per-layer multiplier
    pub const fn scroll_mod(&self) -> f32 {
        self.scroll_mod
    }

    /// Set the per-layer multiplier
    pub fn set_scroll_mod(&mut self, scroll_mod: f32) {
        self.scroll_mod = scroll_mod;
    }

    /// Whether the weight follows the camera distance
    pub const fn is_auto_configured(&self) -> bool {
        self.auto_configured
    }

    /// Toggle distance-derived weights; turning it on refreshes the layer list
    pub fn set_auto_configured(&mut self, auto_configured: bool) {
        if auto_configured && !self.auto_configured {
            self.pending.refresh_layers = true;
        }
        self.auto_configured = auto_configured;
    }

    // --- transform ---

    /// World transform
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World position
    pub const fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Move the layer; billboards regenerate for the new depth
    pub fn set_position(&mut self, position: Vec3) {
        if self.transform.position != position {
            self.transform.position = position;
            self.mark_vertices();
        }
    }

    /// Replace the whole transform
    pub fn set_transform(&mut self, transform: Transform) {
        if self.transform != transform {
            self.transform = transform;
            self.mark_vertices();
        }
    }

    /// Position restored by [`ScrollLayer::reset_position`]
    pub const fn last_known_position(&self) -> Vec3 {
        self.last_known_position
    }

    /// Restore an object layer's position
    ///
    /// `None` restores the last known position. `Some(p)` moves to `p` and
    /// records it as the new last known position. Other kinds are unaffected;
    /// returns whether the layer moved.
    pub fn reset_position(&mut self, position: Option<Vec3>) -> bool {
        if self.mode() != LayerMode::ObjectLayer {
            return false;
        }
        match position {
            Some(position) => {
                self.transform.position = position;
                self.last_known_position = position;
            }
            None => self.transform.position = self.last_known_position,
        }
        true
    }

    pub(crate) fn translate(&mut self, delta: &Vec3) {
        self.transform.position += delta;
    }

    pub(crate) fn record_position(&mut self) {
        self.last_known_position = self.transform.position;
    }

    // --- enable state ---

    /// Whether the layer receives scroll input
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the layer; refreshes the layer list
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.pending.refresh_layers = true;
        }
    }

    // --- billboard configuration ---

    /// Billboard geometry settings
    pub const fn billboard_settings(&self) -> &BillboardSettings {
        &self.billboard
    }

    /// Replace all billboard settings
    ///
    /// Normals/tangents coupling is applied: tangents imply normals. Stretch
    /// is kept as given, and wins over pixel-perfect during generation.
    pub fn set_billboard_settings(&mut self, mut settings: BillboardSettings) {
        if settings.calculate_tangents {
            settings.calculate_normals = true;
        }
        if settings != self.billboard {
            self.billboard = settings;
            self.mark_vertices();
        }
    }

    fn update_billboard(&mut self, update: impl FnOnce(&mut BillboardSettings)) {
        let mut settings = self.billboard.clone();
        update(&mut settings);
        if settings != self.billboard {
            self.billboard = settings;
            self.mark_vertices();
        }
    }

    /// Screen anchor
    pub const fn alignment(&self) -> Alignment {
        self.billboard.alignment
    }

    /// Set the screen anchor
    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.update_billboard(|s| s.alignment = alignment);
    }

    /// Position correction in pixels
    pub const fn offset(&self) -> Vec2 {
        self.billboard.offset
    }

    /// Set the position correction in pixels
    pub fn set_offset(&mut self, offset: Vec2) {
        self.update_billboard(|s| s.offset = offset);
    }

    /// Texture size correction in pixels
    pub const fn pixel_offset(&self) -> Vec2 {
        self.billboard.pixel_offset
    }

    /// Set the texture size correction in pixels
    pub fn set_pixel_offset(&mut self, pixel_offset: Vec2) {
        self.update_billboard(|s| s.pixel_offset = pixel_offset);
    }

    /// UV seam padding
    pub const fn padding(&self) -> Vec2 {
        self.billboard.padding
    }

    /// Set the UV seam padding
    pub fn set_padding(&mut self, padding: Vec2) {
        self.update_billboard(|s| s.padding = padding);
    }

    /// Horizontal tiling in pixel-perfect mode
    pub const fn tile_x(&self) -> bool {
        self.billboard.tile_x
    }

    /// Set horizontal tiling
    pub fn set_tile_x(&mut self, tile_x: bool) {
        self.update_billboard(|s| s.tile_x = tile_x);
    }

    /// Vertical tiling in pixel-perfect mode
    pub const fn tile_y(&self) -> bool {
        self.billboard.tile_y
    }

    /// Set vertical tiling
    pub fn set_tile_y(&mut self, tile_y: bool) {
        self.update_billboard(|s| s.tile_y = tile_y);
    }

    /// Whether pixel-perfect sizing is on
    pub const fn is_pixel_perfect(&self) -> bool {
        self.billboard.pixel_perfect
    }

    /// Toggle pixel-perfect sizing; turning it on clears stretch
    pub fn set_pixel_perfect(&mut self, pixel_perfect: bool) {
        self.update_billboard(|s| {
            if pixel_perfect && !s.pixel_perfect {
                s.stretch = false;
            }
            s.pixel_perfect = pixel_perfect;
        });
    }

    /// Whether the quad fills the viewport
    pub const fn is_stretched(&self) -> bool {
        self.billboard.stretch
    }

    /// Toggle viewport-filling sizing
    pub fn set_stretch(&mut self, stretch: bool) {
        self.update_billboard(|s| s.stretch = stretch);
    }

    /// Manual quad size in world units
    pub const fn billboard_scale(&self) -> Vec2 {
        self.billboard.billboard_scale
    }

    /// Set the manual quad size
    pub fn set_billboard_scale(&mut self, scale: Vec2) {
        self.update_billboard(|s| s.billboard_scale = scale);
    }

    /// Whether normals are generated
    pub const fn calculate_normals(&self) -> bool {
        self.billboard.calculate_normals
    }

    /// Toggle normal generation; turning it off also turns off tangents
    pub fn set_calculate_normals(&mut self, value: bool) {
        self.update_billboard(|s| {
            if !value {
                s.calculate_tangents = false;
            }
            s.calculate_normals = value;
        });
    }

    /// Whether tangents are generated
    pub const fn calculate_tangents(&self) -> bool {
        self.billboard.calculate_tangents
    }

    /// Toggle tangent generation; turning it on also turns on normals
    pub fn set_calculate_tangents(&mut self, value: bool) {
        self.update_billboard(|s| {
            if value {
                s.calculate_normals = true;
            }
            s.calculate_tangents = value;
        });
    }

    // --- texture binding ---

    /// Texture used for sizing and bound to the main slot
    pub const fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Replace the texture; regenerates and rebinds
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        if self.texture != texture {
            self.texture = texture;
            if self.mode() == LayerMode::AutoBillboard {
                self.pending.refresh |= RefreshFlags::VERTICES | RefreshFlags::TEXTURE;
            }
        }
    }

    /// Material slots that receive scroll offsets
    pub fn texture_names(&self) -> &[String] {
        &self.texture_names
    }

    /// Slot name at `index`, or an empty string when out of range
    pub fn texture_name(&self, index: usize) -> &str {
        self.texture_names.get(index).map_or("", String::as_str)
    }

    /// Replace all slot names
    pub fn set_texture_names(&mut self, names: Vec<String>) {
        self.texture_names = names;
    }

    /// Replace one slot name
    ///
    /// # Errors
    /// Returns [`ParallaxError::TextureNameOutOfRange`] and leaves the layer
    /// unchanged if `index` is not an existing entry.
    pub fn set_texture_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), ParallaxError> {
        let len = self.texture_names.len();
        match self.texture_names.get_mut(index) {
            Some(slot) => {
                *slot = name.into();
                Ok(())
            }
            None => {
                log::warn!(
                    "Layer '{}': texture name index {} out of range ({} names), ignored",
                    self.name,
                    index,
                    len
                );
                Err(ParallaxError::TextureNameOutOfRange { index, len })
            }
        }
    }

    /// Check every non-empty slot name against the bound material
    ///
    /// Layers without a material have nothing to check.
    ///
    /// # Errors
    /// Returns [`ParallaxError::UnknownTextureSlot`] for the first name the
    /// material does not expose.
    pub fn validate_texture_names(&self) -> Result<(), ParallaxError> {
        let Some(material) = self.material() else {
            return Ok(());
        };
        match self
            .texture_names
            .iter()
            .find(|name| !name.is_empty() && !material.has_property(name))
        {
            Some(name) => Err(ParallaxError::UnknownTextureSlot(name.clone())),
            None => Ok(()),
        }
    }

    // --- refresh ---

    /// Parts refreshed one frame after attaching
    pub const fn refresh_on_attach(&self) -> RefreshFlags {
        self.refresh_on_attach
    }

    /// Choose which parts refresh one frame after attaching
    pub fn set_refresh_on_attach(&mut self, flags: RefreshFlags) {
        self.refresh_on_attach = flags;
    }

    /// Ask for a billboard refresh when the change is committed
    pub fn request_refresh(&mut self, flags: RefreshFlags) {
        if self.mode() == LayerMode::AutoBillboard {
            self.pending.refresh |= flags;
        }
    }

    /// Full billboard refresh plus a layer list refresh
    pub fn request_reset(&mut self) {
        self.request_refresh(RefreshFlags::all());
        self.pending.refresh_layers = true;
    }

    fn mark_vertices(&mut self) {
        if self.mode() == LayerMode::AutoBillboard {
            self.pending.refresh |= RefreshFlags::VERTICES;
        }
    }

    pub(crate) fn take_pending(&mut self) -> PendingWork {
        std::mem::take(&mut self.pending)
    }

    /// Refresh the flagged billboard parts
    ///
    /// Vertices need a camera; without one they are left as they are. No-op
    /// for other kinds.
    pub(crate) fn apply_refresh(&mut self, flags: RefreshFlags, view: Option<(&Camera, Viewport)>) {
        let LayerKind::AutoBillboard(billboard) = &mut self.kind else {
            return;
        };

        if flags.contains(RefreshFlags::VERTICES) {
            match view {
                Some((camera, viewport)) => {
                    let input = BillboardInput {
                        camera,
                        viewport,
                        transform: &self.transform,
                        texture: self.texture.as_ref(),
                        settings: &self.billboard,
                    };
                    match generate_billboard(&input) {
                        Ok(geometry) => {
                            billboard.mesh = Some(build_mesh(&geometry, &self.transform, &self.billboard));
                            billboard.geometry = Some(geometry);
                        }
                        Err(e) => log::warn!("Layer '{}': billboard generation failed: {}", self.name, e),
                    }
                }
                None => log::debug!("Layer '{}': no camera, vertices not refreshed", self.name),
            }
        }

        if flags.contains(RefreshFlags::MATERIAL) {
            billboard.material = Material::parallax_default();
            self.texture_names = vec![MAIN_TEXTURE_SLOT.to_string()];
        }

        if flags.contains(RefreshFlags::TEXTURE) {
            if let Some(texture) = &self.texture {
                billboard.material.set_texture(MAIN_TEXTURE_SLOT, Some(texture.clone()));
            }
        }
    }

    /// Add a UV step to every named slot the material exposes
    pub(crate) fn scroll_uv(&mut self, step: Vec2) {
        let Self { kind, texture_names, .. } = self;
        let material: &mut dyn ScrollMaterial = match kind {
            LayerKind::AutoBillboard(billboard) => &mut billboard.material,
            LayerKind::ManualUvMesh { material: Some(material) } => material.as_mut(),
            LayerKind::ManualUvMesh { material: None } | LayerKind::ObjectLayer { .. } => return,
        };
        for name in texture_names.iter().filter(|n| !n.is_empty()) {
            if let Some(offset) = material.texture_offset(name) {
                material.set_texture_offset(name, advance_offset(offset, step));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let layer = ScrollLayer::new("bg");
        assert_eq!(layer.mode(), LayerMode::AutoBillboard);
        assert_eq!(layer.weight(), 0.0);
        assert_eq!(layer.scroll_speed(), 1.0);
        assert_eq!(layer.scroll_mod(), 1.0);
        assert!(layer.is_auto_configured());
        assert_eq!(layer.texture_names(), ["_MainTex".to_string()]);
        assert_eq!(layer.refresh_on_attach(), RefreshFlags::all());
    }

    #[test]
    fn test_texture_name_out_of_range() {
        let mut layer = ScrollLayer::new("bg");
        let err = layer.set_texture_name(3, "_BumpMap").unwrap_err();
        assert!(matches!(err, ParallaxError::TextureNameOutOfRange { index: 3, len: 1 }));
        assert_eq!(layer.texture_names(), ["_MainTex".to_string()]);
        assert_eq!(layer.texture_name(3), "");

        layer.set_texture_name(0, "_Detail").unwrap();
        assert_eq!(layer.texture_name(0), "_Detail");
    }

    #[test]
    fn test_validate_texture_names() {
        let mut layer = ScrollLayer::new("bg");
        assert!(layer.validate_texture_names().is_ok());
        layer.set_texture_names(vec!["_MainTex".into(), String::new(), "_BumpMap".into()]);
        assert!(matches!(
            layer.validate_texture_names(),
            Err(ParallaxError::UnknownTextureSlot(name)) if name == "_BumpMap"
        ));
    }

    #[test]
    fn test_normals_tangents_coupling() {
        let mut layer = ScrollLayer::new("bg");
        layer.set_calculate_tangents(true);
        assert!(layer.calculate_normals());
        layer.set_calculate_normals(false);
        assert!(!layer.calculate_tangents());
    }

    #[test]
    fn test_pixel_perfect_clears_stretch() {
        let mut layer = ScrollLayer::new("bg");
        layer.set_pixel_perfect(false);
        layer.set_stretch(true);
        layer.set_pixel_perfect(true);
        assert!(!layer.is_stretched());
    }

    #[test]
    fn test_mode_transitions() {
        let mut layer = ScrollLayer::new("bg");
        layer.take_pending();

        layer.set_mode(LayerMode::ManualUvMesh);
        assert!(layer.material().is_none());
        assert!(layer.mesh().is_none());

        layer.set_mode(LayerMode::ObjectLayer);
        assert_eq!(layer.object_pixel_space(), Some(true));
        assert!(layer.set_material(Box::new(Material::new("x"))).is_err());

        layer.set_mode(LayerMode::AutoBillboard);
        assert!(layer.material().is_some_and(|m| m.has_property("_MainTex")));
        assert_eq!(layer.take_pending().refresh, RefreshFlags::all());
    }

    #[test]
    fn test_reset_position_only_for_object_layers() {
        let mut billboard = ScrollLayer::new("bg").with_position(Vec3::new(1.0, 0.0, 0.0));
        assert!(!billboard.reset_position(Some(Vec3::zeros())));
        assert_eq!(billboard.position(), Vec3::new(1.0, 0.0, 0.0));

        let mut object = ScrollLayer::object_layer("props", false).with_position(Vec3::new(1.0, 2.0, 0.0));
        object.translate(&Vec3::new(5.0, 0.0, 0.0));
        assert!(object.reset_position(None));
        assert_eq!(object.position(), Vec3::new(1.0, 2.0, 0.0));

        assert!(object.reset_position(Some(Vec3::new(9.0, 9.0, 0.0))));
        object.translate(&Vec3::new(1.0, 0.0, 0.0));
        object.reset_position(None);
        assert_eq!(object.position(), Vec3::new(9.0, 9.0, 0.0));
    }

    #[test]
    fn test_scroll_uv_skips_unknown_and_empty_slots() {
        let mut layer = ScrollLayer::new("bg");
        layer.set_texture_names(vec![String::new(), "_Missing".into(), "_MainTex".into()]);
        layer.scroll_uv(Vec2::new(1.25, -0.25));
        let offset = layer.material().and_then(|m| m.texture_offset("_MainTex")).unwrap();
        approx::assert_relative_eq!(offset, Vec2::new(0.25, 0.75), epsilon = 1e-6);
    }

    #[test]
    fn test_material_refresh_resets_texture_names() {
        let mut layer = ScrollLayer::new("bg").with_texture(Texture::new("sky", 64, 64));
        layer.set_texture_names(vec!["_Detail".into()]);
        layer.apply_refresh(RefreshFlags::MATERIAL | RefreshFlags::TEXTURE, None);

        assert_eq!(layer.texture_names(), ["_MainTex".to_string()]);
        let billboard = layer.billboard().unwrap();
        assert_eq!(billboard.material().texture("_MainTex").map(|t| t.width), Some(64));
        assert!(billboard.mesh().is_none());
    }
}
