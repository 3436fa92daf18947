//! Parallax manager
//!
//! Owns the camera, the global scroll input and the weight-ordered layer
//! list. The host drives it once per frame:
//!
//! ```text
//! game logic -> manager.scroll(dx, dy) -> manager.tick() -> render -> manager.end_frame()
//! ```
//!
//! `tick` recomputes the viewport, regenerates billboards when needed and
//! distributes the pending scroll to every enabled layer. `end_frame` runs
//! the deferred activation of layers attached during the frame.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::config::ParallaxConfig;
use crate::error::ParallaxError;
use crate::foundation::collections::{LayerId, LayerMap};
use crate::foundation::math::{Quat, Vec2, Vec3};
use crate::render::camera::{Camera, Projection, Viewport};

use super::layer::{LayerMode, RefreshFlags, ScrollLayer};
use super::scene::{ManagerId, ManagerRegistration, SceneContext};
use super::scheduler::{FrameScheduler, FrameTask};
use super::scroll::{compare_weights, layer_factor, object_translation, RawScroll, ScrollAxes};

/// How the effective viewport is derived from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewportMode {
    /// Use the camera's pixel size
    #[default]
    Automatic,
    /// Clamp the camera's pixel size, width and height independently
    Manual {
        /// Minimum (width, height) in pixels
        min: (u32, u32),
        /// Maximum (width, height) in pixels
        max: (u32, u32),
    },
}

impl ViewportMode {
    /// Effective viewport for a camera
    pub fn resolve(&self, camera: &Camera) -> Viewport {
        match *self {
            Self::Automatic => Viewport::from_camera(camera),
            Self::Manual { min, max } => Viewport::new(
                clamp(camera.pixel_width, min.0, max.0) as f32,
                clamp(camera.pixel_height, min.1, max.1) as f32,
            ),
        }
    }
}

// Unlike `Ord::clamp`, tolerates inverted bounds (max wins).
fn clamp(value: u32, min: u32, max: u32) -> u32 {
    value.max(min).min(max)
}

/// Camera state billboard geometry depends on
#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewKey {
    position: Vec3,
    rotation: Quat,
    projection: Projection,
    near: f32,
    far: f32,
    pixel_width: u32,
    pixel_height: u32,
    viewport: Viewport,
}

impl ViewKey {
    const fn new(camera: &Camera, viewport: Viewport) -> Self {
        Self {
            position: camera.position,
            rotation: camera.rotation,
            projection: camera.projection,
            near: camera.near,
            far: camera.far,
            pixel_width: camera.pixel_width,
            pixel_height: camera.pixel_height,
            viewport,
        }
    }
}

/// Scene-wide parallax controller
#[derive(Debug)]
pub struct ParallaxManager {
    registration: ManagerRegistration,
    duplicate_reported: bool,

    camera: Option<Camera>,
    viewport: Viewport,
    view_key: Option<ViewKey>,

    scroll_axes: ScrollAxes,
    base_speed: f32,
    viewport_mode: ViewportMode,
    auto_refresh_geometry: bool,
    design_time: bool,

    layers: LayerMap<ScrollLayer>,
    order: Vec<LayerId>,
    pending_scroll: Vec2,
    scheduler: FrameScheduler,
}

impl ParallaxManager {
    /// Create a manager for a scene
    ///
    /// If the scene already has a live manager, the new one is created inert:
    /// an error is logged and its [`tick`](Self::tick) does nothing until the
    /// other manager is dropped.
    pub fn new(scene: &SceneContext) -> Self {
        let registration = scene.register();
        let duplicate = !registration.is_authoritative();
        if duplicate {
            log::error!("There can only be one parallax manager per scene; this manager will be inert");
        } else {
            log::info!("Parallax manager {:?} created", registration.id());
        }

        Self {
            registration,
            duplicate_reported: duplicate,
            camera: None,
            viewport: Viewport::new(0.0, 0.0),
            view_key: None,
            scroll_axes: ScrollAxes::default(),
            base_speed: 1.0,
            viewport_mode: ViewportMode::Automatic,
            auto_refresh_geometry: false,
            design_time: false,
            layers: LayerMap::with_key(),
            order: Vec::new(),
            pending_scroll: Vec2::zeros(),
            scheduler: FrameScheduler::new(),
        }
    }

    /// Create a manager, refusing to create a duplicate
    ///
    /// # Errors
    /// Returns [`ParallaxError::DuplicateManager`] if the scene already has a
    /// live manager.
    pub fn try_new(scene: &SceneContext) -> Result<Self, ParallaxError> {
        if scene.active_manager().is_some() {
            log::error!("There can only be one parallax manager per scene");
            return Err(ParallaxError::DuplicateManager);
        }
        Ok(Self::new(scene))
    }

    /// Build a manager, its camera and its layers from configuration
    ///
    /// Layers are attached in declaration order.
    ///
    /// # Errors
    /// Returns [`ParallaxError::Config`] for invalid configuration and
    /// [`ParallaxError::TextureLoad`] for unreadable layer textures.
    pub fn from_config(scene: &SceneContext, config: &ParallaxConfig) -> Result<Self, ParallaxError> {
        config.validate()?;

        let mut manager = Self::new(scene);
        let settings = &config.manager;
        manager.scroll_axes = settings.scroll_axes;
        manager.base_speed = settings.base_speed;
        manager.viewport_mode = settings.viewport;
        manager.auto_refresh_geometry = settings.auto_refresh_geometry;
        manager.design_time = settings.design_time;

        if let Some(camera) = &config.camera {
            manager.set_camera(camera.to_camera());
        }
        for descriptor in &config.layers {
            manager.attach(ScrollLayer::from_descriptor(descriptor)?);
        }

        log::info!(
            "Parallax manager configured with {} layers (axes: {:?}, base speed: {})",
            manager.len(),
            manager.scroll_axes,
            manager.base_speed
        );
        Ok(manager)
    }

    /// Identifier in the scene context
    pub const fn id(&self) -> ManagerId {
        self.registration.id()
    }

    /// Whether this manager drives its scene
    pub fn is_authoritative(&self) -> bool {
        self.registration.is_authoritative()
    }

    // --- camera ---

    /// Projection source for geometry and weights
    pub const fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Mutable camera access
    ///
    /// Billboards follow pose and size changes on the next tick. Weights of
    /// auto-configured layers follow on the next
    /// [`refresh_layers`](Self::refresh_layers).
    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    /// Assign the camera, then refresh weights and billboard geometry
    ///
    /// Perspective cameras are accepted, but billboard sizing is only exact
    /// for orthographic projection.
    pub fn set_camera(&mut self, camera: Camera) {
        if !camera.is_orthographic() {
            log::warn!("Parallax camera is not orthographic; billboard geometry will be approximate");
        }
        self.camera = Some(camera);
        self.refresh_layers();
        self.refresh_all_billboard_geometry();
    }

    /// Remove the camera; ticks become no-ops
    pub fn clear_camera(&mut self) -> Option<Camera> {
        self.view_key = None;
        self.camera.take()
    }

    /// Effective viewport from the last tick or refresh
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    // --- settings ---

    /// Honored scroll axes
    pub const fn scroll_constraints(&self) -> ScrollAxes {
        self.scroll_axes
    }

    /// Choose the honored scroll axes
    pub fn set_scroll_constraints(&mut self, axes: ScrollAxes) {
        self.scroll_axes = axes;
    }

    /// Global speed multiplier
    pub const fn base_speed(&self) -> f32 {
        self.base_speed
    }

    /// Set the global speed multiplier
    pub fn set_base_speed(&mut self, base_speed: f32) {
        self.base_speed = base_speed;
    }

    /// Viewport derivation mode
    pub const fn viewport_mode(&self) -> ViewportMode {
        self.viewport_mode
    }

    /// Set the viewport derivation mode
    pub fn set_viewport_mode(&mut self, mode: ViewportMode) {
        self.viewport_mode = mode;
    }

    /// Whether billboards regenerate every tick
    pub const fn auto_refresh_geometry(&self) -> bool {
        self.auto_refresh_geometry
    }

    /// Regenerate billboards every tick
    pub fn set_auto_refresh_geometry(&mut self, value: bool) {
        self.auto_refresh_geometry = value;
    }

    /// Whether running in an editor-style context
    pub const fn design_time(&self) -> bool {
        self.design_time
    }

    /// Editor-style context; forces per-tick billboard regeneration
    pub fn set_design_time(&mut self, value: bool) {
        self.design_time = value;
    }

    // --- scroll input ---

    /// Set this frame's scroll input; the last call before `tick` wins
    pub fn scroll(&mut self, dx: f32, dy: f32) {
        self.pending_scroll = Vec2::new(dx, dy);
    }

    /// Vector form of [`scroll`](Self::scroll)
    pub fn scroll_vec(&mut self, scroll: Vec2) {
        self.pending_scroll = scroll;
    }

    /// Scroll input waiting for the next tick
    pub const fn pending_scroll(&self) -> Vec2 {
        self.pending_scroll
    }

    // --- layers ---

    /// Attach a layer
    ///
    /// The layer list is refreshed immediately. The layer's
    /// [`refresh_on_attach`](ScrollLayer::refresh_on_attach) parts are
    /// refreshed at the end of the current frame.
    pub fn attach(&mut self, mut layer: ScrollLayer) -> LayerId {
        layer.record_position();
        layer.take_pending();
        let name = layer.name().to_string();

        let id = self.layers.insert(layer);
        self.order.push(id);
        self.scheduler.schedule_end_of_frame(FrameTask::ActivateLayer(id));
        log::debug!("Attached layer '{}' as {:?}", name, id);

        self.refresh_layers();
        id
    }

    /// Detach a layer and hand it back
    pub fn detach(&mut self, id: LayerId) -> Option<ScrollLayer> {
        let layer = self.layers.remove(id)?;
        self.order.retain(|other| *other != id);
        self.scheduler.cancel_layer(id);
        log::debug!("Detached layer '{}' ({:?})", layer.name(), id);

        self.refresh_layers();
        Some(layer)
    }

    /// Enable or disable a layer
    ///
    /// # Errors
    /// Returns [`ParallaxError::UnknownLayer`] for a stale handle.
    pub fn set_layer_enabled(&mut self, id: LayerId, enabled: bool) -> Result<(), ParallaxError> {
        let mut layer = self.layer_mut(id).ok_or(ParallaxError::UnknownLayer(id))?;
        layer.set_enabled(enabled);
        Ok(())
    }

    /// Shared access to a layer
    pub fn layer(&self, id: LayerId) -> Option<&ScrollLayer> {
        self.layers.get(id)
    }

    /// Mutable access to a layer
    ///
    /// Changes are committed when the guard drops: geometry is regenerated
    /// and the layer list re-sorted as needed.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<LayerMut<'_>> {
        if self.layers.contains_key(id) {
            Some(LayerMut { manager: self, id })
        } else {
            None
        }
    }

    /// Layers in weight order
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &ScrollLayer)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.layers.get(*id).map(|layer| (*id, layer)))
    }

    /// Layer handles in weight order
    pub fn layer_order(&self) -> &[LayerId] {
        &self.order
    }

    /// Number of attached layers
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no layers are attached
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Layer at a position in weight order
    pub fn layer_at(&self, index: usize) -> Option<&ScrollLayer> {
        self.order.get(index).and_then(|id| self.layers.get(*id))
    }

    /// Handle of the first layer with this name
    pub fn find_layer(&self, name: &str) -> Option<LayerId> {
        self.layers().find(|(_, layer)| layer.name() == name).map(|(id, _)| id)
    }

    /// Recompute auto-configured weights and re-sort
    ///
    /// Auto-configured layers take the Euclidean distance to the camera as
    /// their weight. The sort is stable: equal weights keep their order.
    pub fn refresh_layers(&mut self) {
        if let Some(camera) = &self.camera {
            for id in &self.order {
                if let Some(layer) = self.layers.get_mut(*id) {
                    if layer.is_auto_configured() {
                        layer.assign_weight(camera.distance_to(&layer.position()));
                    }
                }
            }
        }
        self.sort_layers();
    }

    /// Switch every layer to distance-derived weights
    pub fn set_all_layers_auto_configured(&mut self) {
        for layer in self.layers.values_mut() {
            layer.set_auto_configured(true);
            layer.take_pending();
        }
        self.refresh_layers();
    }

    fn sort_layers(&mut self) {
        let layers = &self.layers;
        self.order
            .sort_by(|a, b| compare_weights(layers.get(*a).map(ScrollLayer::weight), layers.get(*b).map(ScrollLayer::weight)));
        if log::log_enabled!(log::Level::Trace) {
            let names: Vec<_> = self.layers().map(|(_, l)| format!("{}={:.3}", l.name(), l.weight())).collect();
            log::trace!("Layer order: [{}]", names.join(", "));
        }
    }

    // --- frame ---

    /// Distribute the pending scroll to every enabled layer
    ///
    /// Does nothing for an inert duplicate manager or when no camera is
    /// assigned; the pending scroll is kept in that case.
    pub fn tick(&mut self) {
        if !self.registration.is_authoritative() {
            if !self.duplicate_reported {
                log::error!("There can only be one parallax manager per scene; tick ignored");
                self.duplicate_reported = true;
            }
            return;
        }
        self.duplicate_reported = false;

        let Some(camera) = self.camera.as_ref() else {
            log::trace!("Parallax tick skipped: no camera");
            return;
        };

        self.viewport = self.viewport_mode.resolve(camera);
        let view_key = ViewKey::new(camera, self.viewport);
        let view_changed = self.view_key != Some(view_key);

        if self.auto_refresh_geometry || self.design_time || view_changed {
            if view_changed {
                log::trace!(
                    "Camera view changed ({}x{}, aspect {:.3}), regenerating billboards",
                    self.viewport.width,
                    self.viewport.height,
                    self.viewport.aspect()
                );
            }
            self.refresh_all_billboard_geometry();
        }

        let scroll = self.scroll_axes.constrain(self.pending_scroll);
        if scroll != Vec2::zeros() {
            self.distribute(scroll);
        }
        self.pending_scroll = Vec2::zeros();
    }

    fn distribute(&mut self, scroll: Vec2) {
        let Some(camera) = self.camera.as_ref() else {
            return;
        };
        let (right, up) = (camera.right(), camera.up());

        for id in &self.order {
            let Some(layer) = self.layers.get_mut(*id) else {
                continue;
            };
            if !layer.is_enabled() {
                continue;
            }
            let step = scroll * layer_factor(self.base_speed, layer.scroll_speed(), layer.scroll_mod());

            match layer.object_pixel_space() {
                Some(pixel_space) => {
                    let unit = if pixel_space {
                        match camera.pixel_world_size(camera.depth_of(&layer.position())) {
                            Ok(size) => size,
                            Err(e) => {
                                log::warn!("Layer '{}': {}; scroll skipped", layer.name(), e);
                                continue;
                            }
                        }
                    } else {
                        1.0
                    };
                    layer.translate(&object_translation(step * unit, &right, &up));
                }
                None => layer.scroll_uv(step),
            }
        }
    }

    /// Close the frame: run deferred layer activations
    ///
    /// Call once per frame after rendering.
    pub fn end_frame(&mut self) {
        let due = self.scheduler.end_frame();
        if due.is_empty() {
            return;
        }
        for task in due {
            match task {
                FrameTask::ActivateLayer(id) => self.activate_layer(id),
            }
        }
        self.refresh_layers();
    }

    fn activate_layer(&mut self, id: LayerId) {
        let view = self.view();
        let Some(layer) = self.layers.get_mut(id) else {
            return;
        };
        let flags = layer.refresh_on_attach();
        if layer.mode() == LayerMode::AutoBillboard && !flags.is_empty() {
            layer.apply_refresh(flags, view.as_ref().map(|(c, v)| (c, *v)));
        }
        log::debug!("Activated layer '{}'", layer.name());
    }

    /// Camera and effective viewport, if a camera is assigned
    fn view(&self) -> Option<(Camera, Viewport)> {
        self.camera
            .as_ref()
            .map(|camera| (camera.clone(), self.viewport_mode.resolve(camera)))
    }

    // --- queries and maintenance ---

    /// Vector `scroll` would apply to a layer, without applying it
    ///
    /// The input is axis-constrained and scaled exactly as the tick scales it.
    /// Object layers get their world translation (scaled to pixels for
    /// pixel-space layers); other layers get their texture offset delta.
    ///
    /// # Errors
    /// Returns [`ParallaxError::UnknownLayer`] for a stale handle and
    /// [`ParallaxError::MissingCamera`] for object layers without a camera.
    pub fn raw_scroll_vector(&self, id: LayerId, scroll: Vec2) -> Result<RawScroll, ParallaxError> {
        let layer = self.layers.get(id).ok_or(ParallaxError::UnknownLayer(id))?;
        let step = self.scroll_axes.constrain(scroll)
            * layer_factor(self.base_speed, layer.scroll_speed(), layer.scroll_mod());

        match layer.object_pixel_space() {
            Some(pixel_space) => {
                let camera = self.camera.as_ref().ok_or(ParallaxError::MissingCamera)?;
                let unit = if pixel_space {
                    camera.pixel_world_size(camera.depth_of(&layer.position()))?
                } else {
                    1.0
                };
                Ok(RawScroll::World(object_translation(step * unit, &camera.right(), &camera.up())))
            }
            None => Ok(RawScroll::Uv(step)),
        }
    }

    /// Reset every object layer to its last known position, or to `position`
    pub fn reset_all_object_layers(&mut self, position: Option<Vec3>) {
        let moved = self
            .layers
            .values_mut()
            .map(|layer| layer.reset_position(position))
            .filter(|moved| *moved)
            .count();
        log::debug!("Reset {} object layers", moved);
    }

    /// Regenerate the vertices of every auto-billboard layer
    ///
    /// Materials and textures are left alone. No-op without a camera.
    pub fn refresh_all_billboard_geometry(&mut self) {
        let Some((camera, viewport)) = self.view() else {
            log::debug!("Billboard refresh skipped: no camera");
            return;
        };
        self.viewport = viewport;
        self.view_key = Some(ViewKey::new(&camera, viewport));

        for id in &self.order {
            if let Some(layer) = self.layers.get_mut(*id) {
                if layer.mode() == LayerMode::AutoBillboard {
                    layer.apply_refresh(RefreshFlags::VERTICES, Some((&camera, viewport)));
                }
            }
        }
    }

    /// Refresh the flagged billboard parts of one layer now
    ///
    /// No-op for layers that are not auto-billboards.
    ///
    /// # Errors
    /// Returns [`ParallaxError::UnknownLayer`] for a stale handle.
    pub fn refresh_billboard(&mut self, id: LayerId, flags: RefreshFlags) -> Result<(), ParallaxError> {
        let mut layer = self.layer_mut(id).ok_or(ParallaxError::UnknownLayer(id))?;
        layer.request_refresh(flags);
        Ok(())
    }

    fn commit_layer(&mut self, id: LayerId) {
        let view = self.view();
        let Some(layer) = self.layers.get_mut(id) else {
            return;
        };
        let pending = layer.take_pending();
        if !pending.refresh.is_empty() {
            layer.apply_refresh(pending.refresh, view.as_ref().map(|(c, v)| (c, *v)));
        }
        if pending.refresh_layers {
            self.refresh_layers();
        } else if pending.resort {
            self.sort_layers();
        }
    }
}

/// Mutable layer access that commits changes on drop
///
/// Dereferences to [`ScrollLayer`]. When dropped, the manager regenerates the
/// layer's billboard if its geometry inputs changed and re-sorts or refreshes
/// the layer list if the weight or auto-configuration changed.
pub struct LayerMut<'a> {
    manager: &'a mut ParallaxManager,
    id: LayerId,
}

impl LayerMut<'_> {
    /// Handle of the borrowed layer
    pub const fn id(&self) -> LayerId {
        self.id
    }
}

impl Deref for LayerMut<'_> {
    type Target = ScrollLayer;

    fn deref(&self) -> &ScrollLayer {
        &self.manager.layers[self.id]
    }
}

impl DerefMut for LayerMut<'_> {
    fn deref_mut(&mut self) -> &mut ScrollLayer {
        &mut self.manager.layers[self.id]
    }
}

impl Drop for LayerMut<'_> {
    fn drop(&mut self) {
        self.manager.commit_layer(self.id);
    }
}

impl std::fmt::Debug for LayerMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerMut").field("id", &self.id).finish_non_exhaustive()
    }
}
