//! Headless parallax demo
//!
//! Runs a fixed number of frames through the host loop
//! (`scroll -> tick -> render -> end_frame`) and logs what each layer did.
//! The scene comes from `config/scene.ron` unless another file is passed as
//! the first argument.
//!
//! Frames are split into phases that each drive the manager differently:
//! a constant scroll, a scroll that follows a moving player, and a base-speed
//! sweep. A planet layer is rotated with the raw scroll vector instead of
//! being scrolled, and the cloud layer bobs up and down.

use std::f32::consts::TAU;

use nalgebra::Vector3;
use rand::prelude::*;

use parallax_engine::foundation::logging;
use parallax_engine::foundation::math::Quat;
use parallax_engine::prelude::*;
use parallax_engine::render::material::MAIN_TEXTURE_SLOT;

const DEFAULT_SCENE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/scene.ron");
const FRAMES: u32 = 720;
const DT: f32 = 1.0 / 60.0;

// Degrees per second fed to the planet's raw scroll
const PLANET_ROTATION_SPEED: f32 = 1000.0;
const CLOUD_BOB_SCALE: f32 = 0.0005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ConstantScroll,
    FollowPlayer,
    SpeedSweep,
}

impl Phase {
    const fn at(frame: u32) -> Self {
        match frame * 3 / FRAMES {
            0 => Self::ConstantScroll,
            1 => Self::FollowPlayer,
            _ => Self::SpeedSweep,
        }
    }
}

struct DemoApp {
    // Keeps the manager authoritative; dropping it would make the manager inert
    _scene: SceneContext,
    manager: ParallaxManager,
    planet: LayerId,
    planet_rotation: Quat,
    clouds: Option<LayerId>,
    cloud_phase: f32,
    player_position: Vec3,
    previous_player_position: Vec3,
    time: f32,
}

impl DemoApp {
    fn new(config: &ParallaxConfig) -> Result<Self, ParallaxError> {
        let scene = SceneContext::new();
        let mut manager = ParallaxManager::from_config(&scene, config)?;

        let planet_material = Material::parallax_default().with_name("Planet");
        let mut planet_layer = ScrollLayer::manual_uv_mesh("planet", Box::new(planet_material))
            .with_position(Vec3::new(3.0, 2.0, -30.0));
        // Rotated from the raw scroll vector; scrolling UVs on a sphere smears the poles
        planet_layer.set_texture_names(vec![String::new()]);
        let planet = manager.attach(planet_layer);
        let clouds = manager.find_layer("clouds");

        let mut rng = thread_rng();
        Ok(Self {
            _scene: scene,
            manager,
            planet,
            planet_rotation: Quat::identity(),
            clouds,
            cloud_phase: rng.gen_range(0.0..TAU),
            player_position: Vec3::zeros(),
            previous_player_position: Vec3::zeros(),
            time: 0.0,
        })
    }

    fn run(&mut self) -> Result<(), ParallaxError> {
        for frame in 0..FRAMES {
            self.time += DT;
            let phase = Phase::at(frame);

            self.update_input(phase);
            self.manager.tick();
            self.rotate_planet()?;
            self.bob_clouds();
            // A real host renders here
            self.manager.end_frame();

            if frame % 120 == 0 {
                self.report(frame, phase);
            }
        }
        self.report(FRAMES, Phase::at(FRAMES - 1));
        Ok(())
    }

    fn update_input(&mut self, phase: Phase) {
        match phase {
            Phase::ConstantScroll => self.manager.scroll_vec(Vec2::new(1.0, 1.0) * DT),
            Phase::FollowPlayer => {
                self.player_position.x += 2.0 * DT;
                self.player_position.y = (self.time * 2.0).sin() * 0.5;
                let delta = self.player_position - self.previous_player_position;
                self.manager.scroll(delta.x, delta.y);
                self.previous_player_position = self.player_position;
            }
            Phase::SpeedSweep => {
                self.manager.set_base_speed((self.time * 0.5).sin() * 10.0);
                self.manager.scroll(DT, 0.0);
            }
        }
    }

    fn rotate_planet(&mut self) -> Result<(), ParallaxError> {
        let raw = self
            .manager
            .raw_scroll_vector(self.planet, Vec2::new(PLANET_ROTATION_SPEED * DT, 0.0))?;
        let degrees = raw.as_vec2().x;
        self.planet_rotation =
            Quat::from_axis_angle(&Vector3::y_axis(), degrees.to_radians()) * self.planet_rotation;

        if let Some(mut planet) = self.manager.layer_mut(self.planet) {
            let mut transform = planet.transform().clone();
            transform.rotation = self.planet_rotation;
            planet.set_transform(transform);
        }
        Ok(())
    }

    fn bob_clouds(&mut self) {
        let Some(clouds) = self.clouds else {
            return;
        };
        let lift = (self.time + self.cloud_phase).sin() * CLOUD_BOB_SCALE;
        if let Some(mut layer) = self.manager.layer_mut(clouds) {
            let position = layer.position() + Vec3::y() * lift;
            layer.set_position(position);
        }
    }

    fn report(&self, frame: u32, phase: Phase) {
        log::info!(
            "Frame {} ({:?}) - base speed {:.2}, viewport {}x{}",
            frame,
            phase,
            self.manager.base_speed(),
            self.manager.viewport().width,
            self.manager.viewport().height
        );
        for (_, layer) in self.manager.layers() {
            match layer.mode() {
                LayerMode::ObjectLayer => log::info!(
                    "  {:<10} weight {:>7.3} position ({:.3}, {:.3}, {:.3})",
                    layer.name(),
                    layer.weight(),
                    layer.position().x,
                    layer.position().y,
                    layer.position().z
                ),
                LayerMode::AutoBillboard | LayerMode::ManualUvMesh => {
                    let offset = layer
                        .material()
                        .and_then(|m| m.texture_offset(MAIN_TEXTURE_SLOT))
                        .unwrap_or_else(Vec2::zeros);
                    let size = layer.geometry().map_or_else(Vec2::zeros, |g| g.world_size());
                    log::info!(
                        "  {:<10} weight {:>7.3} offset ({:.3}, {:.3}) quad {:.2}x{:.2}",
                        layer.name(),
                        layer.weight(),
                        offset.x,
                        offset.y,
                        size.x,
                        size.y
                    );
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SCENE.to_string());
    let config = ParallaxConfig::load_from_file(&path)?;

    logging::init_with_level(&config.manager.log_level);
    log::info!("Starting parallax demo with scene {}", path);

    let mut app = DemoApp::new(&config)?;
    log::info!(
        "{} layers attached, planet rotation speed {}",
        app.manager.len(),
        PLANET_ROTATION_SPEED
    );

    match app.run() {
        Ok(()) => {
            log::info!("Parallax demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Parallax demo failed: {}", e);
            Err(e.into())
        }
    }
}
