//! Frame-loop scenarios
//!
//! Each test runs the host sequence `scroll -> tick -> end_frame` against an
//! orthographic camera ten units from the layers (half-height 5, 1280x720),
//! so one pixel at depth 10 is `10 / 720` world units.

use approx::assert_relative_eq;

use crate::config::{CameraSettings, LayerDescriptor, ManagerSettings, ParallaxConfig, TextureDescriptor};
use crate::error::ParallaxError;
use crate::foundation::collections::LayerId;
use crate::foundation::math::utils::wrapped_distance;
use crate::foundation::math::{Vec2, Vec3};
use crate::parallax::{LayerMode, ParallaxManager, RawScroll, SceneContext, ScrollAxes, ScrollLayer, ViewportMode};
use crate::render::billboard::BillboardSettings;
use crate::render::camera::{Camera, Viewport};
use crate::render::material::{Material, MAIN_TEXTURE_SLOT};
use crate::render::texture::Texture;

const PIXEL: f32 = 10.0 / 720.0;

fn scene_camera() -> Camera {
    Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 1280, 720)
}

fn manager_with_camera(scene: &SceneContext) -> ParallaxManager {
    let mut manager = ParallaxManager::new(scene);
    manager.set_camera(scene_camera());
    manager
}

fn untiled() -> BillboardSettings {
    BillboardSettings {
        tile_x: false,
        tile_y: false,
        ..Default::default()
    }
}

fn main_offset(manager: &ParallaxManager, id: LayerId) -> Vec2 {
    manager
        .layer(id)
        .and_then(|layer| layer.material())
        .and_then(|material| material.texture_offset(MAIN_TEXTURE_SLOT))
        .unwrap()
}

fn names(manager: &ParallaxManager) -> Vec<&str> {
    manager.layers().map(|(_, layer)| layer.name()).collect()
}

#[test]
fn test_basic_uv_scroll_wraps() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(
        ScrollLayer::new("bg")
            .with_weight(1.0)
            .with_texture(Texture::new("bg", 256, 256)),
    );
    manager.end_frame();

    manager.scroll(10.0, 0.0);
    manager.tick();

    let offset = main_offset(&manager, id);
    assert!(wrapped_distance(offset.x, 0.0) < 1e-3, "offset {offset:?}");
    assert_eq!(offset.y, 0.0);
    assert_eq!(manager.pending_scroll(), Vec2::zeros());
}

#[test]
fn test_lighter_layers_scroll_faster() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let near = manager.attach(ScrollLayer::new("near").with_weight(2.0));
    let far = manager.attach(ScrollLayer::new("far").with_weight(8.0));
    manager.end_frame();

    manager.scroll(0.5, 0.0);
    manager.tick();

    assert_relative_eq!(main_offset(&manager, near).x, 0.25, epsilon = 1e-4);
    assert_relative_eq!(main_offset(&manager, far).x, 0.0625, epsilon = 1e-4);
}

#[test]
fn test_scroll_axes_constraint() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let start = Vec3::new(1.0, 2.0, 0.0);
    let id = manager.attach(ScrollLayer::new("bg").with_weight(1.0));
    let pixels = manager.attach(ScrollLayer::object_layer("props", true).with_weight(1.0).with_position(start));
    let world = manager.attach(ScrollLayer::object_layer("rocks", false).with_weight(1.0).with_position(start));
    manager.end_frame();

    assert_eq!(manager.scroll_constraints(), ScrollAxes::X);
    for dy in [0.25, -3.0, 40.0] {
        manager.scroll(0.0, dy);
        manager.tick();
    }
    assert_eq!(main_offset(&manager, id), Vec2::zeros());
    for object in [pixels, world] {
        assert_eq!(manager.layer(object).unwrap().position().y, start.y);
    }

    manager.scroll(2.0, 5.0);
    manager.tick();
    for object in [pixels, world] {
        let position = manager.layer(object).unwrap().position();
        assert_eq!(position.y, start.y);
        assert!(position.x < start.x);
    }

    manager.set_scroll_constraints(ScrollAxes::Y);
    manager.scroll(0.3, 0.25);
    manager.tick();
    let offset = main_offset(&manager, id);
    assert_eq!(offset.x, 0.0);
    assert_relative_eq!(offset.y, 0.25, epsilon = 1e-4);
    let moved = manager.layer(world).unwrap().position();
    assert_relative_eq!(moved.y, start.y - 0.25, epsilon = 1e-4);
}

#[test]
fn test_base_speed_and_scroll_mod() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let mut layer = ScrollLayer::new("bg").with_weight(1.0);
    layer.set_scroll_mod(0.5);
    let id = manager.attach(layer);
    manager.end_frame();

    manager.set_base_speed(0.4);
    manager.scroll(1.0, 0.0);
    manager.tick();
    assert_relative_eq!(main_offset(&manager, id).x, 0.2, epsilon = 1e-4);
}

#[test]
fn test_object_layer_pixel_space_translation() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let pixels = manager.attach(ScrollLayer::object_layer("props", true).with_weight(1.0));
    let world = manager.attach(ScrollLayer::object_layer("rocks", false).with_weight(1.0));
    manager.end_frame();

    manager.scroll(3.0, 0.0);
    manager.tick();

    let moved = manager.layer(pixels).unwrap().position();
    assert_relative_eq!(moved.x, -3.0 * PIXEL, epsilon = 1e-5);
    assert_relative_eq!(moved.y, 0.0);
    assert_relative_eq!(manager.layer(world).unwrap().position().x, -3.0, epsilon = 1e-4);
}

#[test]
fn test_raw_scroll_matches_tick() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    manager.set_scroll_constraints(ScrollAxes::XY);
    let object = manager.attach(
        ScrollLayer::object_layer("props", true)
            .with_weight(2.0)
            .with_position(Vec3::new(1.0, 1.0, 0.0)),
    );
    let uv = manager.attach(ScrollLayer::new("bg").with_weight(4.0));
    manager.end_frame();

    let input = Vec2::new(2.0, -1.0);
    let raw = manager.raw_scroll_vector(object, input).unwrap();
    let RawScroll::World(expected) = raw else {
        panic!("object layers report world vectors, got {raw:?}");
    };
    match manager.raw_scroll_vector(uv, input).unwrap() {
        RawScroll::Uv(step) => assert_relative_eq!(step, input * 0.25, epsilon = 1e-5),
        other => panic!("uv layers report uv deltas, got {other:?}"),
    }

    manager.scroll_vec(input);
    manager.tick();
    let moved = manager.layer(object).unwrap().position() - Vec3::new(1.0, 1.0, 0.0);
    assert_relative_eq!(moved, expected, epsilon = 1e-6);

    let detached = manager.detach(uv).unwrap();
    assert_eq!(detached.name(), "bg");
    assert!(matches!(
        manager.raw_scroll_vector(uv, input),
        Err(ParallaxError::UnknownLayer(_))
    ));
}

#[test]
fn test_raw_scroll_object_layer_needs_camera() {
    let scene = SceneContext::new();
    let mut manager = ParallaxManager::new(&scene);
    let id = manager.attach(ScrollLayer::object_layer("props", false));
    assert!(matches!(
        manager.raw_scroll_vector(id, Vec2::new(1.0, 0.0)),
        Err(ParallaxError::MissingCamera)
    ));
}

#[test]
fn test_duplicate_manager_is_inert() {
    let scene = SceneContext::new();
    let first = ParallaxManager::new(&scene);
    let mut second = manager_with_camera(&scene);
    assert!(first.is_authoritative());
    assert!(!second.is_authoritative());

    let id = second.attach(ScrollLayer::new("bg").with_weight(1.0));
    second.end_frame();
    second.scroll(0.5, 0.0);
    second.tick();
    second.tick();
    assert_eq!(main_offset(&second, id), Vec2::zeros());

    drop(first);
    assert!(second.is_authoritative());
    second.tick();
    assert_relative_eq!(main_offset(&second, id).x, 0.5, epsilon = 1e-4);
}

#[test]
fn test_equal_weights_keep_attach_order() {
    let scene = SceneContext::new();
    let mut manager = ParallaxManager::new(&scene);
    for (name, weight) in [("a", 2.0), ("b", 1.0), ("c", 1.0), ("d", 2.0)] {
        manager.attach(ScrollLayer::new(name).with_weight(weight));
    }
    assert_eq!(names(&manager), ["b", "c", "a", "d"]);
    assert_eq!(manager.layer_at(0).map(ScrollLayer::name), Some("b"));
}

#[test]
fn test_auto_weights_follow_camera_distance() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let far = manager.attach(ScrollLayer::new("far").with_position(Vec3::new(0.0, 0.0, -10.0)));
    manager.attach(ScrollLayer::new("near").with_position(Vec3::new(0.0, 0.0, 5.0)));
    manager.attach(ScrollLayer::new("mid"));

    assert_eq!(names(&manager), ["near", "mid", "far"]);
    let far = manager.layer(far).unwrap();
    assert_relative_eq!(far.weight(), 20.0, epsilon = 1e-5);
    assert_relative_eq!(far.scroll_speed(), 0.05, epsilon = 1e-5);
}

#[test]
fn test_layer_mut_commits_weight_change() {
    let scene = SceneContext::new();
    let mut manager = ParallaxManager::new(&scene);
    let a = manager.attach(ScrollLayer::new("a").with_weight(1.0));
    manager.attach(ScrollLayer::new("b").with_weight(2.0));
    assert_eq!(names(&manager), ["a", "b"]);

    manager.layer_mut(a).unwrap().set_weight(3.0);
    assert_eq!(names(&manager), ["b", "a"]);
}

#[test]
fn test_activation_is_deferred_to_end_of_frame() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(ScrollLayer::new("bg").with_texture(Texture::new("bg", 256, 128)));
    assert!(manager.layer(id).unwrap().mesh().is_none());

    let bound = manager
        .layer(id)
        .and_then(ScrollLayer::billboard)
        .map(|b| b.material().texture(MAIN_TEXTURE_SLOT).is_some());
    assert_eq!(bound, Some(false));

    manager.tick();
    assert!(manager.layer(id).unwrap().mesh().is_none());

    manager.end_frame();
    let layer = manager.layer(id).unwrap();
    assert!(layer.mesh().is_some());
    let texture = layer.billboard().and_then(|b| b.material().texture(MAIN_TEXTURE_SLOT));
    assert_eq!(texture.map(|t| t.width), Some(256));

    // Tasks are single-shot
    manager.layer_mut(id).unwrap().set_name("renamed");
    manager.end_frame();
    assert_eq!(manager.layer(id).unwrap().name(), "renamed");
}

#[test]
fn test_detached_layer_is_not_activated() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(ScrollLayer::new("bg"));
    let layer = manager.detach(id).unwrap();
    manager.end_frame();

    assert!(layer.mesh().is_none());
    assert!(manager.is_empty());
    assert!(manager.detach(id).is_none());
}

#[test]
fn test_pixel_perfect_billboard_size() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(
        ScrollLayer::new("bg")
            .with_billboard(untiled())
            .with_texture(Texture::new("bg", 256, 128)),
    );
    manager.end_frame();

    let size = manager.layer(id).and_then(ScrollLayer::geometry).unwrap().world_size();
    assert_relative_eq!(size, Vec2::new(256.0, 128.0) * PIXEL, epsilon = 1e-4);
}

#[test]
fn test_layer_mut_regenerates_geometry() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(
        ScrollLayer::new("bg")
            .with_billboard(untiled())
            .with_texture(Texture::new("bg", 256, 128)),
    );
    manager.end_frame();

    manager
        .layer_mut(id)
        .unwrap()
        .set_texture(Some(Texture::new("wide", 512, 256)));

    let layer = manager.layer(id).unwrap();
    let size = layer.geometry().unwrap().world_size();
    assert_relative_eq!(size, Vec2::new(512.0, 256.0) * PIXEL, epsilon = 1e-4);
    let bound = layer.billboard().and_then(|b| b.material().texture(MAIN_TEXTURE_SLOT));
    assert_eq!(bound.map(|t| t.name.as_str()), Some("wide"));
}

#[test]
fn test_camera_resize_regenerates_geometry() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(
        ScrollLayer::new("bg")
            .with_billboard(untiled())
            .with_texture(Texture::new("bg", 128, 128)),
    );
    manager.end_frame();
    manager.tick();
    let before = manager.layer(id).and_then(ScrollLayer::geometry).unwrap().world_size();

    manager.camera_mut().unwrap().set_pixel_size(640, 360);
    manager.tick();

    let after = manager.layer(id).and_then(ScrollLayer::geometry).unwrap().world_size();
    assert_relative_eq!(after, before * 2.0, epsilon = 1e-4);
    assert_eq!(manager.viewport(), Viewport::new(640.0, 360.0));
}

#[test]
fn test_billboard_follows_camera_pose() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(ScrollLayer::new("bg").with_texture(Texture::new("bg", 256, 256)));
    manager.end_frame();
    manager.tick();
    let before = manager.layer(id).and_then(ScrollLayer::geometry).unwrap().top_left();

    manager.camera_mut().unwrap().position.x += 2.0;
    manager.tick();

    let after = manager.layer(id).and_then(ScrollLayer::geometry).unwrap().top_left();
    assert_relative_eq!(after - before, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-4);
}

#[test]
fn test_manual_viewport_drives_geometry() {
    let scene = SceneContext::new();
    let mut manager = ParallaxManager::new(&scene);
    manager.set_viewport_mode(ViewportMode::Manual {
        min: (640, 480),
        max: (1920, 1080),
    });
    manager.set_camera(Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 3000, 200));
    manager.tick();

    assert_eq!(manager.viewport(), Viewport::new(1920.0, 480.0));
}

#[test]
fn test_reset_object_layers() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let start = Vec3::new(1.0, 2.0, 0.0);
    let props = manager.attach(ScrollLayer::object_layer("props", false).with_weight(1.0).with_position(start));
    let bg = manager.attach(ScrollLayer::new("bg").with_weight(1.0));
    manager.end_frame();

    manager.scroll(4.0, 0.0);
    manager.tick();
    assert!((manager.layer(props).unwrap().position() - start).norm() > 1.0);

    manager.reset_all_object_layers(None);
    assert_relative_eq!(manager.layer(props).unwrap().position(), start);

    let target = Vec3::new(-3.0, 0.0, 1.0);
    manager.reset_all_object_layers(Some(target));
    let layer = manager.layer(props).unwrap();
    assert_relative_eq!(layer.position(), target);
    assert_relative_eq!(layer.last_known_position(), target);
    assert_relative_eq!(manager.layer(bg).unwrap().position(), Vec3::zeros());
}

#[test]
fn test_disabled_layer_ignores_scroll() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(ScrollLayer::new("bg").with_weight(1.0));
    manager.end_frame();

    manager.set_layer_enabled(id, false).unwrap();
    manager.scroll(0.5, 0.0);
    manager.tick();
    assert_eq!(main_offset(&manager, id), Vec2::zeros());
}

#[test]
fn test_manual_uv_mesh_scrolls_host_material() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let host = Material::parallax_default().with_slot("_DetailTex");
    let mut layer = ScrollLayer::manual_uv_mesh("host", Box::new(host)).with_weight(1.0);
    layer.set_texture_names(vec![MAIN_TEXTURE_SLOT.to_string(), "_DetailTex".to_string()]);
    let id = manager.attach(layer);
    manager.end_frame();

    manager.scroll(0.25, 0.0);
    manager.tick();

    let material = manager.layer(id).and_then(ScrollLayer::material).unwrap();
    assert_relative_eq!(material.texture_offset(MAIN_TEXTURE_SLOT).unwrap().x, 0.25, epsilon = 1e-4);
    assert_relative_eq!(material.texture_offset("_DetailTex").unwrap().x, 0.25, epsilon = 1e-4);
}

#[test]
fn test_manual_uv_mesh_without_slots_keeps_uvs() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let mut layer = ScrollLayer::manual_uv_mesh("planet", Box::new(Material::parallax_default())).with_weight(1.0);
    layer.set_texture_names(vec![String::new()]);
    let id = manager.attach(layer);
    manager.end_frame();

    manager.scroll(0.25, 0.0);
    manager.tick();
    assert_eq!(main_offset(&manager, id), Vec2::zeros());

    // Hosts still get a rotation input from the raw vector
    let raw = manager.raw_scroll_vector(id, Vec2::new(0.5, 0.0)).unwrap();
    assert_relative_eq!(raw.as_vec2().x, 0.5, epsilon = 1e-5);
}

#[test]
fn test_mode_switch_through_layer_mut() {
    let scene = SceneContext::new();
    let mut manager = manager_with_camera(&scene);
    let id = manager.attach(ScrollLayer::object_layer("props", false).with_texture(Texture::new("p", 64, 64)));
    manager.end_frame();
    assert!(manager.layer(id).unwrap().mesh().is_none());

    manager.layer_mut(id).unwrap().set_mode(LayerMode::AutoBillboard);
    assert!(manager.layer(id).unwrap().mesh().is_some());
}

#[test]
fn test_from_config_builds_scene() {
    let config = ParallaxConfig {
        manager: ManagerSettings {
            scroll_axes: ScrollAxes::XY,
            base_speed: 2.0,
            ..Default::default()
        },
        camera: Some(CameraSettings::default()),
        layers: vec![
            LayerDescriptor {
                name: "sky".into(),
                weight: 4.0,
                auto_configured: false,
                texture: Some(TextureDescriptor {
                    name: "sky".into(),
                    path: None,
                    width: 256,
                    height: 256,
                }),
                ..Default::default()
            },
            LayerDescriptor {
                name: "props".into(),
                mode: LayerMode::ObjectLayer,
                position: Vec3::new(0.0, 0.0, 8.0),
                ..Default::default()
            },
        ],
    };

    let scene = SceneContext::new();
    let mut manager = ParallaxManager::from_config(&scene, &config).unwrap();
    assert_eq!(names(&manager), ["props", "sky"]);
    assert_eq!(manager.base_speed(), 2.0);
    assert_eq!(manager.scroll_constraints(), ScrollAxes::XY);

    let props = manager.find_layer("props").unwrap();
    assert_relative_eq!(manager.layer(props).unwrap().weight(), 2.0, epsilon = 1e-5);

    manager.end_frame();
    let sky = manager.find_layer("sky").unwrap();
    assert!(manager.layer(sky).unwrap().mesh().is_some());
}

#[test]
fn test_from_config_rejects_invalid() {
    let config = ParallaxConfig {
        manager: ManagerSettings {
            viewport: ViewportMode::Manual {
                min: (800, 600),
                max: (640, 480),
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let scene = SceneContext::new();
    assert!(matches!(
        ParallaxManager::from_config(&scene, &config),
        Err(ParallaxError::Config(_))
    ));
    assert_eq!(scene.manager_count(), 0);
}
