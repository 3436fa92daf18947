//! Auto-billboard geometry generation
//!
//! Builds a camera-facing quad for a layer from the camera projection, the
//! effective viewport, the bound texture and the layer's billboard settings.
//! All sizes are derived through the inverse projection at the layer's depth,
//! so a pixel-perfect quad covers exactly `texture + pixel_offset` screen
//! pixels.
//!
//! Generation is pure. Callers decide when to regenerate; nothing here caches.

use crate::error::ParallaxError;
use crate::foundation::math::{Mat4, Point3, Transform, Vec2, Vec3};
use crate::render::camera::{unproject, Camera, Viewport};
use crate::render::mesh::{Mesh, Vertex};
use crate::render::texture::Texture;

use super::types::{BillboardGeometry, BillboardSettings, Sizing};

/// Triangle list of the generated quad, clockwise as seen from the camera
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Everything the generator reads
#[derive(Debug, Clone, Copy)]
pub struct BillboardInput<'a> {
    /// Projection source
    pub camera: &'a Camera,
    /// Effective viewport in pixels
    pub viewport: Viewport,
    /// World transform of the layer that owns the quad
    pub transform: &'a Transform,
    /// Bound texture, if any
    pub texture: Option<&'a Texture>,
    /// Layer geometry settings
    pub settings: &'a BillboardSettings,
}

/// Projection data at a fixed depth
struct DepthFrame {
    inverse: Mat4,
    ndc_z: f32,
    origin: Vec3,
}

impl DepthFrame {
    fn new(camera: &Camera, aspect: f32, depth: f32) -> Result<Self, ParallaxError> {
        let inverse = camera.inverse_projection_with_aspect(aspect)?;
        let ndc_z = camera.ndc_depth(depth, aspect);
        let origin = unproject(&inverse, Vec3::new(0.0, 0.0, ndc_z));
        Ok(Self { inverse, ndc_z, origin })
    }

    /// Camera-space extent of an NDC offset from the view axis
    fn extent(&self, ndc_x: f32, ndc_y: f32) -> Vec2 {
        let p = unproject(&self.inverse, Vec3::new(ndc_x, ndc_y, self.ndc_z));
        Vec2::new((p.x - self.origin.x).abs(), (p.y - self.origin.y).abs())
    }
}

/// Compute the quad corners and UVs for a layer
///
/// # Errors
/// Returns [`ParallaxError::SingularProjection`] when the camera projection or
/// the viewport is degenerate.
pub fn generate_billboard(input: &BillboardInput<'_>) -> Result<BillboardGeometry, ParallaxError> {
    let BillboardInput {
        camera,
        viewport,
        transform,
        texture,
        settings,
    } = *input;

    if !viewport.is_valid() || camera.pixel_height == 0 {
        return Err(ParallaxError::SingularProjection);
    }

    let texture = texture.filter(|t| !t.is_empty());
    let aspect = viewport.aspect();
    let depth = camera.depth_of(&transform.position);
    let frame = DepthFrame::new(camera, aspect, depth)?;

    let half_view = frame.extent(1.0, 1.0);
    // World size of one effective-viewport pixel; offsets and texels share it
    let pixel_scale = 2.0 * half_view.y / viewport.height;

    let center = settings.offset * pixel_scale + settings.alignment.anchor(half_view);

    let sizing = settings.sizing(texture.is_some());
    let mut tiles = Vec2::new(1.0, 1.0);
    let half_extents = match (sizing, texture) {
        (Sizing::PixelPerfect, Some(texture)) => {
            let (w, h) = texture.size();
            let w = w + settings.pixel_offset.x;
            let h = h + settings.pixel_offset.y;
            let texel_half_h = frame.extent(w / viewport.width, h / viewport.height).y;
            let texel_half = if h.abs() <= f32::EPSILON {
                Vec2::new(0.0, texel_half_h)
            } else {
                Vec2::new(texel_half_h * w / h, texel_half_h)
            };

            let mut half = texel_half;
            if settings.tile_x {
                half.x = half_view.x;
                tiles.x = ratio(half_view.x, texel_half.x);
            }
            if settings.tile_y {
                half.y = half_view.y;
                tiles.y = ratio(half_view.y, texel_half.y);
            }
            half
        }
        (Sizing::Stretch, _) => half_view,
        _ => settings.billboard_scale.abs() * 0.5,
    };

    let to_world = camera.camera_to_world();
    let corner = |sx: f32, sy: f32| {
        let local = Point3::new(
            center.x + sx * half_extents.x,
            center.y + sy * half_extents.y,
            -depth,
        );
        to_world.transform_point(&local).coords
    };
    let corners = [
        corner(-1.0, 1.0),
        corner(1.0, 1.0),
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
    ];

    let uvs = quad_uvs(sizing, tiles, settings.padding);

    log::trace!(
        "Billboard generated - sizing: {:?}, depth: {:.3}, half extents: ({:.4}, {:.4}), pixel scale: {:.6}",
        sizing,
        depth,
        half_extents.x,
        half_extents.y,
        pixel_scale
    );

    Ok(BillboardGeometry {
        corners,
        uvs,
        half_extents,
        center,
        depth,
        pixel_scale,
        sizing,
    })
}

fn ratio(a: f32, b: f32) -> f32 {
    if b.abs() <= f32::EPSILON {
        1.0
    } else {
        a / b
    }
}

/// UVs for the corners in top-left, top-right, bottom-left, bottom-right order
///
/// Stretched quads map the texture once over `[-1 - padding, padding]`
/// horizontally and `[-padding, 1 - padding]` vertically. Other quads repeat it
/// `tiles` times, with the padding insetting the range on each axis.
fn quad_uvs(sizing: Sizing, tiles: Vec2, padding: Vec2) -> [Vec2; 4] {
    let (left, right, bottom, top) = if sizing == Sizing::Stretch {
        (-1.0 - padding.x, padding.x, -padding.y, 1.0 - padding.y)
    } else {
        (-tiles.x - padding.x, padding.x, -tiles.y - padding.y, padding.y)
    };
    [
        Vec2::new(left, top),
        Vec2::new(right, top),
        Vec2::new(left, bottom),
        Vec2::new(right, bottom),
    ]
}

/// Build the layer-local quad mesh for generated geometry
///
/// Vertices are expressed in the layer's local space so the host can render
/// the mesh with the layer transform.
pub fn build_mesh(geometry: &BillboardGeometry, transform: &Transform, settings: &BillboardSettings) -> Mesh {
    let vertices = geometry
        .corners
        .iter()
        .zip(geometry.uvs)
        .map(|(corner, uv)| Vertex::new(transform.inverse_transform_point(corner), uv))
        .collect();

    let mut mesh = Mesh::new(vertices, QUAD_INDICES.to_vec());
    if settings.calculate_normals {
        mesh.compute_normals();
        if settings.calculate_tangents {
            mesh.compute_tangents();
        }
    }
    mesh.optimize();
    mesh
}
