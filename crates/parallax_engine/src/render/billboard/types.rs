//! Billboard data structures and types

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec2, Vec3};

/// Screen anchor a billboard is aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alignment {
    /// Top-left corner
    TopLeft,
    /// Top edge
    Top,
    /// Top-right corner
    TopRight,
    /// Left edge
    Left,
    /// Viewport center
    #[default]
    Center,
    /// Right edge
    Right,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom edge
    Bottom,
    /// Bottom-right corner
    BottomRight,
}

impl Alignment {
    /// All anchors, row by row from the top
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Left,
        Self::Center,
        Self::Right,
        Self::BottomLeft,
        Self::Bottom,
        Self::BottomRight,
    ];

    /// Horizontal and vertical sign of the anchor: -1, 0 or 1 per axis
    pub const fn direction(self) -> (i8, i8) {
        match self {
            Self::TopLeft => (-1, 1),
            Self::Top => (0, 1),
            Self::TopRight => (1, 1),
            Self::Left => (-1, 0),
            Self::Center => (0, 0),
            Self::Right => (1, 0),
            Self::BottomLeft => (-1, -1),
            Self::Bottom => (0, -1),
            Self::BottomRight => (1, -1),
        }
    }

    /// Camera-plane position of the anchor for a view of the given half size
    ///
    /// The billboard center is placed on this point.
    pub fn anchor(self, half_view: Vec2) -> Vec2 {
        let (x, y) = self.direction();
        Vec2::new(f32::from(x) * half_view.x, f32::from(y) * half_view.y)
    }
}

/// Geometry configuration of an auto-billboard layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillboardSettings {
    /// Screen anchor
    pub alignment: Alignment,

    /// Position correction in screen pixels, positive right and up
    pub offset: Vec2,

    /// Added to the texture pixel size before sizing (seam compensation)
    pub pixel_offset: Vec2,

    /// UV inset hiding texture-bleed seams
    pub padding: Vec2,

    /// Repeat the texture horizontally in pixel-perfect mode
    pub tile_x: bool,

    /// Repeat the texture vertically in pixel-perfect mode
    pub tile_y: bool,

    /// One texel maps to one screen pixel
    pub pixel_perfect: bool,

    /// Fill the viewport exactly; wins over `pixel_perfect`
    pub stretch: bool,

    /// Quad size in world units when neither stretch nor pixel-perfect applies
    pub billboard_scale: Vec2,

    /// Generate vertex normals
    pub calculate_normals: bool,

    /// Generate vertex tangents (implies normals)
    pub calculate_tangents: bool,
}

impl Default for BillboardSettings {
    fn default() -> Self {
        Self {
            alignment: Alignment::Center,
            offset: Vec2::zeros(),
            pixel_offset: Vec2::zeros(),
            padding: Vec2::zeros(),
            tile_x: true,
            tile_y: true,
            pixel_perfect: true,
            stretch: false,
            billboard_scale: Vec2::new(10.0, 10.0),
            calculate_normals: false,
            calculate_tangents: false,
        }
    }
}

impl BillboardSettings {
    /// Sizing mode the generator will use with or without a texture
    pub const fn sizing(&self, has_texture: bool) -> Sizing {
        if self.stretch {
            Sizing::Stretch
        } else if self.pixel_perfect && has_texture {
            Sizing::PixelPerfect
        } else {
            Sizing::Scaled
        }
    }
}

/// How a billboard's extents are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Fills the viewport
    Stretch,
    /// One texel per screen pixel
    PixelPerfect,
    /// Uses the manual billboard scale
    Scaled,
}

/// Result of one billboard generation pass
#[derive(Debug, Clone, PartialEq)]
pub struct BillboardGeometry {
    /// World-space corners: top-left, top-right, bottom-left, bottom-right
    pub corners: [Vec3; 4],

    /// UVs in the same corner order
    pub uvs: [Vec2; 4],

    /// Half width and half height in world units
    pub half_extents: Vec2,

    /// Center of the quad on the camera plane, relative to the view axis
    pub center: Vec2,

    /// Distance from the camera along the view axis
    pub depth: f32,

    /// World size of one screen pixel at `depth`
    pub pixel_scale: f32,

    /// Sizing mode that produced the quad
    pub sizing: Sizing,
}

impl BillboardGeometry {
    /// Top-left corner
    pub const fn top_left(&self) -> Vec3 {
        self.corners[0]
    }

    /// Top-right corner
    pub const fn top_right(&self) -> Vec3 {
        self.corners[1]
    }

    /// Bottom-left corner
    pub const fn bottom_left(&self) -> Vec3 {
        self.corners[2]
    }

    /// Bottom-right corner
    pub const fn bottom_right(&self) -> Vec3 {
        self.corners[3]
    }

    /// World-space width and height
    pub fn world_size(&self) -> Vec2 {
        self.half_extents * 2.0
    }
}
