//! Mesh representation for generated layer geometry
//!
//! Pure data: vertex and index arrays the host renderer uploads. Front faces
//! wind clockwise as seen by the viewer, so computed normals point towards
//! the camera that generated the quad.

// bytemuck's derives expand to `unsafe impl Pod`.
#![allow(unsafe_code)]

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec2, Vec3};

/// Vertex with position, normal, texture coordinate and tangent
///
/// `#[repr(C)]` with no implicit padding so the buffer can be uploaded as-is.
/// Hash and Eq compare float bit patterns, which is what deduplication needs.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    /// Position in mesh-local space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],

    /// Tangent vector for normal mapping
    pub tangent: [f32; 3],

    /// Padding to 48 bytes
    pub _padding: f32,
}

impl Vertex {
    fn attribute_bits(&self) -> impl Iterator<Item = u32> + '_ {
        self.position
            .iter()
            .chain(&self.normal)
            .chain(&self.tex_coord)
            .chain(&self.tangent)
            .map(|v| v.to_bits())
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.attribute_bits().eq(other.attribute_bits())
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for bits in self.attribute_bits() {
            bits.hash(state);
        }
    }
}

impl Vertex {
    /// Create a vertex with zero normal and tangent
    pub fn new(position: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: [0.0; 3],
            tex_coord: tex_coord.into(),
            tangent: [0.0; 3],
            _padding: 0.0,
        }
    }

    /// Position as a vector
    pub fn pos(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Texture coordinate as a vector
    pub fn uv(&self) -> Vec2 {
        Vec2::from(self.tex_coord)
    }
}

/// Triangle mesh owned by a single layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether every index refers to an existing vertex
    pub fn is_valid(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }

    fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    /// Recompute smooth per-vertex normals from triangle faces
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::zeros(); self.vertices.len()];
        for [a, b, c] in self.triangles() {
            let (pa, pb, pc) = (self.vertices[a].pos(), self.vertices[b].pos(), self.vertices[c].pos());
            // Clockwise front faces
            let face = (pc - pa).cross(&(pb - pa));
            for i in [a, b, c] {
                normals[i] += face;
            }
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros).into();
        }
    }

    /// Recompute per-vertex tangents from positions and texture coordinates
    ///
    /// Requires normals; tangents are orthogonalized against them.
    pub fn compute_tangents(&mut self) {
        let mut tangents = vec![Vec3::zeros(); self.vertices.len()];
        for [a, b, c] in self.triangles() {
            let (va, vb, vc) = (&self.vertices[a], &self.vertices[b], &self.vertices[c]);
            let (e1, e2) = (vb.pos() - va.pos(), vc.pos() - va.pos());
            let (d1, d2) = (vb.uv() - va.uv(), vc.uv() - va.uv());
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let tangent = (e1 * d2.y - e2 * d1.y) / det;
            for i in [a, b, c] {
                tangents[i] += tangent;
            }
        }
        for (vertex, tangent) in self.vertices.iter_mut().zip(tangents) {
            let normal = Vec3::from(vertex.normal);
            let orthogonal = tangent - normal * normal.dot(&tangent);
            vertex.tangent = orthogonal
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros)
                .into();
        }
    }

    /// Merge identical vertices and rewrite indices
    pub fn optimize(&mut self) {
        let mut unique: HashMap<Vertex, u32> = HashMap::with_capacity(self.vertices.len());
        let mut vertices = Vec::with_capacity(self.vertices.len());
        let mut remap = Vec::with_capacity(self.vertices.len());

        for vertex in &self.vertices {
            let index = *unique.entry(*vertex).or_insert_with(|| {
                vertices.push(*vertex);
                (vertices.len() - 1) as u32
            });
            remap.push(index);
        }

        for index in &mut self.indices {
            *index = remap[*index as usize];
        }
        if vertices.len() != self.vertices.len() {
            log::trace!("Mesh optimize merged {} -> {} vertices", self.vertices.len(), vertices.len());
        }
        self.vertices = vertices;
    }

    /// Vertex buffer as raw bytes for GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes for GPU upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
