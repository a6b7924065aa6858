//! Unit-quad topology and the per-vertex layout shared by every sprite.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Color, Rect};

/// Two triangles over the corners TL(0), TR(1), BR(2), BL(3).
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Texture coordinates in corner order.
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

pub const VERTICES_PER_SPRITE: usize = 4;
pub const INDICES_PER_SPRITE: u32 = QUAD_INDICES.len() as u32;

/// One sprite corner: position (logical px), uv, rgb tint. 7 packed floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub tint: [f32; 3],
}

impl SpriteVertex {
    pub const FLOATS: usize = 7;

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
        2 => Float32x3  // tint
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Builds the four corners of `rect` in index order, each tinted with `tint.rgb()`.
pub fn quad_vertices(rect: Rect, tint: Color) -> [SpriteVertex; VERTICES_PER_SPRITE] {
    let corners = rect.corners();
    let tint = tint.rgb();
    std::array::from_fn(|i| SpriteVertex {
        position: corners[i].to_array(),
        uv: QUAD_UVS[i],
        tint,
    })
}
