//! Batched vertex format
//!
//! Every quad or thick line is six [`Vertex`] values (two triangles). The
//! layout is `#[repr(C)]` and `Pod` so a batch can be copied straight into a
//! vertex buffer with `bytemuck::cast_slice`.

use sable_core::{Color, Point};

/// Texture slot sentinel for solid color fills
pub const NO_TEXTURE: i32 = -1;

/// Number of parameter vectors carried by every vertex
pub const SHADER_PARAM_COUNT: usize = 8;

/// Uninterpreted values handed to custom shaders (locations 4..=11)
pub type ShaderParams = [[f32; 4]; SHADER_PARAM_COUNT];

/// All-zero shader parameters
pub const NO_PARAMS: ShaderParams = [[0.0; 4]; SHADER_PARAM_COUNT];

/// Vertices emitted per quad or line segment
pub const VERTICES_PER_QUAD: usize = 6;

/// One vertex of a batched draw
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Screen-space position (camera already applied)
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    /// RGB tint with the draw alpha in `color[3]`
    pub color: [f32; 4],
    /// Bound texture slot or [`NO_TEXTURE`]
    pub texture: i32,
    pub params: ShaderParams,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 12] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x4,
        3 => Sint32,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
        11 => Float32x4,
    ];

    /// Textured vertex
    pub fn textured(
        position: Point,
        tex_coord: [f32; 2],
        color: [f32; 4],
        slot: i32,
        params: &ShaderParams,
    ) -> Self {
        Self {
            position: [position.x, position.y],
            tex_coord,
            color,
            texture: slot,
            params: *params,
        }
    }

    /// Solid-fill vertex
    pub fn solid(position: Point, tex_coord: [f32; 2], color: Color, params: &ShaderParams) -> Self {
        Self::textured(position, tex_coord, color.to_f32_array(), NO_TEXTURE, params)
    }

    pub fn is_solid(&self) -> bool {
        self.texture == NO_TEXTURE
    }

    pub fn alpha(&self) -> f32 {
        self.color[3]
    }

    /// Vertex buffer layout matching the WGSL `VertexInput` struct
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
