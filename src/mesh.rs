//! GPU vertex format and meshes.
//!
//! - [`Vertex3d`] is the vertex format every pipeline reads
//! - [`Mesh`] holds GPU-resident vertex and index buffers
//!
//! Meshes are built from a [`RawGeometry`](crate::geometry::RawGeometry),
//! either one of the procedural primitives or a loaded OBJ model:
//!
//! ```ignore
//! use penumbra::{Mesh, RawGeometry};
//!
//! let cube = Mesh::cube(&gpu);
//! let sphere = Mesh::sphere(&gpu, 32, 16);
//! let model = RawGeometry::from_obj("assets/models/helix.obj")?.upload(&gpu);
//! ```
//!
//! # Vertex Layout
//!
//! [`Vertex3d`] is 44 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//! | tangent   | Float32x3 | 32     | 3               |
//!
//! # Winding
//!
//! Geometry is left-handed with clockwise front faces: for every triangle
//! `(p0, p1, p2)` the cross product `(p1 - p0) × (p2 - p0)` points out of the
//! surface. Pipelines use [`wgpu::FrontFace::Cw`] with back-face culling.

use wgpu::util::DeviceExt;

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;

/// A vertex with position, normal, texture coordinates and tangent.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in model space.
    pub position: [f32; 3],
    /// Surface normal (unit length).
    pub normal: [f32; 3],
    /// Texture coordinates, v pointing down the image.
    pub uv: [f32; 2],
    /// Tangent along +u, orthogonal to the normal.
    pub tangent: [f32; 3],
}

impl Vertex3d {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3
    ];

    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };

    /// A vertex with a zero tangent; call
    /// [`RawGeometry::calculate_tangents`] once the triangles are known.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: [0.0; 3],
        }
    }
}

/// GPU-resident geometry with vertex and index buffers.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) vertex_count: u32,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Upload vertices and 32-bit indices.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
        }
    }

    /// Unit cube centred at the origin.
    pub fn cube(gpu: &GpuContext) -> Self {
        RawGeometry::cube().upload(gpu)
    }

    /// UV sphere of radius 0.5.
    pub fn sphere(gpu: &GpuContext, segments: u32, rings: u32) -> Self {
        RawGeometry::sphere(segments, rings).upload(gpu)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Bind the buffers and issue one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
