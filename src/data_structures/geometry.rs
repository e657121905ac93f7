//! Indexed level geometry uploaded to the GPU.
//!
//! Trile and art object meshes arrive from the asset loader as interleaved
//! [`LevelVertex`] data plus a triangle list. [`GeometryData`] owns the
//! resulting buffers together with the object-space bounding box used for
//! culling.

use cgmath::Point3;
use wgpu::util::DeviceExt;

use crate::data_structures::bounds::Aabb;

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LevelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex for LevelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LevelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Object-space bounds of a vertex list.
pub fn compute_bbox(vertices: &[LevelVertex]) -> Aabb {
    Aabb::from_points(vertices.iter().map(|v| Point3::from(v.position)))
}

#[derive(Debug)]
pub struct GeometryData {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub bbox: Aabb,
}

impl GeometryData {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        vertices: &[LevelVertex],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            bbox: compute_bbox(vertices),
        }
    }

    /// The unit quad every background plane is drawn with: centred on the
    /// origin in the XY plane, facing +Z, wound clockwise.
    pub fn plane_quad(device: &wgpu::Device) -> Self {
        let normal = [0.0, 0.0, 1.0];
        let vertices = [
            LevelVertex {
                position: [-0.5, -0.5, 0.0],
                normal,
                tex_coord: [0.0, 1.0],
            },
            LevelVertex {
                position: [-0.5, 0.5, 0.0],
                normal,
                tex_coord: [0.0, 0.0],
            },
            LevelVertex {
                position: [0.5, 0.5, 0.0],
                normal,
                tex_coord: [1.0, 0.0],
            },
            LevelVertex {
                position: [0.5, -0.5, 0.0],
                normal,
                tex_coord: [1.0, 1.0],
            },
        ];
        let indices = [0, 1, 2, 0, 2, 3];
        Self::new(device, "Background Plane", &vertices, &indices)
    }
}
