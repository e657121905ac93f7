use crate::{
    data_structures::texture,
    pipelines::basic::{MegaState, mk_pipeline_layout, mk_render_pipeline},
};

/// Expanded chunk positions live in vertex buffer 0.
pub fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

/// Flat normals live in vertex buffer 1.
pub fn normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

/// Chunks are shaded from both sides, so nothing is culled.
pub fn mk_chunk_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    uniform_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Chunk Pipeline Layout", &[uniform_layout]);
    mk_render_pipeline(
        device,
        "Chunk Pipeline",
        &layout,
        color_format,
        MegaState {
            cull_mode: None,
            depth_compare: wgpu::CompareFunction::LessEqual,
            ..Default::default()
        },
        Some(texture::Texture::DEPTH_FORMAT),
        &[position_layout(), normal_layout()],
        wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("chunk.wgsl").into()),
        },
    )
}
