use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    chunk_mesh::{
        mesh::{IvChunk, IvMesh},
        normals::expand_flat_shaded,
    },
    flow::{Layer, SceneGfx, ViewerInput},
    pipelines::chunk::mk_chunk_pipeline,
    render::{DrawCall, RenderInst, RenderInstManager, RenderLayer},
};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkSceneParams {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl ChunkSceneParams {
    pub fn new(projection: &Matrix4<f32>, view: &Matrix4<f32>) -> Self {
        Self {
            projection: (*projection).into(),
            view: (*view).into(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkObjectParams {
    pub colour: [f32; 4],
}

/// GPU buffers of one flat-shaded chunk.
#[derive(Debug)]
pub struct ChunkRenderer {
    position_buffer: wgpu::Buffer,
    normal_buffer: wgpu::Buffer,
    vertex_count: u32,
    pub visible: bool,
}

impl ChunkRenderer {
    pub fn new(device: &wgpu::Device, label: &str, chunk: &IvChunk) -> Self {
        let expanded = expand_flat_shaded(&chunk.position_data, &chunk.index_data);
        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Position Buffer")),
            contents: bytemuck::cast_slice(&expanded.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Normal Buffer")),
            contents: bytemuck::cast_slice(&expanded.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            position_buffer,
            normal_buffer,
            vertex_count: chunk.index_data.len() as u32,
            visible: true,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn prepare_to_render<'a>(
        &'a self,
        pipeline: &'a wgpu::RenderPipeline,
        uniform_offsets: [u32; 2],
        manager: &mut RenderInstManager<'a>,
    ) {
        if self.vertex_count == 0 {
            log::warn!("Skipping empty chunk");
            return;
        }
        manager.push(RenderInst {
            layer: RenderLayer::Opaque,
            pipeline,
            uniform_offsets,
            bind_groups: Vec::new(),
            vertex_buffers: vec![&self.position_buffer, &self.normal_buffer],
            index_buffer: None,
            draw: DrawCall::Vertices(self.vertex_count),
            visible: self.visible,
        });
    }
}

/// All chunks of one mesh; the mesh is a toggleable layer.
#[derive(Debug)]
pub struct IvRenderer {
    pub name: String,
    color: [f32; 4],
    visible: bool,
    chunks: Vec<ChunkRenderer>,
}

impl IvRenderer {
    pub fn new(device: &wgpu::Device, mesh: &IvMesh) -> Self {
        let chunks = mesh
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| ChunkRenderer::new(device, &format!("{} chunk {i}", mesh.name), chunk))
            .collect();
        Self {
            name: mesh.name.clone(),
            color: mesh.color,
            visible: true,
            chunks,
        }
    }

    pub fn chunks(&self) -> &[ChunkRenderer] {
        &self.chunks
    }

    pub fn prepare_to_render<'a>(
        &'a self,
        pipeline: &'a wgpu::RenderPipeline,
        scene_offset: u32,
        manager: &mut RenderInstManager<'a>,
    ) {
        let object_offset = manager.allocate_uniform(&ChunkObjectParams { colour: self.color });
        for chunk in &self.chunks {
            chunk.prepare_to_render(pipeline, [scene_offset, object_offset], manager);
        }
    }
}

impl Layer for IvRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        for chunk in &mut self.chunks {
            chunk.visible = visible;
        }
    }
}

/// The chunk mesh viewer: every mesh of a file, one layer each.
#[derive(Debug)]
pub struct IvScene {
    pipeline: wgpu::RenderPipeline,
    renderers: Vec<IvRenderer>,
}

impl IvScene {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
        meshes: &[IvMesh],
    ) -> Self {
        let pipeline = mk_chunk_pipeline(device, color_format, uniform_layout);
        let renderers: Vec<IvRenderer> = meshes.iter().map(|mesh| IvRenderer::new(device, mesh)).collect();
        log::info!(
            "Built chunk mesh scene: {} meshes, {} chunks",
            renderers.len(),
            renderers.iter().map(|r| r.chunks.len()).sum::<usize>()
        );
        Self { pipeline, renderers }
    }

    pub fn renderers(&self) -> &[IvRenderer] {
        &self.renderers
    }
}

impl SceneGfx for IvScene {
    fn prepare_to_render<'a>(&'a self, input: &ViewerInput, manager: &mut RenderInstManager<'a>) {
        let scene_offset = manager.allocate_uniform(&ChunkSceneParams::new(&input.projection, &input.view));
        for renderer in &self.renderers {
            renderer.prepare_to_render(&self.pipeline, scene_offset, manager);
        }
    }

    fn layers_mut(&mut self) -> Vec<&mut dyn Layer> {
        self.renderers.iter_mut().map(|r| r as &mut dyn Layer).collect()
    }
}
