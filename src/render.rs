//! Per-frame draw submissions and the transient uniform arena.
//!
//! Scenes describe a frame as a list of [`RenderInst`]s pushed into a
//! [`RenderInstManager`]. Every inst carries two dynamic offsets into one
//! shared uniform buffer: the scene block (projection and friends, allocated
//! once per frame) and its own object block. The blocks are staged on the CPU
//! while the frame is assembled and uploaded in a single `write_buffer`.
//!
//! # Frame lifecycle
//!
//! 1. [`RenderInstManager::new`] resets the [`UniformArena`]
//! 2. scenes allocate uniform blocks and push insts
//! 3. [`RenderInstManager::finish`] uploads the arena and sorts the insts into a [`DrawList`]
//! 4. [`DrawList::draw_on_pass`] records the draws into a render pass
//!

use std::num::NonZeroU64;

/// Size of each uniform binding window. Every block written into the arena
/// must fit in it.
pub const UNIFORM_BLOCK_SIZE: u64 = 256;

/// Bind group index of the shared uniform arena in every pipeline layout.
pub const UNIFORM_GROUP: u32 = 0;

/// Draw order buckets. Submission order is preserved inside a bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderLayer {
    Background,
    Opaque,
    Translucent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawCall {
    Indexed(u32),
    Vertices(u32),
}

/// One draw submission.
pub struct RenderInst<'a> {
    pub layer: RenderLayer,
    pub pipeline: &'a wgpu::RenderPipeline,
    /// `[scene block, object block]` offsets into the uniform arena.
    pub uniform_offsets: [u32; 2],
    /// Bind groups for groups 1.. (textures and samplers).
    pub bind_groups: Vec<&'a wgpu::BindGroup>,
    pub vertex_buffers: Vec<&'a wgpu::Buffer>,
    pub index_buffer: Option<&'a wgpu::Buffer>,
    pub draw: DrawCall,
    pub visible: bool,
}

/// CPU side of the arena: 256-byte aligned blocks written back to back.
#[derive(Debug, Default)]
pub struct UniformStaging {
    data: Vec<u8>,
}

impl UniformStaging {
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Copy `value` into a fresh block and return its byte offset.
    pub fn allocate<T: bytemuck::Pod>(&mut self, value: &T) -> u32 {
        let bytes = bytemuck::bytes_of(value);
        assert!(
            bytes.len() as u64 <= UNIFORM_BLOCK_SIZE,
            "uniform block of {} bytes exceeds {}",
            bytes.len(),
            UNIFORM_BLOCK_SIZE
        );
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.data.resize(offset + UNIFORM_BLOCK_SIZE as usize, 0);
        offset as u32
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// GPU side of the arena: a growable uniform buffer bound with dynamic offsets.
#[derive(Debug)]
pub struct UniformArena {
    staging: UniformStaging,
    buffer: wgpu::Buffer,
    capacity: u64,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl UniformArena {
    const INITIAL_CAPACITY: u64 = 64 * UNIFORM_BLOCK_SIZE;

    pub fn new(device: &wgpu::Device) -> Self {
        let layout = mk_uniform_layout(device);
        let buffer = mk_uniform_buffer(device, Self::INITIAL_CAPACITY);
        let bind_group = mk_uniform_bind_group(device, &layout, &buffer);
        Self {
            staging: UniformStaging::default(),
            buffer,
            capacity: Self::INITIAL_CAPACITY,
            layout,
            bind_group,
        }
    }

    /// Layout of group 0 in every pipeline: two dynamic uniform windows.
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Upload the staged blocks, growing the buffer (and rebuilding the bind
    /// group) when the frame needs more room than the current buffer has.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let needed = self.staging.len() as u64;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            log::info!("Growing uniform arena from {} to {} bytes", self.capacity, capacity);
            self.buffer = mk_uniform_buffer(device, capacity);
            self.bind_group = mk_uniform_bind_group(device, &self.layout, &self.buffer);
            self.capacity = capacity;
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, self.staging.as_bytes());
        }
    }
}

/// Collects the submissions of one frame.
pub struct RenderInstManager<'a> {
    arena: &'a mut UniformArena,
    insts: Vec<RenderInst<'a>>,
}

impl<'a> RenderInstManager<'a> {
    pub fn new(arena: &'a mut UniformArena) -> Self {
        arena.staging.reset();
        Self {
            arena,
            insts: Vec::new(),
        }
    }

    pub fn allocate_uniform<T: bytemuck::Pod>(&mut self, value: &T) -> u32 {
        self.arena.staging.allocate(value)
    }

    pub fn push(&mut self, inst: RenderInst<'a>) {
        self.insts.push(inst);
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn finish(self, device: &wgpu::Device, queue: &wgpu::Queue) -> DrawList<'a> {
        let Self { arena, mut insts } = self;
        arena.upload(device, queue);
        insts.sort_by_key(|inst| inst.layer);
        let arena: &'a UniformArena = arena;
        DrawList {
            insts,
            uniforms: &arena.bind_group,
        }
    }
}

/// The sorted, uploaded submissions of one frame.
pub struct DrawList<'a> {
    insts: Vec<RenderInst<'a>>,
    uniforms: &'a wgpu::BindGroup,
}

impl<'a> DrawList<'a> {
    pub fn insts(&self) -> &[RenderInst<'a>] {
        &self.insts
    }

    pub fn visible_count(&self) -> usize {
        self.insts.iter().filter(|inst| inst.visible).count()
    }

    pub fn draw_on_pass(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        for inst in self.insts.iter().filter(|inst| inst.visible) {
            render_pass.set_pipeline(inst.pipeline);
            render_pass.set_bind_group(UNIFORM_GROUP, self.uniforms, &inst.uniform_offsets);
            for (i, group) in inst.bind_groups.iter().enumerate() {
                render_pass.set_bind_group(UNIFORM_GROUP + 1 + i as u32, *group, &[]);
            }
            for (slot, buffer) in inst.vertex_buffers.iter().enumerate() {
                render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            match (inst.draw, inst.index_buffer) {
                (DrawCall::Indexed(count), Some(index_buffer)) => {
                    render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..count, 0, 0..1);
                }
                (DrawCall::Indexed(_), None) => {
                    log::warn!("indexed draw submitted without an index buffer");
                }
                (DrawCall::Vertices(count), _) => render_pass.draw(0..count, 0..1),
            }
        }
    }
}

fn mk_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: NonZeroU64::new(UNIFORM_BLOCK_SIZE),
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform_arena_bind_group_layout"),
        entries: &[entry(0), entry(1)],
    })
}

fn mk_uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Uniform Arena Buffer"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn mk_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    let window = |binding| wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer,
            offset: 0,
            size: NonZeroU64::new(UNIFORM_BLOCK_SIZE),
        }),
    };
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform_arena_bind_group"),
        layout,
        entries: &[window(0), window(1)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_block_aligned() {
        let mut staging = UniformStaging::default();
        let a = staging.allocate(&[1.0f32; 4]);
        let b = staging.allocate(&[[2.0f32; 4]; 8]);
        let c = staging.allocate(&0u32);
        assert_eq!(a, 0);
        assert_eq!(b as u64, UNIFORM_BLOCK_SIZE);
        assert_eq!(c as u64, 2 * UNIFORM_BLOCK_SIZE);
        assert_eq!(staging.len() as u64, 3 * UNIFORM_BLOCK_SIZE);
    }

    #[test]
    fn allocation_copies_the_value() {
        let mut staging = UniformStaging::default();
        staging.allocate(&0u32);
        let offset = staging.allocate(&[3.5f32, -1.0]) as usize;
        let values: [f32; 2] = bytemuck::pod_read_unaligned(&staging.as_bytes()[offset..offset + 8]);
        assert_eq!(values, [3.5, -1.0]);
    }

    #[test]
    fn reset_starts_a_new_frame() {
        let mut staging = UniformStaging::default();
        staging.allocate(&[0.0f32; 16]);
        staging.reset();
        assert!(staging.is_empty());
        assert_eq!(staging.allocate(&[0.0f32; 16]), 0);
    }

    #[test]
    fn layers_sort_background_first() {
        let mut layers = vec![
            RenderLayer::Translucent,
            RenderLayer::Opaque,
            RenderLayer::Background,
        ];
        layers.sort();
        assert_eq!(
            layers,
            vec![
                RenderLayer::Background,
                RenderLayer::Opaque,
                RenderLayer::Translucent
            ]
        );
    }

    #[test]
    #[should_panic]
    fn oversized_blocks_are_rejected() {
        let mut staging = UniformStaging::default();
        staging.allocate(&[0.0f32; 128]);
    }
}
