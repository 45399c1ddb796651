//! wgpu-backed particle buffers
//!
//! Every emitter gets six vertex buffers: the quad corners and uvs (written
//! once) plus positions, lifetimes, sizes and angles (rewritten each frame).

use ember_particles::{GraphicsHandle, ParticleEmitterData, ParticleGraphics};
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Triangle-strip order
pub const QUAD_CORNERS: [Vec3; 4] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
];

pub const QUAD_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
];

pub struct EmitterBuffers {
    pub corners: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    pub positions: wgpu::Buffer,
    pub lifetimes: wgpu::Buffer,
    pub sizes: wgpu::Buffer,
    pub angles: wgpu::Buffer,
    pub capacity: u32,
}

impl EmitterBuffers {
    fn destroy(&self) {
        for buffer in [
            &self.corners,
            &self.uvs,
            &self.positions,
            &self.lifetimes,
            &self.sizes,
            &self.angles,
        ] {
            buffer.destroy();
        }
    }
}

pub struct WgpuParticleGraphics {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    buffers: HashMap<GraphicsHandle, EmitterBuffers>,
    next_handle: u64,
}

impl WgpuParticleGraphics {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn buffers(&self, handle: GraphicsHandle) -> Option<&EmitterBuffers> {
        self.buffers.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.buffers.len()
    }

    fn vertex_buffer(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            })
    }
}

impl ParticleGraphics for WgpuParticleGraphics {
    fn allocate(&mut self, emitter: &ParticleEmitterData) -> GraphicsHandle {
        self.next_handle += 1;
        let handle = GraphicsHandle(self.next_handle);

        let buffers = EmitterBuffers {
            corners: self.vertex_buffer("Particle Quad Corners", bytemuck::cast_slice(&QUAD_CORNERS)),
            uvs: self.vertex_buffer("Particle Quad UVs", bytemuck::cast_slice(&QUAD_UVS)),
            positions: self.vertex_buffer("Particle Positions", bytemuck::cast_slice(emitter.positions())),
            lifetimes: self.vertex_buffer("Particle Lifetimes", bytemuck::cast_slice(emitter.lifetimes())),
            sizes: self.vertex_buffer("Particle Sizes", bytemuck::cast_slice(emitter.sizes())),
            angles: self.vertex_buffer("Particle Angles", bytemuck::cast_slice(emitter.angles())),
            capacity: emitter.particle_count() as u32,
        };

        tracing::trace!(?handle, capacity = buffers.capacity, "allocated particle buffers");
        self.buffers.insert(handle, buffers);
        handle
    }

    fn upload(&mut self, handle: GraphicsHandle, emitter: &ParticleEmitterData) {
        let Some(buffers) = self.buffers.get(&handle) else {
            tracing::warn!(?handle, "upload to released particle buffers");
            return;
        };
        if buffers.capacity == 0 {
            return;
        }

        self.queue
            .write_buffer(&buffers.positions, 0, bytemuck::cast_slice(emitter.positions()));
        self.queue
            .write_buffer(&buffers.lifetimes, 0, bytemuck::cast_slice(emitter.lifetimes()));
        self.queue
            .write_buffer(&buffers.sizes, 0, bytemuck::cast_slice(emitter.sizes()));
        self.queue
            .write_buffer(&buffers.angles, 0, bytemuck::cast_slice(emitter.angles()));
    }

    fn release(&mut self, handle: GraphicsHandle) {
        match self.buffers.remove(&handle) {
            Some(buffers) => buffers.destroy(),
            None => tracing::warn!(?handle, "particle buffers released twice"),
        }
    }
}
