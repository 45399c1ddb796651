//! Turns a frame's draw commands into GPU work

use crate::frame::ParticleDrawCommand;
use crate::gpu_buffers::WgpuParticleGraphics;
use crate::particle_pipeline::ParticlePipeline;
use crate::texture_cache::TextureCache;
use ember_core::ResourceId;
use ember_particles::GraphicsHandle;
use wgpu::util::DeviceExt;

struct PreparedDraw {
    handle: GraphicsHandle,
    instance_count: u32,
    shader: ResourceId,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

pub struct ParticleRenderer {
    pipeline: ParticlePipeline,
    prepared: Vec<PreparedDraw>,
}

impl ParticleRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            pipeline: ParticlePipeline::new(device, format),
            prepared: Vec::new(),
        }
    }

    pub fn pipeline(&self) -> &ParticlePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut ParticlePipeline {
        &mut self.pipeline
    }

    /// Build the bind groups for this frame's commands, replacing the last
    /// frame's. Empty emitters are skipped.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        commands: &[ParticleDrawCommand],
        textures: &TextureCache,
    ) {
        self.prepared.clear();

        for command in commands.iter().filter(|c| c.instance_count > 0) {
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Particle Uniform Buffer"),
                contents: bytemuck::bytes_of(&command.uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.pipeline.uniform_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
                label: Some("Particle Uniform Bind Group"),
            });

            let main = textures.get_or_default(command.texture);
            let [effect_0, effect_1, effect_2] =
                command.effect_textures.map(|id| &textures.get_or_default(id).view);
            let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.pipeline.texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&main.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&main.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(effect_0),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(effect_1),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(effect_2),
                    },
                ],
                label: Some("Particle Texture Bind Group"),
            });

            self.prepared.push(PreparedDraw {
                handle: command.handle,
                instance_count: command.instance_count,
                shader: command.shader,
                uniform_bind_group,
                texture_bind_group,
            });
        }
    }

    /// Record the prepared draws in order: one instanced strip per emitter
    pub fn encode(&self, pass: &mut wgpu::RenderPass<'_>, graphics: &WgpuParticleGraphics) {
        for draw in &self.prepared {
            let Some(buffers) = graphics.buffers(draw.handle) else {
                tracing::warn!(handle = ?draw.handle, "draw for released particle buffers");
                continue;
            };

            pass.set_pipeline(self.pipeline.pipeline_for(draw.shader));
            pass.set_bind_group(0, &draw.uniform_bind_group, &[]);
            pass.set_bind_group(1, &draw.texture_bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.corners.slice(..));
            pass.set_vertex_buffer(1, buffers.uvs.slice(..));
            pass.set_vertex_buffer(2, buffers.positions.slice(..));
            pass.set_vertex_buffer(3, buffers.lifetimes.slice(..));
            pass.set_vertex_buffer(4, buffers.sizes.slice(..));
            pass.set_vertex_buffer(5, buffers.angles.slice(..));
            pass.draw(0..4, 0..draw.instance_count.min(buffers.capacity));
        }
    }

    /// Clear the targets and draw the prepared frame into them
    pub fn render_to_view(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        graphics: &WgpuParticleGraphics,
        clear_color: wgpu::Color,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Render Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.encode(&mut pass, graphics);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}
