//! Instanced particle render pipelines
//!
//! Six vertex buffer slots feed a triangle-strip quad per particle:
//! corners and uvs step per vertex, the particle arrays step per instance.
//! Pipelines are built per registered shader; unknown shader ids fall back
//! to the built-in generic shader.

use crate::frame::ParticleUniforms;
use ember_core::ResourceId;
use std::collections::HashMap;

/// Source of the built-in generic shader
pub const GENERIC_PARTICLE_SHADER: &str = include_str!("particle_shader.wgsl");

const CORNER_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const UV_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];
const LIFETIME_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];
const SIZE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32];
const ANGLE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![5 => Float32];

fn vertex_layout(
    stride: usize,
    step_mode: wgpu::VertexStepMode,
    attributes: &'static [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: stride as wgpu::BufferAddress,
        step_mode,
        attributes,
    }
}

/// Buffer layouts in slot order, matching `EmitterBuffers`
pub fn particle_vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 6] {
    use std::mem::size_of;
    use wgpu::VertexStepMode::{Instance, Vertex};
    [
        vertex_layout(size_of::<[f32; 3]>(), Vertex, &CORNER_ATTRIBUTES),
        vertex_layout(size_of::<[f32; 2]>(), Vertex, &UV_ATTRIBUTES),
        vertex_layout(size_of::<[f32; 3]>(), Instance, &POSITION_ATTRIBUTES),
        vertex_layout(size_of::<f32>(), Instance, &LIFETIME_ATTRIBUTES),
        vertex_layout(size_of::<f32>(), Instance, &SIZE_ATTRIBUTES),
        vertex_layout(size_of::<f32>(), Instance, &ANGLE_ATTRIBUTES),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParticleBlend {
    #[default]
    Alpha,
    /// src_alpha + One
    Additive,
}

impl ParticleBlend {
    /// Shaders whose file name mentions "additive" blend additively
    pub fn for_shader_path(path: &str) -> Self {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if file_name.contains("additive") {
            Self::Additive
        } else {
            Self::Alpha
        }
    }

    fn state(self) -> wgpu::BlendState {
        match self {
            Self::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            Self::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

pub struct ParticlePipeline {
    format: wgpu::TextureFormat,
    pub uniform_bind_group_layout: wgpu::BindGroupLayout,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    generic: wgpu::RenderPipeline,
    by_shader: HashMap<ResourceId, wgpu::RenderPipeline>,
}

impl ParticlePipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        // Group 0: per-draw uniforms
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ParticleUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
                label: Some("Particle Uniform Bind Group Layout"),
            });

        // Group 1: main texture, sampler, then the effect textures
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    texture_entry(0),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    texture_entry(2),
                    texture_entry(3),
                    texture_entry(4),
                ],
                label: Some("Particle Texture Bind Group Layout"),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let generic = Self::build(
            device,
            &pipeline_layout,
            format,
            GENERIC_PARTICLE_SHADER,
            ParticleBlend::Alpha,
            "Generic Particle Pipeline",
        );

        Self {
            format,
            uniform_bind_group_layout,
            texture_bind_group_layout,
            pipeline_layout,
            generic,
            by_shader: HashMap::new(),
        }
    }

    fn build(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        format: wgpu::TextureFormat,
        source: &str,
        blend: ParticleBlend,
        label: &str,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let buffers = particle_vertex_layouts();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_particle"),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_particle"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend.state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Depth test against the scene, but particles never write depth
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Build a pipeline for a loaded shader. The source must expose
    /// `vs_particle`/`fs_particle` over the generic shader's bindings.
    pub fn register_shader(
        &mut self,
        device: &wgpu::Device,
        id: ResourceId,
        source: &str,
        blend: ParticleBlend,
    ) {
        let label = format!("Particle Pipeline {}", id);
        let pipeline = Self::build(device, &self.pipeline_layout, self.format, source, blend, &label);
        self.by_shader.insert(id, pipeline);
    }

    pub fn has_shader(&self, id: ResourceId) -> bool {
        self.by_shader.contains_key(&id)
    }

    pub fn pipeline_for(&self, shader: ResourceId) -> &wgpu::RenderPipeline {
        self.by_shader.get(&shader).unwrap_or(&self.generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_shaders_by_file_name() {
        assert_eq!(
            ParticleBlend::for_shader_path("shaders/additive_particle.wgsl"),
            ParticleBlend::Additive
        );
        assert_eq!(
            ParticleBlend::for_shader_path("shaders/generic_particle.wgsl"),
            ParticleBlend::Alpha
        );
        assert_eq!(
            ParticleBlend::for_shader_path("additive/generic_particle.wgsl"),
            ParticleBlend::Alpha
        );
    }

    #[test]
    fn test_vertex_layouts_cover_six_locations() {
        let layouts = particle_vertex_layouts();
        let locations: Vec<u32> = layouts
            .iter()
            .flat_map(|l| l.attributes.iter().map(|a| a.shader_location))
            .collect();
        assert_eq!(locations, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(layouts[0].step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(layouts[2].step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layouts[3].array_stride, 4);
    }
}
