//! Ember Render - wgpu renderer for particle emitters
//!
//! Each frame the scene is walked in order: visible emitters upload their
//! arrays and queue one instanced draw, deferred objects go last. Rendering
//! is offscreen; the CLI reads the pixels back into an image.

mod error;
mod frame;
mod gpu_buffers;
mod headless;
pub mod particle_pipeline;
mod particle_renderer;
mod texture_cache;

pub use error::RenderError;
pub use frame::{FrameRenderer, FrameStats, ParticleDrawCommand, ParticleUniforms};
pub use gpu_buffers::{EmitterBuffers, WgpuParticleGraphics, QUAD_CORNERS, QUAD_UVS};
pub use headless::{CanvasSize, HeadlessContext, CANVAS_FORMAT, PARTICLE_CLEAR};
pub use particle_pipeline::{ParticleBlend, ParticlePipeline, GENERIC_PARTICLE_SHADER};
pub use particle_renderer::ParticleRenderer;
pub use texture_cache::{GpuTexture, TextureCache};

#[cfg(test)]
mod tests {
    #[test]
    fn particle_shader_wgsl_parses() {
        let source = include_str!("particle_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("particle_shader.wgsl failed to parse");
    }

    #[test]
    fn particle_shader_exposes_entry_points() {
        let module = naga::front::wgsl::parse_str(crate::GENERIC_PARTICLE_SHADER)
            .expect("particle_shader.wgsl failed to parse");
        let names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"vs_particle"));
        assert!(names.contains(&"fs_particle"));
    }
}
