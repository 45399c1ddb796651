//! Headless render command

use anyhow::{Context, Result};
use ember_core::{ResourceId, ResourceRegistry};
use ember_particles::{
    DefinitionStore, EmitterOptions, ParticleConfig, ParticleManager, ParticleRng,
};
use ember_render::{
    CanvasSize, FrameRenderer, HeadlessContext, ParticleBlend, ParticleRenderer, TextureCache,
    GENERIC_PARTICLE_SHADER,
};
use ember_scene::Scene;
use glam::Vec3;
use std::path::{Path, PathBuf};

pub struct RenderArgs {
    pub emitter: String,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub frame_millis: f32,
    pub at: [f32; 3],
    pub zoom: f32,
    pub assets: PathBuf,
    pub seed: Option<u64>,
}

pub fn run(config: ParticleConfig, args: RenderArgs) -> Result<()> {
    let size = CanvasSize::new(args.width, args.height)?;
    let ctx = HeadlessContext::new(size).context("Failed to create headless render context")?;

    let mut registry = ResourceRegistry::new();
    let store = super::load_store(&config, ember_particles::ReloadMode::DontReload, &mut registry)?;
    let graphics = ctx.particle_graphics();
    let rng = ParticleRng::from_seed_option(args.seed.or(config.rng_seed));
    let mut manager = ParticleManager::new(store, graphics, rng)
        .with_name_prefix(config.emitter_name_prefix.clone());

    let mut scene = Scene::new("render");
    size.fit_camera(scene.camera_mut());
    scene.camera_mut().set_zoom(args.zoom);

    manager
        .create_particle_emitter_at_position(
            &args.emitter,
            Vec3::from_array(args.at),
            &mut scene,
            EmitterOptions::default(),
        )
        .with_context(|| format!("Failed to create emitter '{}'", args.emitter))?;

    for frame in 0..args.frames {
        let removed = manager.update_scene_particles(args.frame_millis, &mut scene);
        if !removed.is_empty() {
            println!("Emitter exhausted at frame {}; rendering an empty frame", frame);
            break;
        }
    }

    let mut textures = TextureCache::new(ctx.device(), ctx.queue());
    let loaded = textures.load_registry(ctx.device(), ctx.queue(), &registry, &args.assets);
    tracing::info!(loaded, "particle textures");

    let mut renderer = ctx.particle_renderer();
    register_shaders(&mut renderer, ctx.device(), &registry, manager.definitions(), &args.assets);

    let mut frame = FrameRenderer::new();
    frame.begin_frame();
    frame.render_scene(&scene, manager.graphics_mut());
    let commands = frame.end_frame();

    renderer.prepare(ctx.device(), &commands, &textures);
    let img = ctx
        .capture(&renderer, manager.graphics())
        .context("Failed to read rendered pixels")?;
    img.save(&args.output)
        .with_context(|| format!("Failed to save image to {}", args.output.display()))?;

    let stats = frame.last_stats();
    println!(
        "Rendered {} draw call(s), {} particle slot(s) to {}",
        stats.draw_calls,
        stats.particle_instances,
        args.output.display()
    );

    manager.remove_all_particle_emitters(&mut scene);
    Ok(())
}

/// Build a pipeline for every shader the definitions reference. Shaders
/// missing on disk draw with the generic source.
fn register_shaders(
    renderer: &mut ParticleRenderer,
    device: &wgpu::Device,
    registry: &ResourceRegistry,
    definitions: &DefinitionStore,
    assets: &Path,
) {
    let mut shader_ids: Vec<ResourceId> = definitions
        .names()
        .into_iter()
        .filter_map(|name| definitions.get(name))
        .map(|definition| definition.shader)
        .filter(|id| !id.is_none())
        .collect();
    shader_ids.sort();
    shader_ids.dedup();

    for id in shader_ids {
        let Some(path) = registry.path(id) else {
            continue;
        };
        let blend = ParticleBlend::for_shader_path(path);
        match std::fs::read_to_string(assets.join(path)) {
            Ok(source) => {
                renderer.pipeline_mut().register_shader(device, id, &source, blend);
                tracing::debug!(path, "registered particle shader");
            }
            // Keep the blend mode even when the source is missing
            Err(_) if blend == ParticleBlend::Additive => {
                renderer
                    .pipeline_mut()
                    .register_shader(device, id, GENERIC_PARTICLE_SHADER, blend);
            }
            Err(e) => tracing::debug!(path, "using generic particle shader: {}", e),
        }
    }
}
