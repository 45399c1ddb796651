//! Per-frame draw list for particle emitters
//!
//! Backend-independent: walking the scene only needs a [`ParticleGraphics`]
//! to push the latest arrays, so the ordering rules are testable without a GPU.

use ember_core::ResourceId;
use ember_particles::{GraphicsHandle, ParticleGraphics};
use ember_scene::{Camera, Scene, SceneObject, SceneObjectData, EFFECT_TEXTURES_COUNT, ROTATION_AXIS_UNIFORM};

/// Mirrors `ParticleUniforms` in `particle_shader.wgsl` (144 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub rotation_axis: [f32; 3],
    pub custom_alpha: f32,
}

impl ParticleUniforms {
    pub fn new(camera: &Camera, object: &SceneObject, emitter_axis: glam::Vec3) -> Self {
        let rotation_axis = object
            .vec3_uniforms
            .get(ROTATION_AXIS_UNIFORM)
            .copied()
            .unwrap_or(emitter_axis);
        Self {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(),
            rotation_axis: rotation_axis.to_array(),
            custom_alpha: object.custom_alpha(),
        }
    }
}

/// One instanced draw: a quad per particle slot
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleDrawCommand {
    pub object_name: String,
    pub handle: GraphicsHandle,
    pub instance_count: u32,
    pub texture: ResourceId,
    pub effect_textures: [ResourceId; EFFECT_TEXTURES_COUNT],
    pub shader: ResourceId,
    pub uniforms: ParticleUniforms,
    pub deferred: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub deferred_draw_calls: usize,
    /// Slots submitted, alive or not
    pub particle_instances: usize,
}

/// Collects draw commands between `begin_frame` and `end_frame`.
///
/// Visible emitters draw in scene order; objects flagged for deferred
/// rendering draw after every regular object.
#[derive(Debug, Default)]
pub struct FrameRenderer {
    main: Vec<ParticleDrawCommand>,
    deferred: Vec<ParticleDrawCommand>,
    in_frame: bool,
    last_stats: FrameStats,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        if self.in_frame {
            tracing::warn!("begin_frame called twice, dropping queued draws");
        }
        self.main.clear();
        self.deferred.clear();
        self.in_frame = true;
    }

    /// Upload every visible emitter's arrays and queue its draw
    pub fn render_scene<G: ParticleGraphics>(&mut self, scene: &Scene, graphics: &mut G) {
        if !self.in_frame {
            tracing::warn!(scene = scene.name(), "render_scene outside begin_frame/end_frame");
        }

        let camera = scene.camera();
        for object in scene.scene_objects() {
            if object.invisible {
                continue;
            }

            let emitter = match &object.data {
                SceneObjectData::ParticleEmitter(emitter) => &**emitter,
                SceneObjectData::Default | SceneObjectData::Text(_) => continue,
            };

            let Some(handle) = emitter.graphics_handle() else {
                tracing::warn!(object = %object.name, "particle emitter without graphics buffers");
                continue;
            };
            graphics.upload(handle, emitter);

            let command = ParticleDrawCommand {
                object_name: object.name.clone(),
                handle,
                instance_count: emitter.particle_count() as u32,
                texture: object.texture,
                effect_textures: object.effect_textures,
                shader: object.shader,
                uniforms: ParticleUniforms::new(camera, object, emitter.rotation_axis),
                deferred: object.deferred_rendering,
            };

            if object.deferred_rendering {
                self.deferred.push(command);
            } else {
                self.main.push(command);
            }
        }
    }

    /// Close the frame and hand back its draws, regular pass first
    pub fn end_frame(&mut self) -> Vec<ParticleDrawCommand> {
        self.in_frame = false;

        let mut commands = std::mem::take(&mut self.main);
        let deferred_draw_calls = self.deferred.len();
        commands.append(&mut self.deferred);

        self.last_stats = FrameStats {
            draw_calls: commands.len(),
            deferred_draw_calls,
            particle_instances: commands.iter().map(|c| c.instance_count as usize).sum(),
        };
        commands
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::ResourceRegistry;
    use ember_particles::{
        DefinitionStore, EmitterDefinition, EmitterOptions, FloatRange, LoadSettings, NullGraphics,
        ParticleFlags, ParticleManager, ParticleRng, RotationAxis,
    };
    use glam::Vec3;

    fn manager() -> ParticleManager<NullGraphics> {
        let mut store = DefinitionStore::new(LoadSettings::default());
        let mut sparks = EmitterDefinition::new("sparks", 6, ParticleFlags::CONTINUOUS_GENERATION);
        sparks.lifetime_range = FloatRange::new(1.0, 2.0);
        sparks.size_range = FloatRange::new(0.1, 0.2);
        sparks.rotation_axis = Some(RotationAxis::Y);
        store.insert(sparks);

        let json = store.to_json_string().unwrap();
        let mut registry = ResourceRegistry::new();
        let mut loaded = DefinitionStore::new(LoadSettings::default());
        loaded.load_from_str(&json, &mut registry).unwrap();
        ParticleManager::new(loaded, NullGraphics::new(), ParticleRng::new(3))
    }

    fn spawn(manager: &mut ParticleManager<NullGraphics>, scene: &mut Scene, name: &str) {
        manager
            .create_particle_emitter_at_position("sparks", Vec3::ZERO, scene, EmitterOptions::named(name))
            .unwrap();
    }

    #[test]
    fn test_deferred_objects_draw_last() {
        let mut manager = manager();
        let mut scene = Scene::new("battle");
        spawn(&mut manager, &mut scene, "overlay");
        spawn(&mut manager, &mut scene, "a");
        scene.create_scene_object("board");
        spawn(&mut manager, &mut scene, "b");
        scene.find_scene_object_mut("overlay").unwrap().deferred_rendering = true;

        let mut frame = FrameRenderer::new();
        frame.begin_frame();
        frame.render_scene(&scene, manager.graphics_mut());
        let commands = frame.end_frame();

        let names: Vec<&str> = commands.iter().map(|c| c.object_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "overlay"]);
        assert!(commands[2].deferred);

        let stats = frame.last_stats();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.deferred_draw_calls, 1);
        assert_eq!(stats.particle_instances, 18);
    }

    #[test]
    fn test_invisible_emitters_are_not_uploaded() {
        let mut manager = manager();
        let mut scene = Scene::new("battle");
        spawn(&mut manager, &mut scene, "shown");
        spawn(&mut manager, &mut scene, "hidden");
        scene.find_scene_object_mut("hidden").unwrap().invisible = true;

        let mut frame = FrameRenderer::new();
        frame.begin_frame();
        frame.render_scene(&scene, manager.graphics_mut());
        let commands = frame.end_frame();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].object_name, "shown");
        assert_eq!(manager.graphics().uploads, 1);
    }

    #[test]
    fn test_uniforms_follow_object_state() {
        let mut manager = manager();
        let mut scene = Scene::new("battle");
        spawn(&mut manager, &mut scene, "faded");
        scene.find_scene_object_mut("faded").unwrap().set_custom_alpha(0.25);

        let mut frame = FrameRenderer::new();
        frame.begin_frame();
        frame.render_scene(&scene, manager.graphics_mut());
        let commands = frame.end_frame();

        let uniforms = commands[0].uniforms;
        assert_eq!(uniforms.custom_alpha, 0.25);
        assert_eq!(uniforms.rotation_axis, [0.0, 1.0, 0.0]);
        assert_eq!(uniforms.proj, scene.camera().projection_matrix());
        assert_eq!(std::mem::size_of::<ParticleUniforms>(), 144);
    }

    #[test]
    fn test_frames_do_not_accumulate() {
        let mut manager = manager();
        let mut scene = Scene::new("battle");
        spawn(&mut manager, &mut scene, "a");

        let mut frame = FrameRenderer::new();
        for _ in 0..3 {
            frame.begin_frame();
            frame.render_scene(&scene, manager.graphics_mut());
            assert_eq!(frame.end_frame().len(), 1);
        }
        assert_eq!(manager.graphics().uploads, 3);
    }
}
