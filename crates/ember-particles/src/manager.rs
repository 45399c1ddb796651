//! Creates, updates and destroys particle emitters living in a scene

use crate::config::ParticleConfig;
use crate::emitter::{CustomUpdate, ParticleEmitterData};
use crate::flags::ParticleFlags;
use crate::graphics::ParticleGraphics;
use crate::host::{EmitterNode, EmitterScene};
use crate::rand::ParticleRng;
use crate::simulation::{self, StepOutcome};
use crate::store::{DefinitionStore, ReloadMode};
use ember_core::{EmberError, ResourceId, ResourceLoader, Result};
use glam::Vec3;
use std::path::Path;

/// Called with a title and message when something goes wrong that the user
/// should see (a missing definition, for instance)
pub type ErrorReporter = Box<dyn Fn(&str, &str)>;

/// Optional arguments for [`ParticleManager::create_particle_emitter_at_position`]
#[derive(Default)]
pub struct EmitterOptions {
    /// Scene object name; generated from the emitter counter when unset
    pub name: Option<String>,
    /// Installed only when the definition has `CUSTOM_UPDATE`
    pub custom_update: Option<Box<dyn CustomUpdate>>,
}

impl EmitterOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_custom_update(mut self, update: impl CustomUpdate + 'static) -> Self {
        self.custom_update = Some(Box::new(update));
        self
    }
}

pub struct ParticleManager<G: ParticleGraphics> {
    store: DefinitionStore,
    graphics: G,
    rng: ParticleRng,
    emitter_count: u64,
    name_prefix: String,
    emitters_to_remove: Vec<String>,
    error_reporter: Option<ErrorReporter>,
}

impl<G: ParticleGraphics> ParticleManager<G> {
    pub fn new(store: DefinitionStore, graphics: G, rng: ParticleRng) -> Self {
        Self {
            store,
            graphics,
            rng,
            emitter_count: 0,
            name_prefix: "particle_emitter_".to_string(),
            emitters_to_remove: Vec::new(),
            error_reporter: None,
        }
    }

    /// Build a manager and load the configured data file
    pub fn from_config(
        config: &ParticleConfig,
        graphics: G,
        loader: &mut dyn ResourceLoader,
    ) -> Result<Self> {
        let mut store = DefinitionStore::new(config.load_settings());
        store.load_from_file(&config.data_file, config.reload_mode(), loader)?;
        let mut manager = Self::new(store, graphics, ParticleRng::from_seed_option(config.rng_seed));
        manager.name_prefix = config.emitter_name_prefix.clone();
        Ok(manager)
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn set_error_reporter(&mut self, reporter: ErrorReporter) {
        self.error_reporter = Some(reporter);
    }

    pub fn definitions(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn definitions_mut(&mut self) -> &mut DefinitionStore {
        &mut self.store
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut G {
        &mut self.graphics
    }

    /// Emitters created so far; also the suffix of the next generated name
    pub fn emitter_count(&self) -> u64 {
        self.emitter_count
    }

    pub fn load_particle_data(
        &mut self,
        path: impl AsRef<Path>,
        reload_mode: ReloadMode,
        loader: &mut dyn ResourceLoader,
    ) -> Result<usize> {
        self.store.load_from_file(path, reload_mode, loader)
    }

    /// Re-read the data file when periodic reloading is on. Existing emitters
    /// keep the definitions they were created with.
    pub fn reload_particles_from_disk(&mut self, loader: &mut dyn ResourceLoader) -> Result<bool> {
        self.store.reload_if_enabled(loader)
    }

    /// Create an emitter from a named definition and add it to the scene as a
    /// new object at `position`.
    ///
    /// Prefilled emitters spawn every slot right away; continuous ones start
    /// empty and fill as they update.
    pub fn create_particle_emitter_at_position<'s, S: EmitterScene>(
        &mut self,
        definition_name: &str,
        position: Vec3,
        scene: &'s mut S,
        options: EmitterOptions,
    ) -> Result<&'s mut S::Node> {
        let Some(definition) = self.store.get(definition_name) else {
            self.report_error(
                "Particle emitter not found",
                &format!("No particle definition named '{definition_name}'"),
            );
            return Err(EmberError::DefinitionNotFound(definition_name.to_string()));
        };

        let flags = definition.flags;
        debug_assert!(
            flags.generation_mode_count() == 1,
            "particle definition '{}' must set exactly one generation mode, has {:?}",
            definition.name,
            flags
        );
        debug_assert!(
            !flags.contains(ParticleFlags::CUSTOM_UPDATE) || options.custom_update.is_some(),
            "particle definition '{}' needs a custom update callback",
            definition.name
        );

        let mut emitter = ParticleEmitterData::new(definition.clone());
        if flags.contains(ParticleFlags::CUSTOM_UPDATE) {
            if let Some(update) = options.custom_update {
                emitter.set_custom_update(update);
            }
        }
        if flags.contains(ParticleFlags::PREFILLED) {
            for i in 0..emitter.particle_count() {
                emitter.spawn_at(i, position, &mut self.rng);
            }
        }

        let handle = self.graphics.allocate(&emitter);
        emitter.set_graphics_handle(handle);

        let name = options
            .name
            .unwrap_or_else(|| format!("{}{}", self.name_prefix, self.emitter_count));
        self.emitter_count += 1;
        tracing::debug!(
            name = %name,
            definition = definition_name,
            particles = emitter.particle_count(),
            "created particle emitter"
        );

        let node = scene.create_node(&name);
        node.set_position(position);
        node.set_render_resources(definition.texture, definition.shader);
        node.attach_emitter(emitter);
        Ok(node)
    }

    /// Respawn the first dead slot of an emitter at the node's position.
    ///
    /// Returns the slot used, or `None` when every particle is alive.
    pub fn spawn_particle_at_first_available_slot<N: EmitterNode>(
        &mut self,
        node: &mut N,
    ) -> Option<usize> {
        let origin = node.position();
        let emitter = node.emitter_mut()?;
        let index = emitter.first_dead_slot()?;
        emitter.spawn_at(index, origin, &mut self.rng);
        Some(index)
    }

    /// Advance every emitter in the scene by `dt_millis`, then remove the
    /// ones that ran out of particles. Returns the names removed this frame.
    pub fn update_scene_particles<S: EmitterScene>(
        &mut self,
        dt_millis: f32,
        scene: &mut S,
    ) -> &[String] {
        self.emitters_to_remove.clear();
        let mut exhausted = Vec::new();

        for (index, node) in scene.nodes_mut().iter_mut().enumerate() {
            let origin = node.position();
            let Some(emitter) = node.emitter_mut() else {
                continue;
            };

            if emitter.flags.contains(ParticleFlags::CUSTOM_UPDATE) {
                if !emitter.run_custom_update(dt_millis) {
                    tracing::warn!("custom-update emitter has no update callback");
                }
                continue;
            }

            let outcome = simulation::step_emitter(emitter, origin, dt_millis, &mut self.rng);
            if outcome == StepOutcome::Exhausted {
                exhausted.push(index);
                self.emitters_to_remove.push(node.name().to_string());
            }
        }

        // Names may repeat across the scene, so remove by position, last first
        for index in exhausted.into_iter().rev() {
            let mut node = scene.remove_node_at(index);
            self.remove_particle_graphics_data(&mut node);
            tracing::debug!(name = node.name(), "removed exhausted particle emitter");
        }
        &self.emitters_to_remove
    }

    /// Remove the named emitter from the scene and free its GPU buffers
    pub fn remove_particle_emitter<S: EmitterScene>(&mut self, name: &str, scene: &mut S) -> bool {
        match scene.remove_emitter_node(name) {
            Some(mut node) => {
                self.remove_particle_graphics_data(&mut node);
                tracing::debug!(name, "removed particle emitter");
                true
            }
            None => false,
        }
    }

    /// Free an emitter's GPU buffers. Safe to call more than once.
    pub fn remove_particle_graphics_data<N: EmitterNode>(&mut self, node: &mut N) {
        debug_assert!(node.emitter().is_some(), "'{}' is not a particle emitter", node.name());
        if let Some(handle) = node.emitter_mut().and_then(|e| e.take_graphics_handle()) {
            self.graphics.release(handle);
        }
    }

    /// Remove every emitter in the scene; returns how many were removed
    pub fn remove_all_particle_emitters<S: EmitterScene>(&mut self, scene: &mut S) -> usize {
        let names: Vec<String> = scene
            .nodes_mut()
            .iter()
            .filter(|n| n.emitter().is_some())
            .map(|n| n.name().to_string())
            .collect();
        names
            .iter()
            .filter(|name| self.remove_particle_emitter(name, scene))
            .count()
    }

    /// Clear `flag` on the named emitter. Clearing `CONTINUOUS_GENERATION`
    /// lets a looping emitter die out and be removed.
    pub fn remove_particle_emitter_flag<S: EmitterScene>(
        &self,
        flag: ParticleFlags,
        name: &str,
        scene: &mut S,
    ) -> bool {
        match scene.find_node_mut(name).and_then(|n| n.emitter_mut()) {
            Some(emitter) => {
                emitter.flags.remove(flag);
                true
            }
            None => false,
        }
    }

    /// Point a definition at a new texture for emitters created afterwards
    pub fn change_particle_texture(&mut self, definition_name: &str, texture: ResourceId) -> bool {
        let changed = self.store.change_texture(definition_name, texture);
        if !changed {
            tracing::warn!(definition = definition_name, "cannot change texture of unknown particle definition");
        }
        changed
    }

    pub fn sort_particles(&self, emitter: &mut ParticleEmitterData) {
        simulation::sort_particles(emitter);
    }

    fn report_error(&self, title: &str, message: &str) {
        tracing::error!("{title}: {message}");
        if let Some(reporter) = &self.error_reporter {
            reporter(title, message);
        }
    }
}
