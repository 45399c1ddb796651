//! Frame-loop integration

use crate::graphics::ParticleGraphics;
use crate::host::EmitterScene;
use crate::manager::ParticleManager;
use crate::store::ReloadMode;
use ember_core::{ResourceLoader, Result};
use ember_runtime::RuntimeSystem;

/// Drives a [`ParticleManager`] from the game loop as a [`RuntimeSystem`].
///
/// Each frame it optionally re-reads the data file (once per reload
/// interval) and then updates every emitter in the scene.
pub struct ParticleSystem<G: ParticleGraphics> {
    pub manager: ParticleManager<G>,
    loader: Box<dyn ResourceLoader>,
    reload_interval_secs: f32,
    reload_accumulator_secs: f32,
}

impl<G: ParticleGraphics> ParticleSystem<G> {
    pub fn new(
        manager: ParticleManager<G>,
        loader: Box<dyn ResourceLoader>,
        reload_interval_secs: f32,
    ) -> Self {
        Self {
            manager,
            loader,
            reload_interval_secs,
            reload_accumulator_secs: 0.0,
        }
    }

    pub fn loader_mut(&mut self) -> &mut dyn ResourceLoader {
        self.loader.as_mut()
    }

    fn tick_hot_reload(&mut self, dt_millis: f32) {
        if self.manager.definitions().reload_mode() == ReloadMode::DontReload {
            return;
        }
        self.reload_accumulator_secs += dt_millis / 1000.0;
        if self.reload_accumulator_secs < self.reload_interval_secs {
            return;
        }
        self.reload_accumulator_secs -= self.reload_interval_secs;
        if let Err(e) = self.manager.reload_particles_from_disk(self.loader.as_mut()) {
            tracing::warn!("particle data reload failed, keeping previous definitions: {e}");
        }
    }
}

impl<S: EmitterScene, G: ParticleGraphics> RuntimeSystem<S> for ParticleSystem<G> {
    fn initialize(&mut self, _world: &mut S) -> Result<()> {
        tracing::info!(
            definitions = self.manager.definitions().len(),
            hot_reload = self.manager.definitions().reload_mode() == ReloadMode::ReloadPeriodically,
            "particle system ready"
        );
        Ok(())
    }

    fn update(&mut self, world: &mut S, dt_millis: f32) -> Result<()> {
        self.tick_hot_reload(dt_millis);
        self.manager.update_scene_particles(dt_millis, world);
        Ok(())
    }

    fn shutdown(&mut self, world: &mut S) -> Result<()> {
        let removed = self.manager.remove_all_particle_emitters(world);
        tracing::info!(removed, "particle system shut down");
        Ok(())
    }

    fn name(&self) -> &str {
        "particles"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::NullGraphics;
    use crate::manager::tests::TestScene;
    use crate::manager::EmitterOptions;
    use crate::rand::ParticleRng;
    use crate::store::tests::FIXTURE;
    use crate::store::DefinitionStore;
    use ember_core::ResourceRegistry;
    use glam::Vec3;

    fn system_with_file(path: &std::path::Path, mode: ReloadMode) -> ParticleSystem<NullGraphics> {
        let mut registry = ResourceRegistry::new();
        let mut store = DefinitionStore::default();
        store.load_from_file(path, mode, &mut registry).unwrap();
        let manager = ParticleManager::new(store, NullGraphics::new(), ParticleRng::new(9));
        ParticleSystem::new(manager, Box::new(registry), 1.0)
    }

    #[test]
    fn reload_happens_once_per_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particle_data.json");
        std::fs::write(&path, FIXTURE).unwrap();
        let mut system = system_with_file(&path, ReloadMode::ReloadPeriodically);
        let mut scene = TestScene::default();

        std::fs::write(&path, r#"{ "particle_data": [] }"#).unwrap();
        system.update(&mut scene, 600.0).unwrap();
        assert_eq!(system.manager.definitions().len(), 3);
        system.update(&mut scene, 600.0).unwrap();
        assert!(system.manager.definitions().is_empty());
    }

    #[test]
    fn broken_reload_keeps_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particle_data.json");
        std::fs::write(&path, FIXTURE).unwrap();
        let mut system = system_with_file(&path, ReloadMode::ReloadPeriodically);
        let mut scene = TestScene::default();

        std::fs::write(&path, "{ \"particle_data\": [ { \"name\": 3 } ] }").unwrap();
        system.update(&mut scene, 1500.0).unwrap();
        assert_eq!(system.manager.definitions().len(), 3);
    }

    #[test]
    fn update_and_shutdown_drive_the_manager() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particle_data.json");
        std::fs::write(&path, FIXTURE).unwrap();
        let mut system = system_with_file(&path, ReloadMode::DontReload);
        let mut scene = TestScene::default();
        system.initialize(&mut scene).unwrap();

        system
            .manager
            .create_particle_emitter_at_position("smoke", Vec3::ZERO, &mut scene, EmitterOptions::default())
            .unwrap();
        system
            .manager
            .create_particle_emitter_at_position("burst", Vec3::ZERO, &mut scene, EmitterOptions::default())
            .unwrap();

        system.update(&mut scene, 16.0).unwrap();
        assert_eq!(scene.nodes[0].emitter.as_ref().unwrap().alive_count(), 1);

        system.shutdown(&mut scene).unwrap();
        assert!(scene.nodes.is_empty());
        assert_eq!(system.manager.graphics().live_count(), 0);
    }
}
