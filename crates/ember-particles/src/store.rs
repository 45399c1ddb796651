//! Named emitter definitions loaded from the particle data file

use crate::definition::{EmitterDefinition, LoadSettings};
use ember_core::{EmberError, ResourceId, ResourceLoader, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Top-level key of the particle data file
pub const PARTICLE_DATA_KEY: &str = "particle_data";

/// Whether the data file is re-read while the game runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadMode {
    #[default]
    DontReload,
    ReloadPeriodically,
}

/// Definitions keyed by name.
///
/// Emitters hold an `Arc` to the definition they were created from, so a
/// reload replaces the map without touching live emitters.
#[derive(Debug, Default)]
pub struct DefinitionStore {
    definitions: HashMap<String, Arc<EmitterDefinition>>,
    settings: LoadSettings,
    source: Option<PathBuf>,
    reload_mode: ReloadMode,
}

impl DefinitionStore {
    pub fn new(settings: LoadSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn reload_mode(&self) -> ReloadMode {
        self.reload_mode
    }

    /// Parse a whole data file into a fresh map. Any bad record fails the lot.
    pub fn parse_definitions(
        json: &str,
        settings: &LoadSettings,
        loader: &mut dyn ResourceLoader,
    ) -> Result<HashMap<String, Arc<EmitterDefinition>>> {
        let root: Value = serde_json::from_str(json)?;
        let records = root
            .get(PARTICLE_DATA_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| EmberError::InvalidFieldType {
                field: PARTICLE_DATA_KEY.to_string(),
                expected: "array".to_string(),
            })?;

        let mut definitions = HashMap::with_capacity(records.len());
        for record in records {
            let definition = EmitterDefinition::from_json(record, settings, loader)?;
            if definitions.contains_key(&definition.name) {
                tracing::warn!(name = %definition.name, "duplicate particle definition, keeping the later one");
            }
            definitions.insert(definition.name.clone(), Arc::new(definition));
        }
        Ok(definitions)
    }

    /// Replace the store's contents with the definitions in `json`.
    ///
    /// On error the previous definitions are kept.
    pub fn load_from_str(&mut self, json: &str, loader: &mut dyn ResourceLoader) -> Result<usize> {
        let definitions = Self::parse_definitions(json, &self.settings, loader)?;
        self.definitions = definitions;
        Ok(self.definitions.len())
    }

    /// Load the data file at `path` and remember it for later reloads
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        reload_mode: ReloadMode,
        loader: &mut dyn ResourceLoader,
    ) -> Result<usize> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let count = self.load_from_str(&contents, loader)?;
        self.source = Some(path.to_path_buf());
        self.reload_mode = reload_mode;
        tracing::info!(path = %path.display(), count, "loaded particle definitions");
        Ok(count)
    }

    /// Re-read the remembered data file if periodic reloading is enabled.
    ///
    /// Returns whether a reload happened.
    pub fn reload_if_enabled(&mut self, loader: &mut dyn ResourceLoader) -> Result<bool> {
        if self.reload_mode == ReloadMode::DontReload {
            return Ok(false);
        }
        let Some(path) = self.source.clone() else {
            return Ok(false);
        };
        let contents = std::fs::read_to_string(&path)?;
        let count = self.load_from_str(&contents, loader)?;
        tracing::debug!(path = %path.display(), count, "reloaded particle definitions");
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<Arc<EmitterDefinition>> {
        self.definitions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Definition names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Add or replace a definition built in code
    pub fn insert(&mut self, definition: EmitterDefinition) {
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
    }

    /// Point a definition at another texture. Emitters already created keep
    /// the texture they were created with.
    pub fn change_texture(&mut self, name: &str, texture: ResourceId) -> bool {
        match self.definitions.get_mut(name) {
            Some(definition) => {
                Arc::make_mut(definition).texture = texture;
                true
            }
            None => false,
        }
    }

    /// Serialize every definition in the data file format, sorted by name
    pub fn export_json(&self) -> Value {
        let records: Vec<Value> = self
            .names()
            .into_iter()
            .filter_map(|name| self.definitions.get(name))
            .map(|d| d.to_json())
            .collect();
        json!({ PARTICLE_DATA_KEY: records })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_json())?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::flags::ParticleFlags;
    use ember_core::ResourceRegistry;

    pub(crate) const FIXTURE: &str = r#"{
        "particle_data": [
            {
                "name": "smoke",
                "texture": "smoke.png",
                "particle_count": 8,
                "prefilled": false,
                "continuous_generation": true,
                "enlarge_over_time": true,
                "rotate_over_time": true,
                "initially_rotated": true,
                "custom_update": false,
                "lifetime_range": { "min": 1.0, "max": 2.0 },
                "position_x_range": { "min": -0.05, "max": 0.05 },
                "position_y_range": { "min": 0.0, "max": 0.1 },
                "velocity_x_range": { "min": -0.0001, "max": 0.0001 },
                "velocity_y_range": { "min": 0.0002, "max": 0.0004 },
                "particle_size_range": { "min": 0.05, "max": 0.1 },
                "gravity_velocity": { "x": 0.0, "y": 0.0000001 },
                "particle_enlargement_speed": 0.00005,
                "particle_generation_delay_secs": 0.1,
                "particle_rotation_speed": 0.001,
                "particle_initial_angle_range": { "min": 0.0, "max": 3.14 },
                "rotation_axis": "z"
            },
            {
                "name": "burst",
                "texture": "spark.png",
                "shader": "additive_particle.wgsl",
                "particle_count": 16,
                "prefilled": true,
                "continuous_generation": false,
                "enlarge_over_time": false,
                "rotate_over_time": false,
                "initially_rotated": false,
                "custom_update": false,
                "lifetime_range": { "min": 0.2, "max": 0.6 },
                "position_x_range": { "min": -0.01, "max": 0.01 },
                "position_y_range": { "min": -0.01, "max": 0.01 },
                "velocity_x_range": { "min": -0.002, "max": 0.002 },
                "velocity_y_range": { "min": 0.001, "max": 0.003 },
                "particle_size_range": { "min": 0.01, "max": 0.03 },
                "gravity_velocity": { "x": 0.0, "y": -0.000005 }
            },
            {
                "name": "scripted",
                "texture": "spark.png",
                "particle_count": 4,
                "prefilled": false,
                "continuous_generation": false,
                "enlarge_over_time": false,
                "rotate_over_time": false,
                "initially_rotated": false,
                "custom_update": true,
                "lifetime_range": { "min": 1.0, "max": 1.0 },
                "position_x_range": { "min": 0.0, "max": 0.0 },
                "position_y_range": { "min": 0.0, "max": 0.0 },
                "particle_size_range": { "min": 0.02, "max": 0.02 }
            }
        ]
    }"#;

    pub(crate) fn fixture_store(registry: &mut ResourceRegistry) -> DefinitionStore {
        let mut store = DefinitionStore::new(LoadSettings::default());
        store.load_from_str(FIXTURE, registry).unwrap();
        store
    }

    #[test]
    fn load_fixture() {
        let mut registry = ResourceRegistry::new();
        let store = fixture_store(&mut registry);
        assert_eq!(store.len(), 3);
        assert_eq!(store.names(), vec!["burst", "scripted", "smoke"]);

        let smoke = store.get("smoke").unwrap();
        assert!(smoke.flags.contains(ParticleFlags::CONTINUOUS_GENERATION));
        assert_eq!(smoke.generation_delay_secs, 0.1);

        let burst = store.get("burst").unwrap();
        assert_eq!(
            registry.path(burst.shader),
            Some("shaders/additive_particle.wgsl")
        );
    }

    #[test]
    fn missing_top_level_key_is_an_error() {
        let mut registry = ResourceRegistry::new();
        let mut store = DefinitionStore::default();
        let err = store.load_from_str(r#"{ "particles": [] }"#, &mut registry);
        assert!(matches!(err, Err(EmberError::InvalidFieldType { .. })));
    }

    #[test]
    fn failed_load_keeps_previous_definitions() {
        let mut registry = ResourceRegistry::new();
        let mut store = fixture_store(&mut registry);
        assert!(store.load_from_str("{ not json", &mut registry).is_err());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn change_texture_does_not_affect_held_definitions() {
        let mut registry = ResourceRegistry::new();
        let mut store = fixture_store(&mut registry);
        let held = store.get("burst").unwrap();
        let new_texture = ResourceId::from_raw(999);

        assert!(store.change_texture("burst", new_texture));
        assert!(!store.change_texture("nope", new_texture));
        assert_eq!(store.get("burst").unwrap().texture, new_texture);
        assert_ne!(held.texture, new_texture);
    }

    #[test]
    fn export_then_load_gives_equal_definitions() {
        let mut registry = ResourceRegistry::new();
        let store = fixture_store(&mut registry);
        let exported = store.to_json_string().unwrap();

        let mut reloaded = DefinitionStore::new(LoadSettings::default());
        reloaded.load_from_str(&exported, &mut registry).unwrap();

        for name in store.names() {
            assert_eq!(store.get(name), reloaded.get(name), "{name} differs after export");
        }
    }

    #[test]
    fn reload_from_file_picks_up_edits() {
        let mut registry = ResourceRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particle_data.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let mut store = DefinitionStore::default();
        store
            .load_from_file(&path, ReloadMode::ReloadPeriodically, &mut registry)
            .unwrap();
        assert_eq!(store.len(), 3);

        std::fs::write(&path, r#"{ "particle_data": [] }"#).unwrap();
        assert!(store.reload_if_enabled(&mut registry).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn reload_disabled_is_a_no_op() {
        let mut registry = ResourceRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particle_data.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let mut store = DefinitionStore::default();
        store
            .load_from_file(&path, ReloadMode::DontReload, &mut registry)
            .unwrap();
        std::fs::write(&path, r#"{ "particle_data": [] }"#).unwrap();
        assert!(!store.reload_if_enabled(&mut registry).unwrap());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn failed_file_load_keeps_previous_source() {
        let mut registry = ResourceRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("particle_data.json");
        let broken = dir.path().join("broken.json");
        std::fs::write(&good, FIXTURE).unwrap();
        std::fs::write(&broken, "{ not json").unwrap();

        let mut store = DefinitionStore::default();
        store
            .load_from_file(&good, ReloadMode::ReloadPeriodically, &mut registry)
            .unwrap();

        let missing = dir.path().join("missing.json");
        assert!(store.load_from_file(&missing, ReloadMode::DontReload, &mut registry).is_err());
        assert!(store.load_from_file(&broken, ReloadMode::DontReload, &mut registry).is_err());

        assert_eq!(store.source(), Some(good.as_path()));
        assert_eq!(store.reload_mode(), ReloadMode::ReloadPeriodically);
        assert_eq!(store.len(), 3);
        assert!(store.reload_if_enabled(&mut registry).unwrap());
    }
}
