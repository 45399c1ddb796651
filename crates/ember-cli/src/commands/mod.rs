pub mod export;
pub mod render;
pub mod simulate;
pub mod validate;
pub mod watch;

use anyhow::{Context, Result};
use ember_core::ResourceLoader;
use ember_particles::{DefinitionStore, ParticleConfig, ReloadMode};
use std::path::{Path, PathBuf};

/// Layered config, or a single explicit file, with the `--data` override on top
pub fn load_config(config_path: Option<&Path>, data: Option<PathBuf>) -> Result<ParticleConfig> {
    let mut config = match config_path {
        Some(path) => ParticleConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ParticleConfig::load().context("Failed to load config")?,
    };
    if let Some(data) = data {
        config.data_file = data;
    }
    Ok(config)
}

/// Load the configured data file into a fresh store
pub fn load_store(
    config: &ParticleConfig,
    reload_mode: ReloadMode,
    loader: &mut dyn ResourceLoader,
) -> Result<DefinitionStore> {
    let mut store = DefinitionStore::new(config.load_settings());
    store
        .load_from_file(&config.data_file, reload_mode, loader)
        .with_context(|| format!("Failed to load particle data {}", config.data_file.display()))?;
    Ok(store)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE: &str = r#"{
        "particle_data": [
            {
                "name": "embers",
                "texture": "ember.png",
                "particle_count": 12,
                "prefilled": false,
                "continuous_generation": true,
                "enlarge_over_time": false,
                "rotate_over_time": true,
                "initially_rotated": false,
                "custom_update": false,
                "lifetime_range": { "min": 0.5, "max": 1.5 },
                "position_x_range": { "min": -0.02, "max": 0.02 },
                "position_y_range": { "min": 0.0, "max": 0.0 },
                "velocity_y_range": { "min": 0.0005, "max": 0.001 },
                "particle_size_range": { "min": 0.02, "max": 0.04 },
                "particle_generation_delay_secs": 0.05,
                "particle_rotation_speed": 0.002,
                "rotation_axis": "z"
            },
            {
                "name": "pop",
                "texture": "spark.png",
                "shader": "additive_particle.wgsl",
                "particle_count": 6,
                "prefilled": true,
                "continuous_generation": false,
                "enlarge_over_time": false,
                "rotate_over_time": false,
                "initially_rotated": false,
                "custom_update": false,
                "lifetime_range": { "min": 0.1, "max": 0.3 },
                "position_x_range": { "min": 0.0, "max": 0.0 },
                "position_y_range": { "min": 0.0, "max": 0.0 },
                "particle_size_range": { "min": 0.01, "max": 0.01 }
            }
        ]
    }"#;

    pub(crate) fn sample_config(dir: &tempfile::TempDir) -> ParticleConfig {
        let path = dir.path().join("particle_data.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let mut config = ParticleConfig::default();
        config.data_file = path;
        config.hot_reload = false;
        config.rng_seed = Some(5);
        config
    }

    #[test]
    fn test_load_store_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ParticleConfig::default();
        config.data_file = dir.path().join("nope.json");

        let mut registry = ember_core::ResourceRegistry::new();
        let err = load_store(&config, ReloadMode::DontReload, &mut registry).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }

    #[test]
    fn test_data_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("ember.toml");
        std::fs::write(&config_path, "[particles]\ndata_file = \"a.json\"\n").unwrap();

        let config = load_config(Some(&config_path), Some(PathBuf::from("b.json"))).unwrap();
        assert_eq!(config.data_file, PathBuf::from("b.json"));
    }
}
