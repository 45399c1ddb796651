//! Layered particle configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `EMBER_PARTICLE_DATA`, `EMBER_HOT_RELOAD`, `EMBER_RNG_SEED`
//! 2. Project-local: `ember.toml`
//! 3. Global: `~/.ember/config.toml`

use crate::definition::{LoadSettings, DEFAULT_PARTICLE_SHADER};
use crate::store::ReloadMode;
use ember_core::{EmberError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[particles]` table as written in a config file; unset keys fall through
/// to the layer below
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleSection {
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default)]
    pub hot_reload: Option<bool>,
    #[serde(default)]
    pub reload_interval_secs: Option<f32>,
    #[serde(default)]
    pub rng_seed: Option<u64>,
    #[serde(default)]
    pub emitter_name_prefix: Option<String>,
    #[serde(default)]
    pub textures_root: Option<String>,
    #[serde(default)]
    pub shaders_root: Option<String>,
    #[serde(default)]
    pub default_shader: Option<String>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmberConfigFile {
    #[serde(default)]
    pub particles: ParticleSection,
}

/// Resolved particle configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    pub data_file: PathBuf,
    pub hot_reload: bool,
    pub reload_interval_secs: f32,
    /// Fixed seed for reproducible runs; entropy when unset
    pub rng_seed: Option<u64>,
    pub emitter_name_prefix: String,
    pub textures_root: String,
    pub shaders_root: String,
    pub default_shader: String,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/particle_data.json"),
            hot_reload: cfg!(debug_assertions),
            reload_interval_secs: 1.0,
            rng_seed: None,
            emitter_name_prefix: "particle_emitter_".to_string(),
            textures_root: "textures/".to_string(),
            shaders_root: "shaders/".to_string(),
            default_shader: DEFAULT_PARTICLE_SHADER.to_string(),
        }
    }
}

impl ParticleConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Layer 1: Global config (~/.ember/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?.particles);
            }
        }

        // Layer 2: Project-local config (ember.toml)
        let local_path = PathBuf::from("ember.toml");
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?.particles);
        }

        // Layer 3: Environment variable overrides
        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Load config from a specific file path only, over the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::load_file(path)?.particles);
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: EmberConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.merge(file.particles);
        Ok(config)
    }

    pub fn reload_mode(&self) -> ReloadMode {
        if self.hot_reload {
            ReloadMode::ReloadPeriodically
        } else {
            ReloadMode::DontReload
        }
    }

    pub fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            textures_root: self.textures_root.clone(),
            shaders_root: self.shaders_root.clone(),
            default_shader: self.default_shader.clone(),
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ember").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<EmberConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            EmberError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge(&mut self, overlay: ParticleSection) {
        if let Some(v) = overlay.data_file {
            self.data_file = v;
        }
        if let Some(v) = overlay.hot_reload {
            self.hot_reload = v;
        }
        if let Some(v) = overlay.reload_interval_secs {
            if v > 0.0 {
                self.reload_interval_secs = v;
            } else {
                tracing::warn!(value = v, "ignoring non-positive reload_interval_secs");
            }
        }
        if overlay.rng_seed.is_some() {
            self.rng_seed = overlay.rng_seed;
        }
        if let Some(v) = overlay.emitter_name_prefix {
            self.emitter_name_prefix = v;
        }
        if let Some(v) = overlay.textures_root {
            self.textures_root = v;
        }
        if let Some(v) = overlay.shaders_root {
            self.shaders_root = v;
        }
        if let Some(v) = overlay.default_shader {
            self.default_shader = v;
        }
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("EMBER_PARTICLE_DATA") {
            self.data_file = PathBuf::from(path);
        }
        if let Some(value) = lookup("EMBER_HOT_RELOAD") {
            match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.hot_reload = true,
                "0" | "false" | "no" | "off" => self.hot_reload = false,
                other => tracing::warn!(value = other, "ignoring unrecognised EMBER_HOT_RELOAD"),
            }
        }
        if let Some(value) = lookup("EMBER_RNG_SEED") {
            match value.parse::<u64>() {
                Ok(seed) => self.rng_seed = Some(seed),
                Err(_) => tracing::warn!(value = %value, "ignoring non-numeric EMBER_RNG_SEED"),
            }
        }
    }
}
