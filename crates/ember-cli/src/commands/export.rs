//! Re-emit loaded definitions in the data file format

use super::load_store;
use anyhow::{Context, Result};
use ember_core::ResourceRegistry;
use ember_particles::{ParticleConfig, ReloadMode};
use std::path::Path;

pub fn run(config: &ParticleConfig, output: Option<&Path>) -> Result<()> {
    let mut registry = ResourceRegistry::new();
    let store = load_store(config, ReloadMode::DontReload, &mut registry)?;
    let json = store.to_json_string().context("Failed to serialize definitions")?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} definition(s) to {}", store.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_particles::DefinitionStore;

    #[test]
    fn test_export_reloads_to_same_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let config = super::super::tests::sample_config(&dir);
        let exported = dir.path().join("exported.json");
        run(&config, Some(&exported)).unwrap();

        let mut registry = ResourceRegistry::new();
        let original = load_store(&config, ReloadMode::DontReload, &mut registry).unwrap();
        let mut reloaded = DefinitionStore::new(config.load_settings());
        reloaded
            .load_from_file(&exported, ReloadMode::DontReload, &mut registry)
            .unwrap();

        assert_eq!(reloaded.names(), original.names());
        for name in original.names() {
            assert_eq!(reloaded.get(name), original.get(name));
        }
    }
}
