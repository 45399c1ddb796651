//! Watch the particle data file and reload it on change

use super::load_store;
use anyhow::{Context, Result};
use ember_core::ResourceRegistry;
use ember_particles::{DefinitionStore, ParticleConfig, ReloadMode};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::sync::mpsc;
use std::time::Duration;

pub fn run(config: &ParticleConfig) -> Result<()> {
    let mut registry = ResourceRegistry::new();
    let mut store = load_store(config, ReloadMode::ReloadPeriodically, &mut registry)?;
    println!(
        "Loaded {} definition(s) from {}",
        store.len(),
        config.data_file.display()
    );

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
        .context("Failed to create file watcher")?;
    debouncer
        .watcher()
        .watch(&config.data_file, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", config.data_file.display()))?;

    println!("Watching for changes...");
    for result in rx {
        match result {
            Ok(_events) => {
                let before = store.len();
                match reload(&mut store, &mut registry) {
                    Ok(count) => println!("Reloaded {} definition(s) (was {})", count, before),
                    Err(e) => eprintln!("Reload failed, keeping previous definitions: {:#}", e),
                }
            }
            Err(e) => eprintln!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// Re-read the store's source; the old definitions survive a failed parse
pub fn reload(store: &mut DefinitionStore, registry: &mut ResourceRegistry) -> Result<usize> {
    store
        .reload_if_enabled(registry)
        .context("Failed to reload particle data")?;
    Ok(store.len())
}
