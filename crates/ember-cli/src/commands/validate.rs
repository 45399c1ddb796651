//! Particle data validation command

use super::load_store;
use anyhow::Result;
use ember_core::ResourceRegistry;
use ember_particles::{EmitterDefinition, ParticleConfig, ReloadMode};

pub fn run(config: &ParticleConfig) -> Result<()> {
    let mut registry = ResourceRegistry::new();
    let store = load_store(config, ReloadMode::DontReload, &mut registry)?;

    println!("Loaded {} definition(s) from {}", store.len(), config.data_file.display());

    let mut warnings = 0;
    for name in store.names() {
        let Some(definition) = store.get(name) else {
            continue;
        };
        println!("  {}", describe(&definition, &registry));
        for warning in lint(&definition) {
            println!("    warning: {}", warning);
            warnings += 1;
        }
    }

    if warnings > 0 {
        println!("\n{} warning(s)", warnings);
    }
    Ok(())
}

/// One-line summary of a definition
pub fn describe(definition: &EmitterDefinition, registry: &ResourceRegistry) -> String {
    let texture = registry.path(definition.texture).unwrap_or("<none>");
    let shader = registry.path(definition.shader).unwrap_or("<none>");
    format!(
        "{} x{} [{:?}] texture={} shader={}",
        definition.name, definition.particle_count, definition.flags, texture, shader
    )
}

/// Problems that load fine but make an emitter misbehave
pub fn lint(definition: &EmitterDefinition) -> Vec<String> {
    let mut warnings = Vec::new();

    match definition.flags.generation_mode_count() {
        1 => {}
        0 => warnings.push(
            "no generation mode set (prefilled, continuous_generation or custom_update)".to_string(),
        ),
        n => warnings.push(format!("{} generation modes set, expected exactly one", n)),
    }
    if definition.particle_count == 0 {
        warnings.push("particle_count is 0".to_string());
    }
    if definition.lifetime_range.max <= 0.0 {
        warnings.push("lifetime_range never yields a live particle".to_string());
    }
    for (field, range) in [
        ("lifetime_range", definition.lifetime_range),
        ("particle_size_range", definition.size_range),
        ("position_x_range", definition.position_x_range),
        ("position_y_range", definition.position_y_range),
    ] {
        if range.min > range.max {
            warnings.push(format!("{} has min > max", field));
        }
    }

    warnings
}
