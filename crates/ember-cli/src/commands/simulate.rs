//! Headless simulation command

use super::load_store;
use anyhow::{bail, Context, Result};
use ember_core::ResourceRegistry;
use ember_particles::{
    EmitterNode, EmitterOptions, NullGraphics, ParticleConfig, ParticleManager, ParticleRng,
    ParticleSystem,
};
use ember_runtime::{GameClock, RuntimeSystem};
use ember_scene::Scene;
use glam::Vec3;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

pub struct SimulateArgs {
    pub emitter: String,
    pub count: usize,
    pub frames: u32,
    pub frame_millis: f32,
    pub at: [f32; 3],
    pub seed: Option<u64>,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct SecondSample {
    pub second: u32,
    pub frames: u32,
    pub emitters: usize,
    pub alive_particles: usize,
}

#[derive(Debug, Serialize)]
pub struct RemovedEmitter {
    pub frame: u32,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub definition: String,
    pub frames: u32,
    pub frame_millis: f32,
    pub samples: Vec<SecondSample>,
    pub removed: Vec<RemovedEmitter>,
    pub final_emitters: usize,
    pub final_alive_particles: usize,
    /// Buffers still allocated after shutdown; anything but zero is a leak
    pub leaked_graphics: usize,
}

pub fn run(config: ParticleConfig, args: SimulateArgs) -> Result<()> {
    let report = simulate(&config, &args)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_report(&report),
        other => bail!("Unknown format '{}'; expected text or json", other),
    }
    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!(
        "Simulated '{}' for {} frame(s) at {} ms",
        report.definition, report.frames, report.frame_millis
    );
    for sample in &report.samples {
        println!(
            "  t={}s  frames={}  emitters={}  alive={}",
            sample.second, sample.frames, sample.emitters, sample.alive_particles
        );
    }
    for removed in &report.removed {
        println!("  frame {}: removed {}", removed.frame, removed.name);
    }
    println!(
        "Final: {} emitter(s), {} alive particle(s)",
        report.final_emitters, report.final_alive_particles
    );
    if report.leaked_graphics > 0 {
        println!("Warning: {} particle buffer(s) still allocated", report.leaked_graphics);
    }
}

pub fn simulate(config: &ParticleConfig, args: &SimulateArgs) -> Result<SimulationReport> {
    let mut registry = ResourceRegistry::new();
    let store = load_store(config, config.reload_mode(), &mut registry)?;
    let rng = ParticleRng::from_seed_option(args.seed.or(config.rng_seed));
    let manager = ParticleManager::new(store, NullGraphics::new(), rng)
        .with_name_prefix(config.emitter_name_prefix.clone());

    let mut system = ParticleSystem::new(manager, Box::new(registry), config.reload_interval_secs);
    let mut scene = Scene::new("simulate");
    system.initialize(&mut scene)?;

    let origin = Vec3::from_array(args.at);
    for _ in 0..args.count {
        system
            .manager
            .create_particle_emitter_at_position(&args.emitter, origin, &mut scene, EmitterOptions::default())
            .with_context(|| format!("Failed to create emitter '{}'", args.emitter))?;
    }

    let mut clock = GameClock::new();
    let mut samples = Vec::new();
    let mut removed = Vec::new();
    let frame_duration = Duration::from_secs_f32(args.frame_millis.max(0.0) / 1000.0);

    for frame in 0..args.frames {
        let before = emitter_names(&scene);

        clock.advance(frame_duration);
        system.update(&mut scene, clock.delta_millis)?;

        let after = emitter_names(&scene);
        removed.extend(before.difference(&after).map(|name| RemovedEmitter {
            frame,
            name: name.clone(),
        }));

        let frames_this_second = clock.frames_this_second;
        if clock.take_elapsed_second() {
            samples.push(SecondSample {
                second: samples.len() as u32 + 1,
                frames: frames_this_second,
                emitters: after.len(),
                alive_particles: alive_particles(&scene),
            });
        }
    }

    let final_emitters = emitter_names(&scene).len();
    let final_alive_particles = alive_particles(&scene);

    system.shutdown(&mut scene)?;
    tracing::debug!(
        allocations = system.manager.graphics().allocations,
        uploads = system.manager.graphics().uploads,
        releases = system.manager.graphics().releases,
        "simulation graphics"
    );

    removed.sort_by(|a, b| a.frame.cmp(&b.frame).then_with(|| a.name.cmp(&b.name)));
    Ok(SimulationReport {
        definition: args.emitter.clone(),
        frames: args.frames,
        frame_millis: args.frame_millis,
        samples,
        removed,
        final_emitters,
        final_alive_particles,
        leaked_graphics: system.manager.graphics().live_count(),
    })
}

fn emitter_names(scene: &Scene) -> HashSet<String> {
    scene
        .scene_objects()
        .iter()
        .filter(|o| o.is_particle_emitter())
        .map(|o| o.name.clone())
        .collect()
}

fn alive_particles(scene: &Scene) -> usize {
    scene
        .scene_objects()
        .iter()
        .filter_map(|o| o.emitter())
        .map(|e| e.alive_count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(emitter: &str, frames: u32) -> SimulateArgs {
        SimulateArgs {
            emitter: emitter.to_string(),
            count: 1,
            frames,
            frame_millis: 16.0,
            at: [0.0, 0.0, 1.0],
            seed: Some(9),
            format: "text".to_string(),
        }
    }

    #[test]
    fn test_prefilled_burst_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let config = super::super::tests::sample_config(&dir);

        let report = simulate(&config, &args("pop", 30)).unwrap();
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].name, "particle_emitter_0");
        assert_eq!(report.final_emitters, 0);
        assert_eq!(report.leaked_graphics, 0);
    }

    #[test]
    fn test_continuous_emitter_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = super::super::tests::sample_config(&dir);

        let mut run = args("embers", 120);
        run.count = 2;
        let report = simulate(&config, &run).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.final_emitters, 2);
        assert!(report.final_alive_particles > 0);
        assert_eq!(report.samples.len(), 1);
        assert_eq!(report.samples[0].emitters, 2);
        assert_eq!(report.leaked_graphics, 0);
    }

    #[test]
    fn test_unknown_definition_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = super::super::tests::sample_config(&dir);

        let err = simulate(&config, &args("missing", 10)).unwrap_err();
        assert!(format!("{err:#}").contains("missing"));
    }
}
