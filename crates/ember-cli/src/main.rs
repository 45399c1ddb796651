//! Ember CLI - inspect, simulate and render particle definitions

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{export, render, simulate, validate, watch};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Data-driven 2D particle emitters", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of ~/.ember/config.toml and ./ember.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Particle data file (overrides the configured one)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the particle data file and list its definitions
    Validate,

    /// Re-emit the loaded definitions in the data file format
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run emitters headless and report particle counts
    Simulate {
        /// Definition name to instantiate
        emitter: String,

        /// Number of emitters to create
        #[arg(long, default_value = "1")]
        count: usize,

        /// Frames to run
        #[arg(long, default_value = "120")]
        frames: u32,

        /// Frame delta in milliseconds
        #[arg(long, default_value = "16.0")]
        frame_millis: f32,

        /// Emitter position (comma-separated x,y,z)
        #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
        at: [f32; 3],

        /// RNG seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Simulate an emitter and render the final frame to a PNG image (headless)
    Render {
        /// Definition name to instantiate
        emitter: String,

        /// Output image path
        #[arg(short, long, default_value = "particles.png")]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value = "512")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "1024")]
        height: u32,

        /// Frames to simulate before capturing
        #[arg(long, default_value = "60")]
        frames: u32,

        /// Frame delta in milliseconds
        #[arg(long, default_value = "16.0")]
        frame_millis: f32,

        /// Emitter position (comma-separated x,y,z)
        #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
        at: [f32; 3],

        /// Camera zoom
        #[arg(long, default_value = "1.0")]
        zoom: f32,

        /// Directory texture and shader paths are resolved against
        #[arg(long, default_value = ".")]
        assets: PathBuf,

        /// RNG seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Watch the particle data file and reload it on change
    Watch,
}

fn parse_vec3(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    let z: f32 = parts[2].trim().parse().map_err(|e| format!("invalid z: {}", e))?;
    Ok([x, y, z])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.data)?;

    match cli.command {
        Commands::Validate => validate::run(&config),
        Commands::Export { output } => export::run(&config, output.as_deref()),
        Commands::Simulate {
            emitter,
            count,
            frames,
            frame_millis,
            at,
            seed,
            format,
        } => simulate::run(
            config,
            simulate::SimulateArgs {
                emitter,
                count,
                frames,
                frame_millis,
                at,
                seed,
                format,
            },
        ),
        Commands::Render {
            emitter,
            output,
            width,
            height,
            frames,
            frame_millis,
            at,
            zoom,
            assets,
            seed,
        } => render::run(
            config,
            render::RenderArgs {
                emitter,
                output,
                width,
                height,
                frames,
                frame_millis,
                at,
                zoom,
                assets,
                seed,
            },
        ),
        Commands::Watch => watch::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1, 2.5,-3").unwrap(), [1.0, 2.5, -3.0]);
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,b,3").is_err());
    }
}
