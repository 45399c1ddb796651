//! Ember Particles - data-driven 2D particle emitters
//!
//! Emitters are created from named definitions loaded out of a JSON data
//! file and live as objects in a scene:
//! - Definitions are parsed once (and optionally re-read every second while
//!   developing) into a [`DefinitionStore`]
//! - Each emitter owns fixed-capacity parallel arrays; dead slots are reused
//! - Particles integrate per millisecond and are depth-sorted every frame
//! - Exhausted non-continuous emitters are removed from the scene, and their
//!   GPU buffers released, at the end of the update

pub mod config;
pub mod definition;
pub mod emitter;
pub mod flags;
pub mod graphics;
pub mod host;
pub mod manager;
pub mod rand;
pub mod simulation;
pub mod store;
mod system;

pub use config::ParticleConfig;
pub use definition::{EmitterDefinition, FloatRange, LoadSettings, RotationAxis, DEFAULT_PARTICLE_SHADER};
pub use emitter::{CustomUpdate, ParticleEmitterData};
pub use flags::ParticleFlags;
pub use graphics::{GraphicsHandle, NullGraphics, ParticleGraphics};
pub use host::{EmitterNode, EmitterScene};
pub use manager::{EmitterOptions, ErrorReporter, ParticleManager};
pub use crate::rand::ParticleRng;
pub use simulation::{sort_particles, step_emitter, StepOutcome};
pub use store::{DefinitionStore, ReloadMode};
pub use system::ParticleSystem;
