//! Random draws for particle spawning

use crate::definition::FloatRange;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Relative spread applied to a particle's depth so that coplanar particles
/// still get distinct sort keys
pub const DEPTH_JITTER: f32 = 0.0001;

pub struct ParticleRng {
    rng: StdRng,
}

impl ParticleRng {
    /// Deterministic generator, for tests and reproducible headless runs
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        }
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// `min + u * (max - min)`, so `min == max` always yields `min`
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    pub fn range_of(&mut self, range: FloatRange) -> f32 {
        self.range(range.min, range.max)
    }

    pub fn depth_jitter(&mut self, z: f32) -> f32 {
        self.range(z - z * DEPTH_JITTER, z + z * DEPTH_JITTER)
    }
}
