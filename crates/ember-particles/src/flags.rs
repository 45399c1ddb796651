//! Emitter behaviour flags

use bitflags::bitflags;

bitflags! {
    /// Behaviour bits shared by emitter definitions and live emitters.
    ///
    /// Exactly one generation mode (PREFILLED, CONTINUOUS_GENERATION or
    /// CUSTOM_UPDATE) must be set when an emitter is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParticleFlags: u8 {
        /// Every slot is spawned when the emitter is created
        const PREFILLED             = 0x01;
        /// Dead slots respawn, throttled by the generation delay
        const CONTINUOUS_GENERATION = 0x02;
        /// Size grows by the enlargement speed every tick
        const ENLARGE_OVER_TIME     = 0x04;
        /// Angle grows by the rotation speed every tick
        const ROTATE_OVER_TIME      = 0x08;
        /// Spawned particles get a random initial angle
        const INITIALLY_ROTATED     = 0x10;
        /// Simulation is fully delegated to the emitter's custom update
        const CUSTOM_UPDATE         = 0x20;
    }
}

impl ParticleFlags {
    /// The flags that select how an emitter generates particles
    pub const GENERATION_MODES: Self = Self::PREFILLED
        .union(Self::CONTINUOUS_GENERATION)
        .union(Self::CUSTOM_UPDATE);

    /// Number of generation-mode flags set (valid emitters have exactly one)
    pub fn generation_mode_count(self) -> u32 {
        self.intersection(Self::GENERATION_MODES).bits().count_ones()
    }

    /// Whether the emitter needs a rotation axis
    pub fn uses_rotation(self) -> bool {
        self.intersects(Self::ROTATE_OVER_TIME | Self::INITIALLY_ROTATED)
    }
}
