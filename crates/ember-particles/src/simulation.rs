//! Built-in per-frame particle update and depth sort

use crate::emitter::ParticleEmitterData;
use crate::flags::ParticleFlags;
use crate::rand::ParticleRng;
use glam::Vec3;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still has live particles or keeps generating
    Active,
    /// Every particle is dead and the emitter does not generate; remove it
    Exhausted,
}

/// Advance one emitter by `dt_millis`.
///
/// Lifetimes and the generation delay tick in seconds; size, angle, velocity
/// and position integrate per millisecond. Continuous emitters respawn a dead
/// slot only when the delay has run out, then restart the delay.
pub fn step_emitter(
    emitter: &mut ParticleEmitterData,
    origin: Vec3,
    dt_millis: f32,
    rng: &mut ParticleRng,
) -> StepOutcome {
    let dt_secs = dt_millis / 1000.0;
    emitter.generation_delay_secs = (emitter.generation_delay_secs - dt_secs).max(0.0);

    let flags = emitter.flags;
    let continuous = flags.contains(ParticleFlags::CONTINUOUS_GENERATION);
    let enlarge = flags.contains(ParticleFlags::ENLARGE_OVER_TIME);
    let rotate = flags.contains(ParticleFlags::ROTATE_OVER_TIME);
    let def = emitter.definition.clone();

    let count = emitter.particle_count();
    let mut dead = 0;
    for i in 0..count {
        emitter.lifetimes[i] -= dt_secs;
        if emitter.lifetimes[i] <= 0.0 {
            if continuous && emitter.generation_delay_secs <= 0.0 {
                emitter.spawn_at(i, origin, rng);
                emitter.generation_delay_secs = def.generation_delay_secs;
            } else {
                emitter.lifetimes[i] = 0.0;
                dead += 1;
            }
        }

        if enlarge {
            emitter.sizes[i] += def.enlargement_speed * dt_millis;
        }
        if rotate {
            emitter.angles[i] += def.rotation_speed * dt_millis;
        }
        emitter.velocities[i] += def.gravity_velocity * dt_millis;
        emitter.positions[i] += emitter.velocities[i] * dt_millis;
    }

    if dead == count && !continuous {
        StepOutcome::Exhausted
    } else {
        sort_particles(emitter);
        StepOutcome::Active
    }
}

/// Stable sort of all particle arrays by ascending position z.
///
/// Already-sorted emitters are left untouched.
pub fn sort_particles(emitter: &mut ParticleEmitterData) {
    let positions = &emitter.positions;
    if positions
        .windows(2)
        .all(|w| w[0].z.total_cmp(&w[1].z) != Ordering::Greater)
    {
        return;
    }

    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| positions[a].z.total_cmp(&positions[b].z));
    emitter.apply_permutation(&order);
}
