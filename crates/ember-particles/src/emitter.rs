//! Per-instance particle state

use crate::definition::EmitterDefinition;
use crate::flags::ParticleFlags;
use crate::graphics::GraphicsHandle;
use crate::rand::ParticleRng;
use glam::Vec3;
use std::fmt;
use std::sync::Arc;

/// Replaces the built-in update for emitters flagged `CUSTOM_UPDATE`.
///
/// Any `FnMut(f32, &mut ParticleEmitterData)` closure implements this.
pub trait CustomUpdate {
    fn update(&mut self, dt_millis: f32, emitter: &mut ParticleEmitterData);
}

impl<F> CustomUpdate for F
where
    F: FnMut(f32, &mut ParticleEmitterData),
{
    fn update(&mut self, dt_millis: f32, emitter: &mut ParticleEmitterData) {
        self(dt_millis, emitter)
    }
}

/// Live particles of one emitter, stored as parallel arrays of equal length.
///
/// A slot is alive while its lifetime is above zero. Particles are never
/// added or removed; dead slots are reused by respawning.
pub struct ParticleEmitterData {
    pub(crate) definition: Arc<EmitterDefinition>,
    /// Starts as the definition's flags; `remove_particle_emitter_flag` clears bits here
    pub flags: ParticleFlags,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) velocities: Vec<Vec3>,
    pub(crate) lifetimes: Vec<f32>,
    pub(crate) sizes: Vec<f32>,
    pub(crate) angles: Vec<f32>,
    pub total_particles_spawned: u64,
    /// Seconds until continuous generation may respawn again
    pub generation_delay_secs: f32,
    /// Zero unless the emitter rotates
    pub rotation_axis: Vec3,
    pub(crate) custom_update: Option<Box<dyn CustomUpdate>>,
    pub(crate) graphics: Option<GraphicsHandle>,
}

impl ParticleEmitterData {
    /// All slots start dead at the origin
    pub fn new(definition: Arc<EmitterDefinition>) -> Self {
        let count = definition.particle_count;
        let rotation_axis = match definition.rotation_axis {
            Some(axis) if definition.flags.uses_rotation() => axis.to_vec3(),
            _ => Vec3::ZERO,
        };
        Self {
            flags: definition.flags,
            positions: vec![Vec3::ZERO; count],
            velocities: vec![Vec3::ZERO; count],
            lifetimes: vec![0.0; count],
            sizes: vec![0.0; count],
            angles: vec![0.0; count],
            total_particles_spawned: 0,
            generation_delay_secs: 0.0,
            rotation_axis,
            custom_update: None,
            graphics: None,
            definition,
        }
    }

    pub fn definition(&self) -> &EmitterDefinition {
        &self.definition
    }

    pub fn particle_count(&self) -> usize {
        self.lifetimes.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn velocities_mut(&mut self) -> &mut [Vec3] {
        &mut self.velocities
    }

    pub fn lifetimes(&self) -> &[f32] {
        &self.lifetimes
    }

    pub fn lifetimes_mut(&mut self) -> &mut [f32] {
        &mut self.lifetimes
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn sizes_mut(&mut self) -> &mut [f32] {
        &mut self.sizes
    }

    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    pub fn angles_mut(&mut self) -> &mut [f32] {
        &mut self.angles
    }

    pub fn is_alive(&self, index: usize) -> bool {
        self.lifetimes.get(index).is_some_and(|&l| l > 0.0)
    }

    pub fn alive_count(&self) -> usize {
        self.lifetimes.iter().filter(|&&l| l > 0.0).count()
    }

    pub fn first_dead_slot(&self) -> Option<usize> {
        self.lifetimes.iter().position(|&l| l <= 0.0)
    }

    /// Respawn the particle in `index` around `origin`.
    ///
    /// Every attribute is drawn fresh from the definition's ranges; the angle
    /// is only drawn when the emitter is initially rotated.
    pub fn spawn_at(&mut self, index: usize, origin: Vec3, rng: &mut ParticleRng) {
        let def = &self.definition;
        let lifetime = rng.range_of(def.lifetime_range);
        let x_offset = rng.range_of(def.position_x_range);
        let y_offset = rng.range_of(def.position_y_range);
        let vel_x = rng.range_of(def.velocity_x_range);
        let vel_y = rng.range_of(def.velocity_y_range);
        let z = rng.depth_jitter(origin.z);
        let size = rng.range_of(def.size_range);
        let angle = if self.flags.contains(ParticleFlags::INITIALLY_ROTATED) {
            rng.range_of(def.initial_angle_range)
        } else {
            0.0
        };

        self.lifetimes[index] = lifetime;
        self.positions[index] = Vec3::new(origin.x + x_offset, origin.y + y_offset, z);
        self.velocities[index] = Vec3::new(vel_x, vel_y, 0.0);
        self.sizes[index] = size;
        self.angles[index] = angle;
        self.total_particles_spawned += 1;
    }

    pub fn set_custom_update(&mut self, update: Box<dyn CustomUpdate>) {
        self.custom_update = Some(update);
    }

    pub fn has_custom_update(&self) -> bool {
        self.custom_update.is_some()
    }

    /// Runs the custom update, if any. Returns false when none is installed.
    pub(crate) fn run_custom_update(&mut self, dt_millis: f32) -> bool {
        let Some(mut update) = self.custom_update.take() else {
            return false;
        };
        update.update(dt_millis, self);
        // The callback may have installed a replacement for itself
        if self.custom_update.is_none() {
            self.custom_update = Some(update);
        }
        true
    }

    pub fn graphics_handle(&self) -> Option<GraphicsHandle> {
        self.graphics
    }

    pub(crate) fn set_graphics_handle(&mut self, handle: GraphicsHandle) {
        self.graphics = Some(handle);
    }

    pub(crate) fn take_graphics_handle(&mut self) -> Option<GraphicsHandle> {
        self.graphics.take()
    }

    /// Reorder every parallel array so slot `i` holds what was in `order[i]`
    pub(crate) fn apply_permutation(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.particle_count());
        self.positions = order.iter().map(|&i| self.positions[i]).collect();
        self.velocities = order.iter().map(|&i| self.velocities[i]).collect();
        self.lifetimes = order.iter().map(|&i| self.lifetimes[i]).collect();
        self.sizes = order.iter().map(|&i| self.sizes[i]).collect();
        self.angles = order.iter().map(|&i| self.angles[i]).collect();
    }
}

impl fmt::Debug for ParticleEmitterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleEmitterData")
            .field("definition", &self.definition.name)
            .field("flags", &self.flags)
            .field("particle_count", &self.particle_count())
            .field("alive", &self.alive_count())
            .field("total_particles_spawned", &self.total_particles_spawned)
            .field("graphics", &self.graphics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FloatRange, RotationAxis};

    fn definition(flags: ParticleFlags) -> Arc<EmitterDefinition> {
        let mut def = EmitterDefinition::new("test", 4, flags);
        def.lifetime_range = FloatRange::new(1.0, 2.0);
        def.position_x_range = FloatRange::new(-0.5, 0.5);
        def.size_range = FloatRange::new(0.1, 0.2);
        def.initial_angle_range = FloatRange::new(1.0, 1.5);
        def.rotation_axis = Some(RotationAxis::Y);
        Arc::new(def)
    }

    #[test]
    fn new_emitter_is_all_dead() {
        let emitter = ParticleEmitterData::new(definition(ParticleFlags::PREFILLED));
        assert_eq!(emitter.particle_count(), 4);
        assert_eq!(emitter.alive_count(), 0);
        assert_eq!(emitter.first_dead_slot(), Some(0));
        assert_eq!(emitter.rotation_axis, Vec3::ZERO);
        assert!(emitter.graphics_handle().is_none());
    }

    #[test]
    fn rotation_axis_only_set_when_rotating() {
        let emitter = ParticleEmitterData::new(definition(
            ParticleFlags::PREFILLED | ParticleFlags::INITIALLY_ROTATED,
        ));
        assert_eq!(emitter.rotation_axis, Vec3::Y);
    }

    #[test]
    fn spawn_draws_from_ranges() {
        let mut rng = ParticleRng::new(3);
        let mut emitter = ParticleEmitterData::new(definition(
            ParticleFlags::PREFILLED | ParticleFlags::INITIALLY_ROTATED,
        ));
        let origin = Vec3::new(10.0, 5.0, 1.0);
        emitter.spawn_at(2, origin, &mut rng);

        assert!(emitter.is_alive(2));
        assert!(!emitter.is_alive(0));
        assert!(FloatRange::new(1.0, 2.0).contains(emitter.lifetimes()[2]));
        assert!(FloatRange::new(9.5, 10.5).contains(emitter.positions()[2].x));
        assert_eq!(emitter.positions()[2].y, 5.0);
        assert!((emitter.positions()[2].z - 1.0).abs() <= 1.0e-4 + f32::EPSILON);
        assert!(FloatRange::new(1.0, 1.5).contains(emitter.angles()[2]));
        assert_eq!(emitter.total_particles_spawned, 1);
    }

    #[test]
    fn spawn_without_initial_rotation_zeroes_angle() {
        let mut rng = ParticleRng::new(3);
        let mut emitter = ParticleEmitterData::new(definition(ParticleFlags::PREFILLED));
        emitter.angles_mut()[1] = 4.0;
        emitter.spawn_at(1, Vec3::ZERO, &mut rng);
        assert_eq!(emitter.angles()[1], 0.0);
    }

    #[test]
    fn custom_update_survives_its_own_call() {
        let mut emitter = ParticleEmitterData::new(definition(ParticleFlags::CUSTOM_UPDATE));
        emitter.set_custom_update(Box::new(|dt: f32, e: &mut ParticleEmitterData| {
            e.lifetimes_mut()[0] += dt;
        }));
        assert!(emitter.run_custom_update(5.0));
        assert!(emitter.run_custom_update(5.0));
        assert_eq!(emitter.lifetimes()[0], 10.0);
        assert!(emitter.has_custom_update());
    }

    #[test]
    fn permutation_moves_all_arrays_together() {
        let mut emitter = ParticleEmitterData::new(definition(ParticleFlags::PREFILLED));
        for i in 0..4 {
            emitter.positions_mut()[i] = Vec3::new(i as f32, 0.0, 0.0);
            emitter.sizes_mut()[i] = i as f32 * 10.0;
            emitter.lifetimes_mut()[i] = i as f32 + 1.0;
        }
        emitter.apply_permutation(&[3, 2, 1, 0]);
        assert_eq!(emitter.positions()[0].x, 3.0);
        assert_eq!(emitter.sizes()[0], 30.0);
        assert_eq!(emitter.lifetimes()[0], 4.0);
        assert_eq!(emitter.sizes()[3], 0.0);
    }
}
