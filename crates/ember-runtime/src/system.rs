//! Runtime system trait

use ember_core::Result;

/// A system that can be ticked by the frame loop
///
/// Systems are updated in registration order, once per frame, with the
/// frame's wall-clock delta. There is no fixed-step update: integration in
/// every system scales by the actual delta.
pub trait RuntimeSystem<W> {
    /// Called once when the system is first registered
    fn initialize(&mut self, world: &mut W) -> Result<()>;

    /// Called once per frame with the frame delta in milliseconds
    fn update(&mut self, world: &mut W, dt_millis: f32) -> Result<()>;

    /// Called when the system is being shut down
    fn shutdown(&mut self, world: &mut W) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
