//! Ember Runtime - Frame loop infrastructure
//!
//! Provides the frame loop building blocks:
//! - `GameClock`: variable frame delta in milliseconds plus a one-second tick
//!   used for development-time hot reloading
//! - `RuntimeSystem`: trait for systems ticked once per frame
//!
//! Every frame runs in a fixed order on one thread: input, system updates,
//! the main render pass, then the deferred render flush.

mod clock;
mod system;

pub use clock::GameClock;
pub use system::RuntimeSystem;
