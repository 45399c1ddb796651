//! GPU-side resources for emitters, behind a trait so simulation runs headless

use crate::emitter::ParticleEmitterData;
use std::collections::HashSet;

/// Opaque handle to the per-emitter GPU buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicsHandle(pub u64);

/// Owns the per-instance buffers (positions, lifetimes, sizes, angles) and
/// the shared quad geometry used to draw them.
pub trait ParticleGraphics {
    /// Create buffers sized to the emitter's capacity, filled with its
    /// current contents
    fn allocate(&mut self, emitter: &ParticleEmitterData) -> GraphicsHandle;

    /// Copy the emitter's current arrays into its buffers
    fn upload(&mut self, handle: GraphicsHandle, emitter: &ParticleEmitterData);

    /// Free the buffers. Each handle is released at most once.
    fn release(&mut self, handle: GraphicsHandle);
}

/// Bookkeeping-only backend for tests and headless simulation
#[derive(Debug, Default)]
pub struct NullGraphics {
    next_handle: u64,
    live: HashSet<GraphicsHandle>,
    pub allocations: u64,
    pub uploads: u64,
    pub releases: u64,
}

impl NullGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: GraphicsHandle) -> bool {
        self.live.contains(&handle)
    }
}

impl ParticleGraphics for NullGraphics {
    fn allocate(&mut self, _emitter: &ParticleEmitterData) -> GraphicsHandle {
        self.next_handle += 1;
        let handle = GraphicsHandle(self.next_handle);
        self.live.insert(handle);
        self.allocations += 1;
        handle
    }

    fn upload(&mut self, handle: GraphicsHandle, _emitter: &ParticleEmitterData) {
        if self.live.contains(&handle) {
            self.uploads += 1;
        } else {
            tracing::warn!(?handle, "upload to released particle buffers");
        }
    }

    fn release(&mut self, handle: GraphicsHandle) {
        if self.live.remove(&handle) {
            self.releases += 1;
        } else {
            tracing::warn!(?handle, "particle buffers released twice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::EmitterDefinition;
    use crate::flags::ParticleFlags;
    use std::sync::Arc;

    #[test]
    fn double_release_is_not_counted() {
        let emitter = ParticleEmitterData::new(Arc::new(EmitterDefinition::new(
            "e",
            2,
            ParticleFlags::PREFILLED,
        )));
        let mut graphics = NullGraphics::new();
        let handle = graphics.allocate(&emitter);
        assert!(graphics.is_live(handle));

        graphics.release(handle);
        graphics.release(handle);
        assert_eq!(graphics.releases, 1);
        assert_eq!(graphics.live_count(), 0);

        graphics.upload(handle, &emitter);
        assert_eq!(graphics.uploads, 0);
    }
}
