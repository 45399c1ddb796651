//! What the particle manager needs from a scene
//!
//! The scene crate implements these for its objects; the manager only sees
//! named nodes that may carry emitter data.

use crate::emitter::ParticleEmitterData;
use ember_core::ResourceId;
use glam::Vec3;

pub trait EmitterNode {
    fn name(&self) -> &str;

    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    /// Texture and shader the node is drawn with
    fn set_render_resources(&mut self, texture: ResourceId, shader: ResourceId);

    fn emitter(&self) -> Option<&ParticleEmitterData>;

    fn emitter_mut(&mut self) -> Option<&mut ParticleEmitterData>;

    /// Make this node a particle emitter owning `emitter`
    fn attach_emitter(&mut self, emitter: ParticleEmitterData);
}

pub trait EmitterScene {
    type Node: EmitterNode;

    /// Add a new node with the given name and return it
    fn create_node(&mut self, name: &str) -> &mut Self::Node;

    fn find_node_mut(&mut self, name: &str) -> Option<&mut Self::Node>;

    fn nodes_mut(&mut self) -> &mut [Self::Node];

    /// Detach and return the first particle emitter with this name.
    /// Nodes without emitter data are skipped even when the name matches.
    fn remove_emitter_node(&mut self, name: &str) -> Option<Self::Node>;

    /// Detach the node at `index` in `nodes_mut` order
    fn remove_node_at(&mut self, index: usize) -> Self::Node;
}
