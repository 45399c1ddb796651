//! Ember Scene - named scene objects viewed by an orthographic camera
//!
//! Each object carries a tagged payload (`Default`, `Text` or
//! `ParticleEmitter`); the particle manager reaches emitter objects through
//! the `EmitterScene`/`EmitterNode` traits implemented here.

mod camera;
mod object;
mod scene;

pub use camera::{Camera, DEFAULT_LENS_HEIGHT, DEVICE_INVARIABLE_ASPECT};
pub use object::{
    SceneObject, SceneObjectData, TextData, CUSTOM_ALPHA_UNIFORM, EFFECT_TEXTURES_COUNT,
    ROTATION_AXIS_UNIFORM,
};
pub use scene::{release_removed_emitters, Scene};
