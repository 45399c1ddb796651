//! Scene objects and their kind-specific payloads

use ember_core::ResourceId;
use ember_particles::{EmitterNode, ParticleEmitterData};
use glam::Vec3;
use std::collections::HashMap;

/// Extra texture slots bound after the main texture
pub const EFFECT_TEXTURES_COUNT: usize = 3;

pub const CUSTOM_ALPHA_UNIFORM: &str = "custom_alpha";
pub const ROTATION_AXIS_UNIFORM: &str = "rotation_axis";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextData {
    pub text: String,
    pub font_name: String,
}

/// What kind of object this is. Every consumer matches exhaustively.
#[derive(Debug, Default)]
pub enum SceneObjectData {
    #[default]
    Default,
    Text(TextData),
    ParticleEmitter(Box<ParticleEmitterData>),
}

/// A named, positioned object in a scene
#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    pub data: SceneObjectData,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub texture: ResourceId,
    pub shader: ResourceId,
    /// `ResourceId::NONE` marks an unused slot
    pub effect_textures: [ResourceId; EFFECT_TEXTURES_COUNT],
    pub vec3_uniforms: HashMap<String, Vec3>,
    pub float_uniforms: HashMap<String, f32>,
    pub invisible: bool,
    /// Drawn after the main pass
    pub deferred_rendering: bool,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::new("")
    }
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: SceneObjectData::Default,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            texture: ResourceId::NONE,
            shader: ResourceId::NONE,
            effect_textures: [ResourceId::NONE; EFFECT_TEXTURES_COUNT],
            vec3_uniforms: HashMap::new(),
            float_uniforms: HashMap::new(),
            invisible: false,
            deferred_rendering: false,
        }
    }

    pub fn is_particle_emitter(&self) -> bool {
        matches!(self.data, SceneObjectData::ParticleEmitter(_))
    }

    /// Opacity multiplier, 1.0 unless the `custom_alpha` uniform is set
    pub fn custom_alpha(&self) -> f32 {
        self.float_uniforms
            .get(CUSTOM_ALPHA_UNIFORM)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn set_custom_alpha(&mut self, alpha: f32) {
        self.float_uniforms.insert(CUSTOM_ALPHA_UNIFORM.to_string(), alpha);
    }
}

impl EmitterNode for SceneObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_render_resources(&mut self, texture: ResourceId, shader: ResourceId) {
        self.texture = texture;
        self.shader = shader;
    }

    fn emitter(&self) -> Option<&ParticleEmitterData> {
        match &self.data {
            SceneObjectData::ParticleEmitter(emitter) => Some(&**emitter),
            SceneObjectData::Default | SceneObjectData::Text(_) => None,
        }
    }

    fn emitter_mut(&mut self) -> Option<&mut ParticleEmitterData> {
        match &mut self.data {
            SceneObjectData::ParticleEmitter(emitter) => Some(&mut **emitter),
            SceneObjectData::Default | SceneObjectData::Text(_) => None,
        }
    }

    fn attach_emitter(&mut self, emitter: ParticleEmitterData) {
        self.vec3_uniforms
            .insert(ROTATION_AXIS_UNIFORM.to_string(), emitter.rotation_axis);
        self.data = SceneObjectData::ParticleEmitter(Box::new(emitter));
    }
}
