//! Scene - an ordered list of named objects plus the camera that views them

use crate::camera::Camera;
use crate::object::SceneObject;
use ember_particles::{EmitterNode, EmitterScene};
use std::collections::HashSet;

/// Objects are kept in creation order, which is also draw order. Names are
/// not required to be unique; lookups return the first match.
#[derive(Debug, Default)]
pub struct Scene {
    name: String,
    objects: Vec<SceneObject>,
    camera: Camera,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Append a new default object and return it
    pub fn create_scene_object(&mut self, name: impl Into<String>) -> &mut SceneObject {
        self.objects.push(SceneObject::new(name));
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    pub fn find_scene_object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn find_scene_object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    pub fn find_scene_objects_whose_name_starts_with(&self, prefix: &str) -> Vec<&SceneObject> {
        self.objects
            .iter()
            .filter(|o| o.name.starts_with(prefix))
            .collect()
    }

    /// Remove and return the first object with this name
    pub fn remove_scene_object(&mut self, name: &str) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.name == name)?;
        Some(self.objects.remove(index))
    }

    pub fn remove_all_scene_objects_with_name(&mut self, name: &str) -> Vec<SceneObject> {
        self.drain_where(|o| o.name == name)
    }

    pub fn remove_all_scene_objects_but_the_ones_named(
        &mut self,
        keep: &HashSet<&str>,
    ) -> Vec<SceneObject> {
        self.drain_where(|o| !keep.contains(o.name.as_str()))
    }

    /// Remove every particle emitter object. The caller releases their
    /// graphics resources.
    pub fn remove_all_particle_effects(&mut self) -> Vec<SceneObject> {
        let removed = self.drain_where(SceneObject::is_particle_emitter);
        if !removed.is_empty() {
            tracing::debug!(scene = %self.name, count = removed.len(), "removed particle effects");
        }
        removed
    }

    pub fn scene_objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn scene_objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn drain_where(&mut self, mut pred: impl FnMut(&SceneObject) -> bool) -> Vec<SceneObject> {
        let (removed, kept): (Vec<SceneObject>, Vec<SceneObject>) = std::mem::take(&mut self.objects)
            .into_iter()
            .partition(|o| pred(o));
        self.objects = kept;
        removed
    }
}

impl EmitterScene for Scene {
    type Node = SceneObject;

    fn create_node(&mut self, name: &str) -> &mut SceneObject {
        self.create_scene_object(name)
    }

    fn find_node_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.find_scene_object_mut(name)
    }

    fn nodes_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    fn remove_emitter_node(&mut self, name: &str) -> Option<SceneObject> {
        let index = self
            .objects
            .iter()
            .position(|o| o.name == name && o.is_particle_emitter())?;
        Some(self.objects.remove(index))
    }

    fn remove_node_at(&mut self, index: usize) -> SceneObject {
        self.objects.remove(index)
    }
}

/// Release the graphics of objects removed in bulk
pub fn release_removed_emitters<G: ember_particles::ParticleGraphics>(
    manager: &mut ember_particles::ParticleManager<G>,
    removed: &mut [SceneObject],
) {
    for object in removed.iter_mut().filter(|o| o.emitter().is_some()) {
        manager.remove_particle_graphics_data(object);
    }
}
