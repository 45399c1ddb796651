//! Resource loading collaborator interface

use crate::id::ResourceId;
use std::collections::HashMap;

/// Maps a resource path to an opaque id, loading it synchronously if needed.
///
/// Loading the same path twice must return the same id.
pub trait ResourceLoader {
    fn load_resource(&mut self, path: &str) -> ResourceId;
}

/// In-memory loader that interns paths and hands out sequential ids.
///
/// The renderer resolves ids back to paths through [`ResourceRegistry::path`]
/// when it needs the actual file.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    by_path: HashMap<String, ResourceId>,
    paths: Vec<String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an already-loaded path without registering it
    pub fn get(&self, path: &str) -> Option<ResourceId> {
        self.by_path.get(path).copied()
    }

    /// Resolve an id back to the path it was loaded from
    pub fn path(&self, id: ResourceId) -> Option<&str> {
        if id.is_none() {
            return None;
        }
        self.paths.get(id.raw() as usize - 1).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate `(id, path)` pairs in load order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &str)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, p)| (ResourceId::from_raw(i as u64 + 1), p.as_str()))
    }
}

impl ResourceLoader for ResourceRegistry {
    fn load_resource(&mut self, path: &str) -> ResourceId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        self.paths.push(path.to_string());
        let id = ResourceId::from_raw(self.paths.len() as u64);
        self.by_path.insert(path.to_string(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_same_id() {
        let mut registry = ResourceRegistry::new();
        let a = registry.load_resource("textures/spark.png");
        let b = registry.load_resource("textures/spark.png");
        let c = registry.load_resource("textures/smoke.png");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ids_resolve_back_to_paths() {
        let mut registry = ResourceRegistry::new();
        let id = registry.load_resource("shaders/generic_particle.wgsl");
        assert_eq!(registry.path(id), Some("shaders/generic_particle.wgsl"));
        assert_eq!(registry.path(ResourceId::NONE), None);
        assert_eq!(registry.get("shaders/generic_particle.wgsl"), Some(id));
        assert_eq!(registry.get("missing"), None);
    }
}
