//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the core types that all other Ember crates depend on:
//! - `ResourceId` - Opaque handles for textures, shaders and data files
//! - `ResourceLoader` - The path-to-resource collaborator interface
//! - Error types and Result alias

mod error;
mod id;
mod resource;

pub use error::{EmberError, Result};
pub use id::ResourceId;
pub use resource::{ResourceLoader, ResourceRegistry};
