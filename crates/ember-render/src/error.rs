//! Render errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to get adapter")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),
    #[error("Canvas must be at least 1x1, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("Failed to read render buffer: {0}")]
    BufferReadFailed(String),
    #[error("Failed to load texture '{path}': {message}")]
    TextureLoad { path: String, message: String },
    #[error("Failed to load shader '{path}': {message}")]
    ShaderLoad { path: String, message: String },
}

impl From<RenderError> for ember_core::EmberError {
    fn from(err: RenderError) -> Self {
        ember_core::EmberError::RenderError(err.to_string())
    }
}
