//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("Particle emitter definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("Invalid particle definition '{definition}': {message}")]
    DefinitionParse { definition: String, message: String },

    #[error("Missing required field '{field}' in particle definition '{definition}'")]
    MissingRequiredField { definition: String, field: String },

    #[error("Invalid field type for '{field}': expected {expected}")]
    InvalidFieldType { field: String, expected: String },

    #[error("Invalid enum value: {value} is not one of {allowed:?}")]
    InvalidEnumValue {
        value: String,
        allowed: Vec<String>,
    },

    #[error("Scene object not found: {0}")]
    SceneObjectNotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<serde_json::Error> for EmberError {
    fn from(err: serde_json::Error) -> Self {
        EmberError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}
