//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing required keys for {kind} repository '{repository}': {}", .keys.join(", "))]
    MissingKeys {
        repository: String,
        kind: String,
        keys: Vec<&'static str>,
    },

    #[error("Unknown repository kind: {value}")]
    UnknownKind { value: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl CoreError {
    /// Keys reported missing, empty for every other variant
    pub fn missing_keys(&self) -> &[&'static str] {
        match self {
            CoreError::MissingKeys { keys, .. } => keys,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
