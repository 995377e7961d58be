use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a mapping export.
///
/// These surface when the mapping is configured (startup, admin endpoint,
/// CLI validation), never while handling a webhook.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Invalid mapping JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Mapping must be a JSON object")]
    InvalidStructure,

    #[error("Mapping must contain a \"users\" or \"devices\" list")]
    MissingRequiredFields,

    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while parsing a webhook body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

pub type Result<T, E = MappingError> = std::result::Result<T, E>;
