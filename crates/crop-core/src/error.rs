//! Error types for crop-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in crop-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the supported source table pairs exist in the input directory
    #[error("data files not found in '{}' (looked for: {})", dir.display(), probed.join(", "))]
    MissingInput { dir: PathBuf, probed: Vec<String> },

    /// The binary container could not be decoded
    #[error("failed to decode '{path}': {message}")]
    Decode { path: PathBuf, message: String },

    /// A source document did not have the expected layout
    #[error("unexpected document layout in '{path}': {message}")]
    Document { path: PathBuf, message: String },

    /// A crop refers to an item key that is absent from the item table
    #[error("crop '{crop}' references item '{item}' which is not in the item table")]
    UnresolvedReference { crop: String, item: String },

    /// A record has the wrong number of positional fields
    #[error("{table} record '{key}' has {found} fields, expected {expected}")]
    FieldCount {
        table: &'static str,
        key: String,
        expected: usize,
        found: usize,
    },

    /// A token that must be numeric is not
    #[error("{table} record '{key}': field '{field}' has non-numeric value '{token}'")]
    InvalidNumber {
        table: &'static str,
        key: String,
        field: &'static str,
        token: String,
    },

    /// Unknown output profile name
    #[error("unknown output profile '{0}' (expected parsed-crops, parsed-crop-data or crops)")]
    UnknownProfile(String),

    /// Unknown item layout name
    #[error("unknown item layout '{0}' (expected legacy or localized)")]
    UnknownLayout(String),

    /// CSV writing error from the csv crate
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
