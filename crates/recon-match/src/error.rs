//! Error types for loading engine settings.
//!
//! Matching and pairing themselves never fail; only the configuration
//! boundary can reject input.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building [`crate::MatchSettings`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("Failed to read settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON for the settings schema.
    #[error("Invalid settings JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A numeric override could not be parsed.
    #[error("{key}: '{value}' is not a number")]
    InvalidNumber { key: String, value: String },

    /// A boolean override could not be parsed.
    #[error("{key}: '{value}' is not a boolean (expected 1/0, true/false, yes/no)")]
    InvalidBool { key: String, value: String },

    /// Pairing mode label not recognised.
    #[error("{key}: {source}")]
    InvalidMode {
        key: String,
        #[source]
        source: recon_model::UnknownMode,
    },

    /// Assignment solver label not recognised.
    #[error("{key}: unknown assignment solver '{value}' (expected hungarian or greedy)")]
    InvalidSolver { key: String, value: String },

    /// Value outside its permitted range.
    #[error("{key}: {value} is outside [{min}, {max}]")]
    OutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Failure of an optional header-embedding backend.
///
/// Never surfaced to engine callers; the engine degrades to zero vectors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EmbeddingError {
    /// Model could not be loaded or reached.
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with the wrong number of vectors.
    #[error("embedding backend returned {got} vectors for {expected} headers")]
    LengthMismatch { expected: usize, got: usize },
}
