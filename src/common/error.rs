//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed request: {0}")]
    Request(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Failures reported by a platform lookup collaborator.
///
/// A lookup that simply finds nothing returns `Ok(None)`; these variants are
/// for the collaborator being unable to answer at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("User lookup failed for {id}: {message}")]
    User { id: String, message: String },

    #[error("Channel lookup failed for {id}: {message}")]
    Channel { id: String, message: String },

    #[error("Bot lookup failed for {id}: {message}")]
    Bot { id: String, message: String },

    #[error("Lookup backend unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors raised while turning a message into its normalized bodies.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Entity resolution failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for collaborator lookups.
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Result type alias for the normalization pipeline.
pub type NormalizeResult<T> = std::result::Result<T, NormalizeError>;
