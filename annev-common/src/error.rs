//! Common error types for annev

use thiserror::Error;

/// Common result type for annev operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the annev crates
///
/// Gateway calls never surface through this enum: transport and HTTP
/// failures are swallowed at the gateway layer and replaced with
/// documented default values. This type covers the genuinely fallible
/// local operations (configuration and state-file handling).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
