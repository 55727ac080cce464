//! Common error types for the exoplanet services

use thiserror::Error;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping a binary
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
