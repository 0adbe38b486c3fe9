//! Error types shared across the StrideTrack workspace.
//!
//! Errors follow a per-crate hierarchy built on [`thiserror`]: this crate
//! owns [`CoreError`], and the signal/session crates wrap it with `#[from]`
//! conversions into their own enums.

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the core domain layer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Configuration value out of range or inconsistent
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Input data failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
