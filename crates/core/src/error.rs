//! Error types shared across Strata crates
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//! Lock contention is never an error; see `strata_concurrency::LockError` for
//! the caller-contract taxonomy of the locking core.

use std::io;
use thiserror::Error;

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for configuration and process-level failures
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (reading a config file, etc.)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a configuration error from anything displayable
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::IoError(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::config("parallel must be an integer");
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("parallel must be an integer"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
    }
}
