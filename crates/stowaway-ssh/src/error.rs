//! Transport-specific error types

use thiserror::Error;
use std::io;

/// Transport-specific errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// The target string could not be parsed
    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// The string that was parsed
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// The transport process could not be created
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
