//! Error types for protocol operations

use thiserror::Error;
use std::io;

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A header line of a frame could not be parsed
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The stream ended before a frame (or the sentinel) was complete
    #[error("Truncated stream: {0}")]
    TruncatedStream(String),

    /// The compressed body of a frame could not be inflated
    #[error("Corrupt body for unit {name}: {reason}")]
    CorruptBody {
        /// Unit whose body failed to decode
        name: String,
        /// Decompressor error message
        reason: String,
    },

    /// Frame too large
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Actual frame size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// A code unit was referenced but no resolver knows it
    #[error("Unknown code unit \"{0}\"")]
    UnitNotFound(String),

    /// A code unit name appeared twice in one session
    #[error("Duplicate code unit \"{0}\"")]
    DuplicateUnit(String),

    /// A dotted name was loaded under a parent that is not a package
    #[error("Cannot load {name}: parent {parent} is not a package")]
    NotAPackage {
        /// Unit being loaded
        name: String,
        /// Parent unit that lacks the package flag
        parent: String,
    },

    /// The unit store no longer accepts units
    #[error("Code unit store is sealed")]
    StoreSealed,

    /// No native entry point is registered under the requested name
    #[error("No entry point {function} in {unit}")]
    EntryPointMissing {
        /// Unit exporting the entry point
        unit: String,
        /// Function name
        function: String,
    },

    /// The interpreter stub could not be parsed
    #[error("Invalid stub: {0}")]
    InvalidStub(String),

    /// A boot script line could not be parsed
    #[error("Invalid boot script at line {line}: {reason}")]
    InvalidBootScript {
        /// One-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The options unit could not be parsed
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidOptions(err.to_string())
    }
}
