//! Error types for the Stowaway library

use stowaway_proto::ProtocolError;
use stowaway_ssh::TransportError;
use thiserror::Error;

/// Main error type for Stowaway operations
#[derive(Debug, Error)]
pub enum StowawayError {
    /// Address, command or process errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Packaging and framing errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O errors on the channel
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote side did not behave as expected after handoff
    #[error("Session error: {0}")]
    Session(String),
}
