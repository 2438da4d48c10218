//! # Stowaway SSH Transport
//!
//! Target parsing, remote invocation and the process channel for Stowaway.

#![warn(missing_docs)]

/// Remote target parsing
pub mod address;

/// Remote invocation command construction
pub mod command;

/// Interpreter process and duplex channel
pub mod connection;

/// Transport-specific error types
pub mod error;

pub use address::AddressSpec;
pub use command::{build_argv, CommandConfig};
pub use connection::Connection;
pub use error::TransportError;
