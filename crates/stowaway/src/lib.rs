//! # Stowaway
//!
//! Ships a fixed set of named code units to a freshly spawned interpreter
//! process and boots it from the stream.
//!
//! The units travel as length-framed, zlib-compressed frames on the process's
//! stdin. On the far end the agent rebuilds them into a resolver that sits in
//! front of its local storage, imports them and calls a single entry point.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use stowaway_proto as proto;
pub use stowaway_ssh as ssh;

/// Error types for the Stowaway library
pub mod error;

/// Code unit packaging
pub mod packager;

/// Session setup and handoff
pub mod session;

pub use error::StowawayError;
pub use packager::Packager;
pub use session::{ConnectedSession, SessionBuilder, DEFAULT_UNITS};

/// Result type alias for Stowaway operations
pub type Result<T> = std::result::Result<T, StowawayError>;
