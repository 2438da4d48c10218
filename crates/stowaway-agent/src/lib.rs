//! # Stowaway Agent
//!
//! Receiving interpreter: reassembles shipped code units from stdin, installs
//! them ahead of local storage and calls the requested entry point.

#![warn(missing_docs)]

/// Stub handling and boot script dispatch
pub mod agent;

/// Frame assembly into a code unit store
pub mod assembler;

/// Sealed store of assembled units
pub mod store;

/// Resolver over the assembled store
pub mod dynamic;

/// Resolver chain, loaded units and entry points
pub mod runtime;

/// Boot script execution and entry-point calls
pub mod invoker;

/// Built-in server driver
pub mod driver;

pub use agent::Agent;
pub use assembler::FrameAssembler;
pub use driver::{ServerDriver, SERVER_ENTRY, SERVER_UNIT};
pub use dynamic::{DynamicResolver, STDIN_ORIGIN};
pub use invoker::{BootRunner, EntryPoint};
pub use runtime::HostRuntime;
pub use store::CodeUnitStore;
