//! # Stowaway Protocol
//!
//! Wire format, streaming compression context and code resolution shared by the
//! Stowaway controller and agent.

#![warn(missing_docs)]

/// Code unit definition
pub mod unit;

/// Frame structure and serialization
pub mod frame;

/// Frame codec for async streams
pub mod codec;

/// Session-wide compression context
pub mod compress;

/// Code resolution chain and filesystem storage
pub mod resolver;

/// Interpreter stub and boot script
pub mod boot;

/// Entry-point configuration
pub mod options;

/// Error types for protocol operations
pub mod error;

pub use unit::CodeUnit;
pub use frame::Frame;
pub use codec::FrameCodec;
pub use compress::{Compressor, Decompressor};
pub use resolver::{
    CodeResolver, CompiledUnit, Compiler, FsResolver, ResolverChain, TextCompiler, UnitDescriptor,
};
pub use boot::{BootScript, Directive, Stub, ASSEMBLER_UNIT, READY_BANNER};
pub use options::{ServerOptions, OPTIONS_UNIT};
pub use error::ProtocolError;
