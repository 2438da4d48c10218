//! Code unit packaging
//!
//! Every unit of a session goes through the same [`Compressor`], so later units
//! compress against the dictionary built by earlier ones. Frames must therefore
//! be sent, and decoded, in the order they were packaged.

use crate::Result;
use stowaway_proto::codec::check_unit_name;
use stowaway_proto::{CodeResolver, CodeUnit, Compressor, Frame, ProtocolError};
use tracing::debug;

/// Turns code units into frames for one session
#[derive(Default)]
pub struct Packager {
    compressor: Compressor,
}

impl Packager {
    /// Packager with a fresh compression context
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress `unit` and wrap it in a frame
    pub fn package(&mut self, unit: &CodeUnit) -> Result<Frame> {
        // Checked before compressing so a rejected unit leaves the context untouched
        check_unit_name(unit.name())?;
        let body = self.compressor.compress_unit(unit.source().as_bytes())?;
        debug!("assembling {} ({} bytes)", unit.name(), body.len());
        Ok(Frame::new(unit.name(), unit.is_package(), body))
    }

    /// Read `name` from local storage and package it
    pub fn package_named(&mut self, storage: &dyn CodeResolver, name: &str) -> Result<Frame> {
        let not_found = || ProtocolError::UnitNotFound(name.to_string());
        let descriptor = storage.resolve(name).ok_or_else(not_found)?;
        let source = storage.get_source(name).ok_or_else(not_found)?;
        self.package(&CodeUnit::new(name, descriptor.is_package, source))
    }

    /// Uncompressed bytes packaged so far
    pub fn total_in(&self) -> u64 {
        self.compressor.total_in()
    }

    /// Compressed bytes produced so far
    pub fn total_out(&self) -> u64 {
        self.compressor.total_out()
    }
}
