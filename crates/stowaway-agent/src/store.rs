//! In-memory code unit store

use std::collections::HashMap;
use stowaway_proto::{CodeUnit, ProtocolError};

/// Units received in one session, keyed by name
///
/// Append-only; sealed once the end-of-stream sentinel has been read.
#[derive(Debug, Default)]
pub struct CodeUnitStore {
    units: HashMap<String, CodeUnit>,
    sealed: bool,
}

impl CodeUnitStore {
    /// Create an empty, open store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit; names are unique
    pub fn insert(&mut self, unit: CodeUnit) -> Result<(), ProtocolError> {
        if self.sealed {
            return Err(ProtocolError::StoreSealed);
        }
        if self.units.contains_key(unit.name()) {
            return Err(ProtocolError::DuplicateUnit(unit.name().to_string()));
        }
        self.units.insert(unit.name().to_string(), unit);
        Ok(())
    }

    /// Stop accepting units
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the sentinel has been seen
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Look up a unit
    pub fn get(&self, name: &str) -> Option<&CodeUnit> {
        self.units.get(name)
    }

    /// Whether a unit is present
    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no units were received
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
