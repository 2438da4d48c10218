//! Code unit definition

use std::sync::Arc;

/// One named block of source text plus its package flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    name: String,
    is_package: bool,
    source: Arc<str>,
}

impl CodeUnit {
    /// Create a plain (non-package) unit
    pub fn module(name: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self::new(name, false, source)
    }

    /// Create a package unit
    pub fn package(name: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self::new(name, true, source)
    }

    /// Create a unit with an explicit package flag
    pub fn new(name: impl Into<String>, is_package: bool, source: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            is_package,
            source: source.into(),
        }
    }

    /// Dotted unit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the unit is a namespace container for further units
    pub fn is_package(&self) -> bool {
        self.is_package
    }

    /// Source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Shared handle to the source text
    pub fn shared_source(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    /// Name of the enclosing package, if the name is dotted
    pub fn parent(&self) -> Option<&str> {
        parent_name(&self.name)
    }
}

/// Name of the enclosing package of a dotted name
pub fn parent_name(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(parent, _)| parent)
}
