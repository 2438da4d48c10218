//! Host runtime: resolver chain, loaded units and native entry points

use crate::invoker::EntryPoint;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use stowaway_proto::unit::parent_name;
use stowaway_proto::{CodeResolver, CompiledUnit, ProtocolError, ResolverChain};
use tracing::debug;

/// Process-wide diagnostic verbosity.
///
/// Set once from the interpreter stub at process start and never torn down.
/// The binary derives its log filter from it and the boot runner hands it to
/// the frame assembler. This is the only global state in the agent.
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

/// Set the process-wide verbosity
pub fn set_verbosity(level: u8) {
    VERBOSITY.store(level, Ordering::Relaxed);
}

/// Current process-wide verbosity
pub fn verbosity() -> u8 {
    VERBOSITY.load(Ordering::Relaxed)
}

/// A unit that has been loaded into the runtime
#[derive(Debug, Clone)]
pub struct LoadedUnit {
    /// Executable form
    pub compiled: CompiledUnit,
    /// Package flag reported by the resolver
    pub is_package: bool,
    /// Resolver origin
    pub origin: String,
}

/// The receiving side's code-loading machinery
#[derive(Default)]
pub struct HostRuntime {
    chain: ResolverChain,
    loaded: HashMap<String, LoadedUnit>,
    entry_points: HashMap<(String, String), Arc<dyn EntryPoint>>,
}

impl HostRuntime {
    /// Runtime with an empty resolver chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime over an existing chain
    pub fn with_chain(chain: ResolverChain) -> Self {
        Self {
            chain,
            ..Default::default()
        }
    }

    /// The resolver chain
    pub fn chain(&self) -> &ResolverChain {
        &self.chain
    }

    /// Put `resolver` ahead of every other resolver
    pub fn install(&mut self, resolver: Arc<dyn CodeResolver>) {
        self.chain.prepend(resolver);
        debug!("Installed resolver at front of chain ({} total)", self.chain.len());
    }

    /// Expose a native function as `unit::function`
    pub fn register_entry_point(&mut self, unit: &str, function: &str, entry: Arc<dyn EntryPoint>) {
        debug!("Registered entry point {}::{}", unit, function);
        self.entry_points
            .insert((unit.to_string(), function.to_string()), entry);
    }

    /// Load `name` and its parent packages through the chain
    pub fn import(&mut self, name: &str) -> Result<&LoadedUnit, ProtocolError> {
        if self.loaded.contains_key(name) {
            return Ok(&self.loaded[name]);
        }

        if let Some(parent) = parent_name(name) {
            if !self.import(parent)?.is_package {
                return Err(ProtocolError::NotAPackage {
                    name: name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let (resolver, descriptor) = self
            .chain
            .find(name)
            .ok_or_else(|| ProtocolError::UnitNotFound(name.to_string()))?;
        let compiled = resolver
            .get_compiled_form(name)?
            .ok_or_else(|| ProtocolError::UnitNotFound(name.to_string()))?;

        debug!("Loaded {} from {}", name, compiled.label);
        let unit = LoadedUnit {
            compiled,
            is_package: descriptor.is_package,
            origin: descriptor.origin,
        };
        Ok(self.loaded.entry(name.to_string()).or_insert(unit))
    }

    /// A previously loaded unit
    pub fn loaded(&self, name: &str) -> Option<&LoadedUnit> {
        self.loaded.get(name)
    }

    /// Entry point `unit::function`; the unit must already be loaded
    pub fn entry_point(
        &self,
        unit: &str,
        function: &str,
    ) -> Result<Arc<dyn EntryPoint>, ProtocolError> {
        if !self.loaded.contains_key(unit) {
            return Err(ProtocolError::UnitNotFound(unit.to_string()));
        }
        self.entry_points
            .get(&(unit.to_string(), function.to_string()))
            .cloned()
            .ok_or_else(|| ProtocolError::EntryPointMissing {
                unit: unit.to_string(),
                function: function.to_string(),
            })
    }
}
