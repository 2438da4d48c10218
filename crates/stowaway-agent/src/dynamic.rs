//! Resolver serving units received over the channel

use crate::store::CodeUnitStore;
use std::sync::Arc;
use stowaway_proto::{
    CodeResolver, CompiledUnit, Compiler, ProtocolError, TextCompiler, UnitDescriptor,
};

/// Logical name of the inbound channel
pub const STDIN_ORIGIN: &str = "<stdin>";

/// Resolver answering from the assembled unit store
///
/// Descriptors never claim a filesystem location; compiled units are labelled
/// `<origin>:<name>.src` so diagnostics point back at the channel.
pub struct DynamicResolver {
    store: Arc<CodeUnitStore>,
    origin: String,
    compiler: Arc<dyn Compiler>,
}

impl DynamicResolver {
    /// Resolver over `store`, labelled with the channel name `origin`
    pub fn new(store: Arc<CodeUnitStore>, origin: impl Into<String>) -> Self {
        Self::with_compiler(store, origin, Arc::new(TextCompiler))
    }

    /// Resolver with a custom compiler
    pub fn with_compiler(
        store: Arc<CodeUnitStore>,
        origin: impl Into<String>,
        compiler: Arc<dyn Compiler>,
    ) -> Self {
        Self {
            store,
            origin: origin.into(),
            compiler,
        }
    }

    /// Channel name used in descriptors and labels
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Diagnostic label of a unit
    pub fn label(&self, name: &str) -> String {
        format!("{}:{}.src", self.origin, name)
    }
}

impl CodeResolver for DynamicResolver {
    fn resolve(&self, name: &str) -> Option<UnitDescriptor> {
        let unit = self.store.get(name)?;
        Some(UnitDescriptor {
            name: name.to_string(),
            is_package: unit.is_package(),
            origin: self.origin.clone(),
            has_location: false,
        })
    }

    fn get_source(&self, name: &str) -> Option<Arc<str>> {
        self.store.get(name).map(|unit| unit.shared_source())
    }

    fn get_compiled_form(&self, name: &str) -> Result<Option<CompiledUnit>, ProtocolError> {
        let Some(source) = self.get_source(name) else {
            return Ok(None);
        };
        self.compiler.compile(name, &source, &self.label(name)).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowaway_proto::{CodeUnit, ResolverChain};

    fn resolver() -> DynamicResolver {
        let mut store = CodeUnitStore::new();
        store.insert(CodeUnit::package("stowaway", "package root")).unwrap();
        store.insert(CodeUnit::module("stowaway.server", "serve forever")).unwrap();
        store.seal();
        DynamicResolver::new(Arc::new(store), STDIN_ORIGIN)
    }

    #[test]
    fn test_resolve_present_units() {
        let resolver = resolver();

        let descriptor = resolver.resolve("stowaway").unwrap();
        assert!(descriptor.is_package);
        assert_eq!(descriptor.origin, "<stdin>");
        assert!(!descriptor.has_location);

        let descriptor = resolver.resolve("stowaway.server").unwrap();
        assert!(!descriptor.is_package);
        assert_eq!(resolver.get_source("stowaway.server").as_deref(), Some("serve forever"));
    }

    #[test]
    fn test_absent_units_defer() {
        let resolver = resolver();
        assert!(resolver.resolve("stowaway.hostwatch").is_none());
        assert!(resolver.get_source("stowaway.hostwatch").is_none());
        assert!(resolver.get_compiled_form("stowaway.hostwatch").unwrap().is_none());
    }

    #[test]
    fn test_compiled_form_label() {
        let resolver = resolver();
        let compiled = resolver.get_compiled_form("stowaway.server").unwrap().unwrap();
        assert_eq!(compiled.label, "<stdin>:stowaway.server.src");
        assert_eq!(compiled.name, "stowaway.server");
        assert_eq!(&*compiled.source, "serve forever");
    }

    #[test]
    fn test_empty_store_falls_through_chain() {
        struct Fallback;

        impl CodeResolver for Fallback {
            fn resolve(&self, name: &str) -> Option<UnitDescriptor> {
                Some(UnitDescriptor {
                    name: name.to_string(),
                    is_package: false,
                    origin: "fallback".to_string(),
                    has_location: true,
                })
            }

            fn get_source(&self, _name: &str) -> Option<Arc<str>> {
                None
            }

            fn get_compiled_form(
                &self,
                _name: &str,
            ) -> Result<Option<CompiledUnit>, ProtocolError> {
                Ok(None)
            }
        }

        let mut store = CodeUnitStore::new();
        store.seal();
        let dynamic = DynamicResolver::new(Arc::new(store), STDIN_ORIGIN);
        assert!(dynamic.resolve("anything").is_none());

        let mut chain = ResolverChain::new();
        chain.push(Arc::new(Fallback));
        chain.prepend(Arc::new(dynamic));

        let (_, descriptor) = chain.find("anything").unwrap();
        assert_eq!(descriptor.origin, "fallback");
    }
}
