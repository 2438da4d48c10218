//! Code resolution chain
//!
//! A host runtime loads code units by asking an ordered list of resolvers. The
//! first resolver that recognises a name wins; a resolver that does not know a
//! name returns `None` so the next one gets a chance.

use crate::ProtocolError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// File extension of code units in filesystem storage
pub const SOURCE_EXTENSION: &str = "src";
/// File holding the body of a package directory
pub const PACKAGE_FILE: &str = "mod.src";

/// What a resolver knows about a unit before loading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    /// Unit name
    pub name: String,
    /// Whether the unit is a package
    pub is_package: bool,
    /// Where the unit comes from, for diagnostics
    pub origin: String,
    /// Whether `origin` is a real filesystem location
    pub has_location: bool,
}

/// Executable form of a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Unit name
    pub name: String,
    /// Location label used in diagnostics
    pub label: String,
    /// Text the runtime interprets
    pub source: Arc<str>,
}

/// Turns source text into an executable unit
pub trait Compiler: Send + Sync {
    /// Compile `source`, tagging it with `label`
    fn compile(&self, name: &str, source: &str, label: &str) -> Result<CompiledUnit, ProtocolError>;
}

/// Compiler for runtimes that interpret the text form directly
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCompiler;

impl Compiler for TextCompiler {
    fn compile(
        &self,
        name: &str,
        source: &str,
        label: &str,
    ) -> Result<CompiledUnit, ProtocolError> {
        Ok(CompiledUnit {
            name: name.to_string(),
            label: label.to_string(),
            source: Arc::from(source),
        })
    }
}

/// A provider in the resolver chain
pub trait CodeResolver: Send + Sync {
    /// Describe `name`, or `None` to defer to the next resolver
    fn resolve(&self, name: &str) -> Option<UnitDescriptor>;

    /// Source text of `name`, if this resolver holds it
    fn get_source(&self, name: &str) -> Option<Arc<str>>;

    /// Compiled form of `name`, if this resolver holds it
    fn get_compiled_form(&self, name: &str) -> Result<Option<CompiledUnit>, ProtocolError>;
}

/// Ordered list of resolvers consulted front to back
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn CodeResolver>>,
}

impl ResolverChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolver ahead of every existing one
    pub fn prepend(&mut self, resolver: Arc<dyn CodeResolver>) {
        self.resolvers.insert(0, resolver);
    }

    /// Append a resolver behind every existing one
    pub fn push(&mut self, resolver: Arc<dyn CodeResolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of resolvers
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether the chain has no resolvers
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// First resolver that knows `name`, with its descriptor
    pub fn find(&self, name: &str) -> Option<(Arc<dyn CodeResolver>, UnitDescriptor)> {
        self.resolvers.iter().enumerate().find_map(|(index, resolver)| {
            let descriptor = resolver.resolve(name)?;
            trace!("Resolver #{} claims {}", index, name);
            Some((Arc::clone(resolver), descriptor))
        })
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

/// Resolver backed by a directory tree
///
/// `a.b` is looked up as the package `a/b/mod.src`, then as the plain unit `a/b.src`.
pub struct FsResolver {
    root: PathBuf,
    compiler: Arc<dyn Compiler>,
}

impl FsResolver {
    /// Resolver rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_compiler(root, Arc::new(TextCompiler))
    }

    /// Resolver rooted at `root` with a custom compiler
    pub fn with_compiler(root: impl Into<PathBuf>, compiler: Arc<dyn Compiler>) -> Self {
        Self {
            root: root.into(),
            compiler,
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Locate `name` on disk, returning the path and package flag
    fn locate(&self, name: &str) -> Option<(PathBuf, bool)> {
        let mut dir = self.root.clone();
        let parts: Vec<&str> = name.split('.').collect();
        if parts.iter().any(|part| !is_path_safe(part)) {
            return None;
        }
        dir.extend(&parts);

        let package = dir.join(PACKAGE_FILE);
        if package.is_file() {
            return Some((package, true));
        }
        let module = dir.with_extension(SOURCE_EXTENSION);
        if module.is_file() {
            return Some((module, false));
        }
        None
    }
}

fn is_path_safe(part: &str) -> bool {
    !part.is_empty() && part != ".." && !part.contains(['/', '\\'])
}

impl CodeResolver for FsResolver {
    fn resolve(&self, name: &str) -> Option<UnitDescriptor> {
        let (path, is_package) = self.locate(name)?;
        Some(UnitDescriptor {
            name: name.to_string(),
            is_package,
            origin: path.display().to_string(),
            has_location: true,
        })
    }

    fn get_source(&self, name: &str) -> Option<Arc<str>> {
        let (path, _) = self.locate(name)?;
        fs::read_to_string(path).ok().map(Arc::from)
    }

    fn get_compiled_form(&self, name: &str) -> Result<Option<CompiledUnit>, ProtocolError> {
        let Some((path, _)) = self.locate(name) else {
            return Ok(None);
        };
        let source = fs::read_to_string(&path)?;
        let label = path.display().to_string();
        self.compiler.compile(name, &source, &label).map(Some)
    }
}
