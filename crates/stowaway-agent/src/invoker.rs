//! Boot script execution and entry-point invocation

use crate::assembler::FrameAssembler;
use crate::dynamic::DynamicResolver;
use crate::runtime::{verbosity, HostRuntime};
use crate::store::CodeUnitStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use stowaway_proto::{BootScript, Directive, ServerOptions};
use tokio::io::AsyncBufRead;
use tracing::{debug, info};

/// Native function callable from a boot script
#[async_trait]
pub trait EntryPoint: Send + Sync {
    /// Run with the configuration parsed from the options unit
    async fn call(&self, options: ServerOptions) -> Result<()>;
}

/// Load the options and driver units, then call `unit::function`
pub async fn invoke_entry_point(
    runtime: &mut HostRuntime,
    unit: &str,
    function: &str,
    options_unit: &str,
) -> Result<()> {
    let source = runtime.import(options_unit)?.compiled.source.clone();
    let options = ServerOptions::from_source(&source)
        .with_context(|| format!("Failed to parse options from {}", options_unit))?;

    runtime.import(unit)?;
    let entry = runtime.entry_point(unit, function)?;

    info!("Calling {}::{}", unit, function);
    debug!("Entry point options: {:?}", options);
    entry.call(options).await
}

/// Executes a boot script against a runtime and the inbound channel
pub struct BootRunner<'a, R> {
    runtime: &'a mut HostRuntime,
    reader: &'a mut R,
    origin: String,
}

impl<'a, R> BootRunner<'a, R>
where
    R: AsyncBufRead + Unpin,
{
    /// Runner reading frames from `reader`, labelled `origin`
    pub fn new(runtime: &'a mut HostRuntime, reader: &'a mut R, origin: impl Into<String>) -> Self {
        Self {
            runtime,
            reader,
            origin: origin.into(),
        }
    }

    /// Execute every directive in order; the first failure aborts the boot
    pub async fn run(&mut self, script: &BootScript) -> Result<()> {
        let mut assembled: Option<CodeUnitStore> = None;
        let mut installed = false;

        for directive in script.directives() {
            debug!("Boot directive: {}", directive);
            match directive {
                Directive::Assemble => {
                    if assembled.is_some() || installed {
                        bail!("frames were already assembled");
                    }
                    let store = FrameAssembler::with_verbosity(verbosity())
                        .assemble(&mut *self.reader)
                        .await
                        .context("Failed to assemble code units")?;
                    assembled = Some(store);
                }
                Directive::Install => {
                    let Some(store) = assembled.take() else {
                        bail!("install requires assembled frames");
                    };
                    let resolver = DynamicResolver::new(Arc::new(store), self.origin.clone());
                    self.runtime.install(Arc::new(resolver));
                    installed = true;
                }
                Directive::Import(name) => {
                    self.runtime
                        .import(name)
                        .with_context(|| format!("Failed to import {}", name))?;
                }
                Directive::Call { unit, function, options } => {
                    invoke_entry_point(&mut *self.runtime, unit, function, options).await?;
                }
            }
        }
        Ok(())
    }
}
