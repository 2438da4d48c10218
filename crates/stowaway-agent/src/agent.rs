//! Agent entry: interpret the stub, then run the boot script it points at

use crate::invoker::BootRunner;
use crate::runtime::{set_verbosity, HostRuntime};
use anyhow::{Context, Result};
use stowaway_proto::codec::read_counted;
use stowaway_proto::{BootScript, Stub, ASSEMBLER_UNIT};
use tokio::io::{AsyncRead, BufReader};
use tracing::{debug, info};

/// The receiving interpreter
pub struct Agent<R> {
    /// Inbound channel (stdin), buffered once for the whole session
    reader: BufReader<R>,
    /// Logical name of the inbound channel
    origin: String,
    /// Code-loading machinery
    runtime: HostRuntime,
}

impl<R> Agent<R>
where
    R: AsyncRead + Unpin,
{
    /// Agent reading from `reader`
    pub fn new(reader: R, origin: impl Into<String>, runtime: HostRuntime) -> Self {
        Self {
            reader: BufReader::new(reader),
            origin: origin.into(),
            runtime,
        }
    }

    /// Runtime, for inspection after a run
    pub fn runtime(&self) -> &HostRuntime {
        &self.runtime
    }

    /// Execute a parsed stub: read the boot script off the channel and run it
    pub async fn run(&mut self, stub: &Stub) -> Result<()> {
        set_verbosity(stub.verbosity);
        info!("Reading boot script ({} bytes)", stub.length);

        let raw = read_counted(&mut self.reader, stub.length, ASSEMBLER_UNIT)
            .await
            .context("Failed to read boot script")?;
        let text = std::str::from_utf8(&raw).context("Boot script is not valid UTF-8")?;
        let script: BootScript = text.parse()?;
        debug!("Boot script has {} directives", script.directives().len());

        BootRunner::new(&mut self.runtime, &mut self.reader, self.origin.clone())
            .run(&script)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::STDIN_ORIGIN;
    use crate::invoker::EntryPoint;
    use crate::runtime::verbosity;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use stowaway_proto::frame::SENTINEL;
    use stowaway_proto::{ProtocolError, ServerOptions, OPTIONS_UNIT};

    #[derive(Default)]
    struct Flag(AtomicBool);

    #[async_trait]
    impl EntryPoint for Flag {
        async fn call(&self, _options: ServerOptions) -> Result<()> {
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_truncated_boot_script() {
        let input = Cursor::new(b"assem".to_vec());
        let mut agent = Agent::new(input, STDIN_ORIGIN, HostRuntime::new());
        let err = agent.run(&Stub { verbosity: 3, length: 9 }).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::TruncatedStream(_))
        ));
        // Recorded before anything is read
        assert_eq!(verbosity(), 3);
    }

    #[tokio::test]
    async fn test_empty_bundle_then_missing_unit() {
        let imports = Vec::<String>::new();
        let script =
            BootScript::standard(imports, "stowaway.server", "main", OPTIONS_UNIT).to_string();
        let mut input = script.clone().into_bytes();
        input.extend_from_slice(SENTINEL);

        let flag = Arc::new(Flag::default());
        let mut runtime = HostRuntime::new();
        runtime.register_entry_point("stowaway.server", "main", flag.clone());

        let mut agent = Agent::new(Cursor::new(input), STDIN_ORIGIN, runtime);
        let err = agent
            .run(&Stub { verbosity: 3, length: script.len() })
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::UnitNotFound(name)) if name == "stowaway"
        ));
        assert!(!flag.0.load(Ordering::SeqCst));
        assert_eq!(agent.runtime().chain().len(), 1);
    }
}
