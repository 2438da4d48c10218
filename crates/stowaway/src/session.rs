//! Session setup and handoff
//!
//! A session parses the target, packages every unit, spawns the interpreter
//! with the stub on its command line, then writes the boot script, the frames
//! and the sentinel to the process's stdin. After that the channel belongs to
//! whatever the entry point speaks; the only thing the controller reads back
//! here is the readiness banner.

use crate::{Packager, Result, StowawayError};
use std::collections::HashSet;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use stowaway_proto::codec::read_counted;
use stowaway_proto::{
    BootScript, CodeResolver, CodeUnit, Frame, FrameCodec, ProtocolError, ServerOptions, Stub,
    OPTIONS_UNIT, READY_BANNER,
};
use stowaway_ssh::{build_argv, AddressSpec, CommandConfig, Connection};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Units shipped by default, after the options unit, in import order
pub const DEFAULT_UNITS: &[&str] = &[
    "stowaway",
    "stowaway.helpers",
    "stowaway.ssnet",
    "stowaway.hostwatch",
    "stowaway.server",
];

/// Unit exporting the default entry point
pub const DEFAULT_ENTRY_UNIT: &str = "stowaway.server";
/// Default entry point name
pub const DEFAULT_ENTRY_FUNCTION: &str = "main";

/// A unit to ship, either read from storage or given inline
#[derive(Debug, Clone)]
enum UnitSource {
    Named(String),
    Inline(CodeUnit),
}

impl UnitSource {
    fn name(&self) -> &str {
        match self {
            UnitSource::Named(name) => name,
            UnitSource::Inline(unit) => unit.name(),
        }
    }
}

/// Session builder for configuring a bootstrap
pub struct SessionBuilder {
    /// Target string: `[user@]host[:port]`, `[v6addr]:port`, or `-` for local
    target: String,
    /// Process invocation settings
    command: CommandConfig,
    /// Verbosity forwarded in the stub
    verbosity: u8,
    /// Entry point configuration
    options: ServerOptions,
    /// Units to ship after the options unit
    units: Vec<UnitSource>,
    /// Local storage for named units
    storage: Option<Arc<dyn CodeResolver>>,
    /// Entry point unit and function
    entry: (String, String),
    /// Where the interpreter's stderr goes (inherited when unset)
    stderr: Option<Stdio>,
}

impl SessionBuilder {
    /// Create a new session builder
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            command: CommandConfig::default(),
            verbosity: 0,
            options: ServerOptions::default(),
            units: DEFAULT_UNITS
                .iter()
                .map(|name| UnitSource::Named(name.to_string()))
                .collect(),
            storage: None,
            entry: (DEFAULT_ENTRY_UNIT.to_string(), DEFAULT_ENTRY_FUNCTION.to_string()),
            stderr: None,
        }
    }

    /// Replace the transport command (split on shell-word boundaries)
    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.command.transport = Some(transport.into());
        self
    }

    /// Use an explicit interpreter on the remote host instead of probing
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.command.interpreter = Some(interpreter.into());
        self
    }

    /// Agent binary used when the target is local
    pub fn with_local_agent(mut self, agent: impl Into<String>) -> Self {
        self.command.local_agent = agent.into();
        self
    }

    /// Set diagnostic verbosity for the remote side
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the entry point configuration
    pub fn with_options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the list of named units to ship
    pub fn with_units<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units = names
            .into_iter()
            .map(|name| UnitSource::Named(name.into()))
            .collect();
        self
    }

    /// Append a unit read from storage
    pub fn with_unit(mut self, name: impl Into<String>) -> Self {
        self.units.push(UnitSource::Named(name.into()));
        self
    }

    /// Append a unit whose source is given directly
    pub fn with_inline_unit(mut self, unit: CodeUnit) -> Self {
        self.units.push(UnitSource::Inline(unit));
        self
    }

    /// Set local storage for named units
    pub fn with_storage(mut self, storage: Arc<dyn CodeResolver>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the entry point called once the units are loaded
    pub fn with_entry_point(
        mut self,
        unit: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        self.entry = (unit.into(), function.into());
        self
    }

    /// Send the interpreter's stderr somewhere other than ours
    pub fn with_stderr(mut self, stderr: Stdio) -> Self {
        self.stderr = Some(stderr);
        self
    }

    /// The boot script this session will send
    pub fn boot_script(&self) -> BootScript {
        let imports = std::iter::once(OPTIONS_UNIT)
            .chain(self.units.iter().map(UnitSource::name))
            .map(str::to_string);
        BootScript::standard(imports, &self.entry.0, &self.entry.1, OPTIONS_UNIT)
    }

    /// Package every unit, in shipping order, with a fresh compression context
    fn package(&self) -> Result<Vec<Frame>> {
        let mut packager = Packager::new();
        let mut frames = Vec::with_capacity(self.units.len() + 1);
        let mut shipped = HashSet::new();

        let options = CodeUnit::module(OPTIONS_UNIT, self.options.to_source()?);
        let units = std::iter::once(UnitSource::Inline(options)).chain(self.units.iter().cloned());
        for unit in units {
            let frame = match &unit {
                UnitSource::Inline(unit) => packager.package(unit)?,
                UnitSource::Named(name) => {
                    let storage = self
                        .storage
                        .as_deref()
                        .ok_or_else(|| ProtocolError::UnitNotFound(name.clone()))?;
                    packager.package_named(storage, name)?
                }
            };
            if !shipped.insert(frame.name.clone()) {
                return Err(ProtocolError::DuplicateUnit(frame.name).into());
            }
            frames.push(frame);
        }

        debug!(
            "Packaged {} units ({} -> {} bytes)",
            frames.len(),
            packager.total_in(),
            packager.total_out()
        );
        Ok(frames)
    }

    /// Spawn the interpreter and hand it the code
    ///
    /// Every check runs before anything is spawned: a bad address, a unit
    /// missing from storage or a boot script referencing an unshipped unit
    /// fails here without starting a process.
    pub async fn start(self) -> Result<ConnectedSession> {
        let id = Uuid::new_v4();
        let span = info_span!("session", %id);
        self.handoff(id).instrument(span).await
    }

    async fn handoff(self, id: Uuid) -> Result<ConnectedSession> {
        let address = AddressSpec::parse(&self.target)?;
        let frames = self.package()?;

        let script = self.boot_script();
        for name in script.referenced_units() {
            if !frames.iter().any(|frame| frame.name == name) {
                return Err(ProtocolError::UnitNotFound(name.to_string()).into());
            }
        }
        let script = script.to_string();
        let stub = Stub {
            verbosity: self.verbosity,
            length: script.len(),
        };

        let argv = build_argv(&self.command, &address, &stub)?;
        info!("Starting interpreter for {}", address);
        let mut connection = Connection::spawn(&argv, self.stderr.unwrap_or_else(Stdio::inherit))?;

        let codec = FrameCodec::new();
        let stream = connection.stream_mut();
        stream.write_all(script.as_bytes()).await?;
        for frame in &frames {
            codec.write_frame(stream, frame).await?;
        }
        codec.write_sentinel(stream).await?;
        info!("Sent boot script and {} units", frames.len());

        Ok(ConnectedSession {
            id,
            address,
            connection,
        })
    }
}

/// A running interpreter that has received its code
#[derive(Debug)]
pub struct ConnectedSession {
    /// Session id used in logs
    id: Uuid,
    /// Parsed target
    address: AddressSpec,
    /// Process plus retained channel endpoint
    connection: Connection,
}

impl ConnectedSession {
    /// Get session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The parsed target
    pub fn address(&self) -> &AddressSpec {
        &self.address
    }

    /// The process and channel, for whatever the entry point speaks next
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Read the server driver's readiness banner off the channel
    pub async fn wait_ready(&mut self) -> Result<()> {
        let banner = read_counted(
            self.connection.stream_mut(),
            READY_BANNER.len(),
            "ready banner",
        )
        .await?;
        if banner != READY_BANNER {
            return Err(StowawayError::Session(format!(
                "unexpected banner {:?}",
                String::from_utf8_lossy(&banner)
            )));
        }
        info!(session = %self.id, "Server is ready");
        Ok(())
    }

    /// Close our sending direction; the interpreter sees end of input
    pub async fn shutdown_write(&mut self) -> Result<()> {
        self.connection.stream_mut().shutdown().await?;
        Ok(())
    }

    /// Wait for the interpreter to exit
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.connection.wait().await?;
        debug!(session = %self.id, "Interpreter exited with {}", status);
        Ok(status)
    }

    /// Kill the interpreter
    pub async fn close(mut self) -> Result<()> {
        info!(session = %self.id, "Closing session");
        self.connection.close().await?;
        Ok(())
    }
}
