//! Interpreter process and its duplex channel

use crate::TransportError;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::process::{ExitStatus, Stdio};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// A spawned interpreter process plus the parent's end of its socket pair
#[derive(Debug)]
pub struct Connection {
    /// Transport process handle
    process: Option<Child>,
    /// Parent end of the channel; the child owns the other end as stdin and stdout
    stream: UnixStream,
}

impl Connection {
    /// Spawn `argv` with one end of a fresh socket pair as its stdin and stdout
    ///
    /// `stderr` is passed through untouched. Must be called from within a tokio runtime.
    pub fn spawn(argv: &[String], stderr: Stdio) -> Result<Self, TransportError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TransportError::Configuration("empty command line".to_string()))?;

        let (parent_end, child_end) = StdUnixStream::pair()?;
        // Separate descriptors for stdin and stdout, so either can be closed alone
        let child_stdin = OwnedFd::from(child_end.try_clone()?);
        let child_stdout = OwnedFd::from(child_end.try_clone()?);
        drop(child_end);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::from(child_stdin))
            .stdout(Stdio::from(child_stdout))
            .stderr(stderr);

        debug!("Executing: {:?}", argv);
        let process = command.spawn().map_err(|source| TransportError::SpawnFailed {
            program: program.clone(),
            source,
        })?;
        // Closes the parent's copies of the child end
        drop(command);

        parent_end.set_nonblocking(true)?;
        let stream = UnixStream::from_std(parent_end)?;

        Ok(Self {
            process: Some(process),
            stream,
        })
    }

    /// Check if the process handle is still held
    pub fn is_connected(&self) -> bool {
        self.process.is_some()
    }

    /// OS process id, while the process is running
    pub fn id(&self) -> Option<u32> {
        self.process.as_ref()?.id()
    }

    /// The retained channel endpoint
    pub fn stream_mut(&mut self) -> &mut UnixStream {
        &mut self.stream
    }

    /// Get mutable reference to the process
    pub fn process_mut(&mut self) -> Option<&mut Child> {
        self.process.as_mut()
    }

    /// Wait for the process to exit
    pub async fn wait(&mut self) -> Result<ExitStatus, TransportError> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| TransportError::Configuration("process already released".to_string()))?;
        Ok(process.wait().await?)
    }

    /// Kill the process and reap it
    pub async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut child) = self.process.take() {
            debug!("Closing interpreter process");

            if let Err(e) = child.kill().await {
                warn!("Failed to kill interpreter process: {}", e);
            }
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(mut child) = self.process.take() {
            // Try to kill the process if it's still running
            let _ = child.start_kill();
        }
    }
}
