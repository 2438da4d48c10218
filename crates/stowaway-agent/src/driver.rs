//! Built-in server driver entry point

use crate::invoker::EntryPoint;
use anyhow::{Context, Result};
use async_trait::async_trait;
use stowaway_proto::{ServerOptions, READY_BANNER};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::info;

/// Unit exporting the server driver
pub const SERVER_UNIT: &str = "stowaway.server";
/// Name of the driver's entry point
pub const SERVER_ENTRY: &str = "main";

/// Announces readiness on the channel and reports the configuration it was started with
pub struct ServerDriver<W> {
    writer: Mutex<W>,
}

impl<W> ServerDriver<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Driver writing to `writer` (the agent's stdout)
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W> EntryPoint for ServerDriver<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn call(&self, options: ServerOptions) -> Result<()> {
        info!(
            latency_control = options.latency_control,
            auto_hosts = options.auto_hosts,
            to_nameserver = ?options.to_nameserver,
            "Server driver starting"
        );

        let mut writer = self.writer.lock().await;
        writer.write_all(READY_BANNER).await.context("Failed to write ready banner")?;
        writer.flush().await.context("Failed to flush ready banner")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_driver_writes_banner() {
        let driver = ServerDriver::new(Vec::new());
        driver.call(ServerOptions::default()).await.unwrap();
        assert_eq!(driver.writer.into_inner(), READY_BANNER);
    }
}
