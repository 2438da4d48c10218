//! End-to-end: the controller boots the real agent binary in local mode

use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use stowaway::{SessionBuilder, StowawayError};
use stowaway_proto::{FsResolver, ProtocolError, ServerOptions};

const AGENT: &str = env!("CARGO_BIN_EXE_stowaway-agent");

fn write_storage(root: &Path) {
    let package = root.join("stowaway");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("mod.src"), "# stowaway\n").unwrap();
    for name in ["helpers", "ssnet", "hostwatch", "server"] {
        fs::write(package.join(format!("{}.src", name)), format!("# {}\n", name)).unwrap();
    }
}

#[tokio::test]
async fn test_local_bootstrap_reaches_server() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_storage(dir.path());

    let mut session = SessionBuilder::new("-")
        .with_local_agent(AGENT)
        .with_storage(Arc::new(FsResolver::new(dir.path())))
        .with_options(ServerOptions {
            latency_control: true,
            auto_hosts: true,
            to_nameserver: None,
        })
        .with_verbosity(2)
        .start()
        .await?;

    session.wait_ready().await?;
    let status = session.wait().await?;
    assert!(status.success());
    Ok(())
}

#[tokio::test]
async fn test_unknown_entry_point_exits_nonzero() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_storage(dir.path());

    let mut session = SessionBuilder::new("-")
        .with_local_agent(AGENT)
        .with_storage(Arc::new(FsResolver::new(dir.path())))
        .with_entry_point("stowaway.helpers", "main")
        .with_stderr(Stdio::null())
        .start()
        .await?;

    let status = session.wait().await?;
    assert_eq!(status.code(), Some(1));

    // The agent never answered, so there is no banner to read
    let result = session.wait_ready().await;
    assert!(matches!(
        result,
        Err(StowawayError::Protocol(ProtocolError::TruncatedStream(_)))
    ));
    Ok(())
}
