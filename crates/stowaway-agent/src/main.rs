//! Stowaway Agent Binary
//!
//! Started by the controller with the interpreter stub on its command line and
//! the boot script plus frames on stdin.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stowaway_agent::runtime::{set_verbosity, verbosity};
use stowaway_agent::{
    Agent, HostRuntime, ServerDriver, SERVER_ENTRY, SERVER_UNIT, STDIN_ORIGIN,
};
use stowaway_proto::{FsResolver, ResolverChain, Stub};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stowaway-agent",
    version,
    about = "Receiving interpreter for Stowaway bootstrap streams"
)]
struct Args {
    /// Interpreter stub, e.g. "verbosity=1; stdin=binary; exec=123"
    #[arg(short = 'c', value_name = "STUB")]
    stub: String,

    /// Local unit directories consulted after the shipped units
    #[arg(long = "unit-path", value_name = "DIR")]
    unit_paths: Vec<PathBuf>,
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let stub: Stub = args.stub.parse()?;
    set_verbosity(stub.verbosity);

    // stdout carries the channel, so diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Stowaway agent");

    let mut chain = ResolverChain::new();
    for dir in &args.unit_paths {
        chain.push(Arc::new(FsResolver::new(dir)));
    }
    let mut runtime = HostRuntime::with_chain(chain);
    runtime.register_entry_point(
        SERVER_UNIT,
        SERVER_ENTRY,
        Arc::new(ServerDriver::new(tokio::io::stdout())),
    );

    let mut agent = Agent::new(tokio::io::stdin(), STDIN_ORIGIN, runtime);
    if let Err(e) = agent.run(&stub).await {
        error!("Agent error: {:#}", e);
        std::process::exit(1);
    }

    info!("Agent shutting down");
    Ok(())
}
