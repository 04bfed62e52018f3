//! Maskroom relay server binary.
//!
//! # Usage
//!
//! ```bash
//! maskroom-server --bind 0.0.0.0:8000
//! ```
//!
//! Terminate TLS in front of this process; clients derive `wss://` from an
//! `https://` backend URL and expect the proxy to speak it.

use clap::Parser;
use maskroom_server::RelayServer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Maskroom relay server
#[derive(Parser, Debug)]
#[command(name = "maskroom-server")]
#[command(about = "Blind relay for ephemeral encrypted rooms")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Maskroom relay starting");
    tracing::info!("Binding to {}", args.bind);

    let server = RelayServer::bind(&args.bind).await?;

    tracing::info!("Relay listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
