//! timeserver - A Dual-Protocol Time Server
//!
//! This is the main entry point for the timeserver binary.
//! It parses the command line, sets up logging, binds the UDP socket and
//! TCP listener, and serves until killed.

use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use timeserver::{Server, ServerConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Answers `date`, `time` and `datetime` queries over UDP and TCP.
#[derive(Parser, Debug)]
#[command(name = "timeserver", author, version, about, long_about = None)]
struct Cli {
    /// Port on which to serve requests, shared by UDP and TCP
    #[arg(long, default_value_t = timeserver::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = timeserver::DEFAULT_HOST)]
    host: String,

    /// Seconds a TCP connection may stay silent before it is closed
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    idle_timeout_secs: u64,

    /// Maximum number of TCP connections served at once
    #[arg(long, default_value_t = timeserver::server::DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Maximum number of UDP datagrams being answered at once
    #[arg(long, default_value_t = timeserver::server::DEFAULT_MAX_INFLIGHT_DATAGRAMS)]
    max_inflight_datagrams: usize,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            max_connections: self.max_connections,
            max_inflight_datagrams: self.max_inflight_datagrams,
            ..Default::default()
        }
    }
}

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
timeserver v{} - Dual-Protocol Time Server
──────────────────────────────────────────────────────────────
Serving UDP and TCP on {}
Commands: date | time | datetime

Use Ctrl+C to stop.
"#,
        timeserver::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Cli::parse().into_config();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Bind both sockets before anything is served
    let server = Server::bind(config.clone())
        .await
        .with_context(|| format!("failed to start server on {}", config.bind_address()))?;

    print_banner(&config);
    info!(
        idle_timeout = ?config.idle_timeout,
        max_connections = config.max_connections,
        max_inflight_datagrams = config.max_inflight_datagrams,
        "Server started"
    );

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        result = server.run() => result.context("server stopped unexpectedly")?,
        _ = shutdown => {}
    }

    info!("Server stopped");
    Ok(())
}
