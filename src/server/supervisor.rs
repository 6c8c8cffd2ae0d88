//! Service Supervisor
//!
//! Binds the UDP socket and the TCP listener on the same port, then runs
//! the two loops as independent tasks until both have finished. Under
//! normal operation neither loop finishes, so [`Server::run`] only returns
//! when the process is being torn down or a loop has panicked.
//!
//! ```text
//!            Server::bind(config)
//!                    │
//!        ┌───────────┴───────────┐
//!        ▼                       ▼
//!   UdpSocket::bind        TcpListener::bind
//!        │                       │
//!        ▼                       ▼
//!   spawn(UdpLoop)          spawn(TcpLoop)
//!        │                       │
//!        └───────────┬───────────┘
//!                    ▼
//!             tokio::join!(..)
//! ```

use crate::commands::CommandProcessor;
use crate::server::tcp::TcpLoop;
use crate::server::udp::UdpLoop;
use crate::server::{ServerConfig, ServerStats};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinError;
use tracing::{error, info};

/// Errors returned while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration value the loops cannot run with
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The UDP socket could not be bound
    #[error("failed to bind UDP socket on {addr}: {source}")]
    UdpBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The TCP listener could not be bound
    #[error("failed to bind TCP listener on {addr}: {source}")]
    TcpBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A bound socket could not report its local address
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),

    /// A loop task panicked or was cancelled
    #[error("{transport} loop failed: {source}")]
    LoopFailed {
        transport: &'static str,
        #[source]
        source: JoinError,
    },
}

/// A bound, not yet running, dual-protocol server.
pub struct Server {
    config: ServerConfig,
    udp_socket: UdpSocket,
    tcp_listener: TcpListener,
    processor: CommandProcessor,
    stats: Arc<ServerStats>,
}

impl Server {
    /// Binds both transports using the local system clock.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        Self::bind_with_processor(config, CommandProcessor::new()).await
    }

    /// Binds both transports, answering commands with `processor`.
    ///
    /// The UDP socket is bound first. The TCP listener is then bound to the
    /// UDP socket's actual address, so a configured port of `0` still yields
    /// a single port shared by both transports. Nothing is spawned until
    /// [`Server::run`]; on error every socket bound so far is closed.
    pub async fn bind_with_processor(
        config: ServerConfig,
        processor: CommandProcessor,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let addr = config.bind_address();

        let udp_socket = UdpSocket::bind(addr.as_str())
            .await
            .map_err(|source| ServerError::UdpBind {
                addr: addr.clone(),
                source,
            })?;
        let udp_addr = udp_socket.local_addr().map_err(ServerError::LocalAddr)?;
        info!("UDP listening on {}", udp_addr);

        let tcp_listener = TcpListener::bind(udp_addr)
            .await
            .map_err(|source| ServerError::TcpBind {
                addr: udp_addr.to_string(),
                source,
            })?;
        info!("TCP listening on {}", udp_addr);

        Ok(Self {
            config,
            udp_socket,
            tcp_listener,
            processor,
            stats: Arc::new(ServerStats::new()),
        })
    }

    /// The address both transports are bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.udp_socket.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Statistics shared by both loops.
    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Runs both loops and waits until both have finished.
    pub async fn run(self) -> Result<(), ServerError> {
        let Server {
            config,
            udp_socket,
            tcp_listener,
            processor,
            stats,
        } = self;

        let udp = UdpLoop::new(
            Arc::new(udp_socket),
            processor.clone(),
            config.max_inflight_datagrams,
            config.backoff,
            Arc::clone(&stats),
        );
        let tcp = TcpLoop::new(
            tcp_listener,
            processor,
            config.idle_timeout,
            config.max_connections,
            config.backoff,
            Arc::clone(&stats),
        );

        let udp_task = tokio::spawn(udp.run());
        let tcp_task = tokio::spawn(tcp.run());

        let (udp_result, tcp_result) = tokio::join!(udp_task, tcp_task);

        if let Err(e) = &udp_result {
            error!(error = %e, "UDP loop failed");
        }
        if let Err(e) = &tcp_result {
            error!(error = %e, "TCP loop failed");
        }

        udp_result.map_err(|source| ServerError::LoopFailed {
            transport: "UDP",
            source,
        })?;
        tcp_result.map_err(|source| ServerError::LoopFailed {
            transport: "TCP",
            source,
        })?;

        info!("UDP and TCP loops finished");
        Ok(())
    }
}

/// Serves on `port` on all interfaces with default settings.
///
/// Returns immediately with an error if either socket cannot be bound;
/// otherwise runs until both loops finish, which in practice is never.
pub async fn start(port: u16) -> Result<(), ServerError> {
    Server::bind(ServerConfig::with_port(port)).await?.run().await
}
