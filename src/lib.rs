//! # timeserver - A Dual-Protocol Time Server
//!
//! timeserver answers time queries over UDP and TCP on the same port,
//! using a tiny line-oriented text protocol.
//!
//! ## Features
//!
//! - **Dual Protocol**: One UDP socket and one TCP listener share a port number
//! - **Stateless UDP**: Each datagram is answered independently by its own task
//! - **Persistent TCP**: A connection can carry many commands, one per line
//! - **Idle Timeout**: TCP connections silent for 5 seconds are closed
//! - **Async I/O**: Built on Tokio; every handler runs as its own task
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            timeserver                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐                                     │
//! │  │  UdpLoop    │───>│  datagram   │──┐                                  │
//! │  │ (recv_from) │    │  handler    │  │    ┌──────────────────┐          │
//! │  └─────────────┘    └─────────────┘  ├───>│ CommandProcessor │          │
//! │  ┌─────────────┐    ┌─────────────┐  │    │   (Clock)        │          │
//! │  │  TcpLoop    │───>│  Session    │──┘    └──────────────────┘          │
//! │  │ (accept)    │    │  Handler    │                                     │
//! │  └─────────────┘    └─────────────┘                                     │
//! │         ▲                  ▲                                            │
//! │         └──── Server ──────┘  (binds both, joins both)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use timeserver::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), timeserver::ServerError> {
//!     let server = Server::bind(ServerConfig::with_port(8000)).await?;
//!     server.run().await
//! }
//! ```
//!
//! ## Protocol
//!
//! - `date` - `2024-03-09`
//! - `time` - `15:04:05+02:00`
//! - `datetime` - `2024-03-09T15:04:05+02:00`
//! - anything else - `Error: unknown command`
//!
//! Every response ends with a single `\n`.
//!
//! ## Module Overview
//!
//! - [`protocol`]: Command and response types, line framing
//! - [`commands`]: The command processor and its clock
//! - [`connection`]: Per-connection TCP session handling
//! - [`server`]: UDP loop, TCP loop and the supervisor that runs both

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod server;

// Re-export commonly used types for convenience
pub use commands::{process, Clock, CommandProcessor, FixedClock, SystemClock};
pub use connection::{handle_connection, ConnectionError, SessionHandler, SessionOutcome};
pub use protocol::{Command, LineParser, ParseError, Response};
pub use server::{start, Server, ServerConfig, ServerError, ServerStats};

/// The default port timeserver listens on, for both UDP and TCP
pub const DEFAULT_PORT: u16 = 8000;

/// The default host timeserver binds to (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of timeserver
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
