//! Dual-Protocol Server Module
//!
//! This module owns the network side of the time server: one UDP socket
//! and one TCP listener on the same port, each driven by its own loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Server (supervisor)                     │
//! │                                                             │
//! │  ┌──────────────────────┐      ┌──────────────────────┐     │
//! │  │       UdpLoop        │      │       TcpLoop        │     │
//! │  │  recv_from() forever │      │   accept() forever   │     │
//! │  └──────────┬───────────┘      └──────────┬───────────┘     │
//! │             │ spawn per datagram          │ spawn per conn  │
//! │             ▼                             ▼                 │
//! │     handle_datagram()              SessionHandler           │
//! │             │                             │                 │
//! │             └──────────┬──────────────────┘                 │
//! │                        ▼                                    │
//! │                 CommandProcessor                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Shared Port**: UDP and TCP are bound to the same port number
//! - **Admission Control**: Semaphores cap concurrent sessions and datagram handlers
//! - **Backoff**: Failed `accept()`/`recv_from()` calls are retried with exponential backoff
//! - **Statistics**: Atomic counters shared by every task

pub mod backoff;
pub mod config;
pub mod stats;
pub mod supervisor;
pub mod tcp;
pub mod udp;

// Re-export commonly used types
pub use backoff::{Backoff, BackoffConfig};
pub use config::{ServerConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_INFLIGHT_DATAGRAMS};
pub use stats::ServerStats;
pub use supervisor::{start, Server, ServerError};
pub use tcp::TcpLoop;
pub use udp::{UdpLoop, DATAGRAM_BUFFER_SIZE};
