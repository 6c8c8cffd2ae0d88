//! Connection Handler Module
//!
//! This module manages individual TCP client sessions.
//! Each accepted connection is handled by its own async task, which owns
//! the stream exclusively until the session ends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TcpLoop                                 │
//! │                  (server::tcp)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 SessionHandler                              │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read line   │───>│ Process cmd │───>│ Send resp   │     │
//! │  │ (deadline)  │    │             │    │             │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Idle Timeout**: Silent connections are reclaimed after 5 seconds
//! - **Pipelining**: Several command lines in a single TCP segment are answered in order
//! - **Statistics**: Tracks connection and command metrics

pub mod handler;

// Re-export commonly used types
pub use handler::{
    handle_connection, ConnectionError, SessionHandler, SessionOutcome, DEFAULT_IDLE_TIMEOUT,
};
