//! Command Processing Module
//!
//! This module turns a command string into the response sent back to the
//! client. It does no I/O and holds no state besides its clock, so the same
//! processor is shared by every UDP and TCP handler.
//!
//! ## Architecture
//!
//! ```text
//! UDP datagram / TCP line
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandProcessor│  (handler module)
//! │                 │
//! │  - Parse        │
//! │  - Read clock   │
//! │  - Format       │
//! └────────┬────────┘
//!          │
//!          ▼
//!   "2024-03-09\n"
//! ```
//!
//! ## Supported Commands
//!
//! - `date`, `time`, `datetime`

pub mod clock;
pub mod handler;

// Re-export the main command processor
pub use clock::{Clock, FixedClock, SystemClock};
pub use handler::{process, CommandProcessor};
