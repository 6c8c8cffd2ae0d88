//! Time Protocol Implementation
//!
//! This module provides the wire vocabulary of the time server.
//!
//! ## Overview
//!
//! The protocol is plain text. A client sends one of three command words
//! and receives a single newline-terminated line back. TCP clients
//! terminate each command with `\n` and may send many commands over one
//! connection; UDP clients send one command per datagram.
//!
//! ## Modules
//!
//! - `types`: Defines `Command` and `Response`
//! - `parser`: Incremental line framing for TCP and datagram decoding for UDP
//!
//! ## Example
//!
//! ```
//! use timeserver::protocol::{Command, LineParser, Response};
//! use bytes::BytesMut;
//!
//! let mut buffer = BytesMut::from(&b"datetime\n"[..]);
//! let line = LineParser::new().parse(&mut buffer).unwrap().unwrap();
//! assert_eq!(Command::parse(&String::from_utf8_lossy(&line)), Command::DateTime);
//!
//! let response = Response::unknown_command();
//! assert_eq!(response.as_bytes(), b"Error: unknown command\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{decode_command, LineParser, ParseError, ParseResult, MAX_LINE_LENGTH};
pub use types::{Command, Response, UNKNOWN_COMMAND};
