//! Time Protocol Data Types
//!
//! This module defines the two values that travel over the wire:
//! the command a client sends and the response the server writes back.
//!
//! ## Protocol Format
//!
//! A request is a single command word. Over TCP it is terminated by `\n`,
//! over UDP the whole datagram is the command.
//!
//! - `date`     -> `2024-03-09\n`
//! - `time`     -> `15:04:05+02:00\n`
//! - `datetime` -> `2024-03-09T15:04:05+02:00\n`
//! - anything else -> `Error: unknown command\n`
//!
//! Every response is terminated by exactly one newline.

use std::fmt;

/// The line terminator used by the protocol
pub const NEWLINE: u8 = b'\n';

/// Body sent back for anything that is not a recognized command
pub const UNKNOWN_COMMAND: &str = "Error: unknown command";

/// A command received from a client.
///
/// Matching is exact and case-sensitive: `DATE`, ` date` and `date\r`
/// are all [`Command::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Current local date, `YYYY-MM-DD`
    Date,
    /// Current local time with UTC offset, `HH:MM:SS+hh:mm`
    Time,
    /// Current local date and time in RFC 3339
    DateTime,
    /// Anything else
    Unknown,
}

impl Command {
    /// Parses a command word.
    ///
    /// # Example
    /// ```
    /// use timeserver::protocol::types::Command;
    /// assert_eq!(Command::parse("date"), Command::Date);
    /// assert_eq!(Command::parse("Date"), Command::Unknown);
    /// ```
    pub fn parse(input: &str) -> Self {
        match input {
            "date" => Command::Date,
            "time" => Command::Time,
            "datetime" => Command::DateTime,
            _ => Command::Unknown,
        }
    }

    /// Returns the wire name of the command, or `None` for unknown input.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Command::Date => Some("date"),
            Command::Time => Some("time"),
            Command::DateTime => Some("datetime"),
            Command::Unknown => None,
        }
    }
}

/// A response ready to be written to a client.
///
/// The newline terminator is added on construction, so a `Response`
/// always ends in exactly one `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    text: String,
}

impl Response {
    /// Creates a response from a body that must not contain the terminator.
    pub fn new(body: impl Into<String>) -> Self {
        let mut text = body.into();
        text.push(NEWLINE as char);
        Self { text }
    }

    /// The fixed reply to an unrecognized command.
    pub fn unknown_command() -> Self {
        Self::new(UNKNOWN_COMMAND)
    }

    /// Returns the body without the trailing newline.
    pub fn body(&self) -> &str {
        &self.text[..self.text.len() - 1]
    }

    /// Returns `true` if this is the unknown command reply.
    pub fn is_error(&self) -> bool {
        self.body() == UNKNOWN_COMMAND
    }

    /// Returns the full wire representation, newline included.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Returns the full reply text, newline included.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.body())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("<unknown>"))
    }
}
