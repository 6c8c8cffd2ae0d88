//! TCP Session Handler
//!
//! This module handles individual TCP client connections.
//! Each client gets its own handler task that runs in a loop,
//! reading command lines and sending responses.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. SessionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      AwaitingLine            │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ deadline = now + idle   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read until '\n'         │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Processing              │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Send response           │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Idle timeout / EOF / error
//!        │
//!        ▼
//! 5. Stream dropped, handler task ends
//! ```
//!
//! ## Idle Timeout
//!
//! Before waiting for each line the handler sets a deadline of
//! `now + idle_timeout`. Every read needed to complete that line, and the
//! write of its response, must finish before the deadline. A client that
//! keeps sending commands keeps the connection alive; a silent one is
//! disconnected once the deadline passes.

use crate::commands::CommandProcessor;
use crate::protocol::{decode_command, LineParser, ParseError, Response};
use crate::server::ServerStats;
use bytes::{Bytes, BytesMut};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, trace, warn};

/// How long a connection may stay silent before it is closed
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 1024;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// No complete line arrived (or the response could not be written)
    /// before the idle deadline
    ClosedByTimeout,
    /// The client closed its side of the connection
    ClosedByEof,
    /// Any other read or write failure
    ClosedByError,
}

/// Handles a single client connection.
///
/// This struct manages the read buffer, line framing, and response sending
/// for one connected client. It is generic over the stream so the same code
/// drives a `TcpStream` in production and a scripted stream in tests.
pub struct SessionHandler<S> {
    /// The connection, exclusively owned by this handler
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The command processor (shared across connections)
    processor: CommandProcessor,

    /// Line framing
    parser: LineParser,

    /// Maximum silence before the connection is closed
    idle_timeout: Duration,

    /// Server statistics (shared)
    stats: Arc<ServerStats>,
}

impl<S> SessionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new session handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The connection for this session
    /// * `addr` - The client's socket address
    /// * `processor` - The command processor for answering commands
    /// * `idle_timeout` - Maximum wait for each command line
    /// * `stats` - Shared server statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        processor: CommandProcessor,
        idle_timeout: Duration,
        stats: Arc<ServerStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            processor,
            parser: LineParser::new(),
            idle_timeout,
            stats,
        }
    }

    /// Runs the session until it reaches a terminal state.
    ///
    /// The stream is closed when the handler is dropped at the end of this
    /// call, which happens exactly once whatever the outcome.
    pub async fn run(mut self) -> SessionOutcome {
        info!(client = %self.addr, "Client connected");

        let error = match self.main_loop().await {
            Ok(never) => match never {},
            Err(e) => e,
        };

        let outcome = match &error {
            ConnectionError::IdleTimeout(timeout) => {
                self.stats.idle_timeout();
                debug!(client = %self.addr, timeout = ?timeout, "TCP timeout, closing connection");
                SessionOutcome::ClosedByTimeout
            }
            ConnectionError::ClientDisconnected => {
                debug!(client = %self.addr, "Client disconnected");
                SessionOutcome::ClosedByEof
            }
            ConnectionError::UnexpectedEof => {
                debug!(client = %self.addr, "Client disconnected mid-line, discarding partial command");
                SessionOutcome::ClosedByEof
            }
            ConnectionError::Io(io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client");
                SessionOutcome::ClosedByError
            }
            _ => {
                warn!(client = %self.addr, error = %error, "Connection error");
                SessionOutcome::ClosedByError
            }
        };

        self.stats.connection_closed();
        info!(client = %self.addr, outcome = ?outcome, "Connection closed");
        outcome
    }

    /// The read-process-respond loop. Only returns on a terminal error.
    async fn main_loop(&mut self) -> Result<Infallible, ConnectionError> {
        loop {
            let deadline = Instant::now() + self.idle_timeout;

            let line = self.read_line(deadline).await?;
            let command = decode_command(&line);
            let response = self.processor.process(&command);
            self.stats.command_processed();

            self.send_response(&response, deadline).await?;
        }
    }

    /// Returns the next complete line, reading from the socket as needed.
    async fn read_line(&mut self, deadline: Instant) -> Result<Bytes, ConnectionError> {
        let idle_timeout = self.idle_timeout;

        loop {
            // Pipelined commands may already be buffered
            if let Some(line) = self.parser.parse(&mut self.buffer)? {
                trace!(
                    client = %self.addr,
                    len = line.len(),
                    remaining = self.buffer.len(),
                    "Parsed command line"
                );
                return Ok(line);
            }

            match timeout_at(deadline, self.read_more_data()).await {
                Ok(result) => result?,
                Err(_elapsed) => return Err(ConnectionError::IdleTimeout(idle_timeout)),
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 256 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Sends a response to the client before the deadline passes.
    async fn send_response(
        &mut self,
        response: &Response,
        deadline: Instant,
    ) -> Result<(), ConnectionError> {
        let idle_timeout = self.idle_timeout;
        let bytes = response.as_bytes();
        let write = async {
            self.stream.write_all(bytes).await?;
            self.stream.flush().await
        };

        match timeout_at(deadline, write).await {
            Ok(result) => result?,
            Err(_elapsed) => return Err(ConnectionError::IdleTimeout(idle_timeout)),
        }

        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent response");
        Ok(())
    }
}

/// Errors that end a TCP session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client sent more than a line's worth of bytes without a newline
    #[error("framing error: {0}")]
    Parse(#[from] ParseError),

    /// Nothing usable arrived before the idle deadline
    #[error("no complete command within {0:?}")]
    IdleTimeout(Duration),

    /// Client disconnected between commands
    #[error("client disconnected")]
    ClientDisconnected,

    /// Client disconnected in the middle of a line
    #[error("unexpected end of stream")]
    UnexpectedEof,
}

/// Handles a client connection.
///
/// This is a convenience function that creates a SessionHandler
/// and runs it to completion.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    processor: CommandProcessor,
    idle_timeout: Duration,
    stats: Arc<ServerStats>,
) -> SessionOutcome {
    SessionHandler::new(stream, addr, processor, idle_timeout, stats)
        .run()
        .await
}
