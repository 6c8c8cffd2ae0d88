//! UDP Loop
//!
//! Owns the receive side of the UDP socket. Every datagram is answered by
//! its own spawned task, which sends exactly one reply datagram back to the
//! sender through the shared socket.
//!
//! ```text
//!   recv_from() ──> fresh 1 KB buffer ──> spawn ──> process ──> send_to(peer)
//!        ▲                                                          │
//!        └───────────────── next datagram ◄─────────────────────────┘
//! ```
//!
//! UDP is stateless here: there is no per-peer session, no newline
//! stripping, and no ordering between replies.

use crate::commands::CommandProcessor;
use crate::protocol::decode_command;
use crate::server::backoff::{Backoff, BackoffConfig};
use crate::server::ServerStats;
use bytes::{Bytes, BytesMut};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, trace, warn};

/// Receive buffer size. Longer datagrams are truncated to this many bytes
/// and processed as-is.
pub const DATAGRAM_BUFFER_SIZE: usize = 1024;

/// The receive loop for the UDP transport.
pub struct UdpLoop {
    /// Shared with every datagram handler for sending replies
    socket: Arc<UdpSocket>,
    processor: CommandProcessor,
    /// Bounds the number of datagram handlers alive at once
    limiter: Arc<Semaphore>,
    backoff: Backoff,
    stats: Arc<ServerStats>,
}

impl UdpLoop {
    pub fn new(
        socket: Arc<UdpSocket>,
        processor: CommandProcessor,
        max_inflight: usize,
        backoff: BackoffConfig,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            socket,
            processor,
            limiter: Arc::new(Semaphore::new(max_inflight)),
            backoff: Backoff::new(backoff),
            stats,
        }
    }

    /// Receives datagrams forever.
    ///
    /// Receive errors are logged and retried after a backoff; they never
    /// end the loop.
    pub async fn run(mut self) {
        loop {
            // Wait for a free handler slot before taking the next datagram
            let permit = match Arc::clone(&self.limiter).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("UDP admission limiter closed, stopping UDP loop");
                    return;
                }
            };

            // A fresh buffer per datagram; handlers never share one
            let mut buf = BytesMut::zeroed(DATAGRAM_BUFFER_SIZE);

            match self.socket.recv_from(&mut buf).await {
                Ok((n, peer)) => {
                    self.backoff.reset();
                    self.stats.datagram_received();

                    if n == DATAGRAM_BUFFER_SIZE {
                        debug!(peer = %peer, "Datagram filled the receive buffer, may be truncated");
                    }
                    trace!(peer = %peer, bytes = n, "Received datagram");

                    buf.truncate(n);
                    tokio::spawn(handle_datagram(
                        Arc::clone(&self.socket),
                        buf.freeze(),
                        peer,
                        self.processor.clone(),
                        Arc::clone(&self.stats),
                        permit,
                    ));
                }
                Err(e) => {
                    drop(permit);
                    self.recover_from_receive_error(&e).await;
                }
            }
        }
    }

    /// Logs a failed `recv_from()` and sleeps before the next attempt.
    async fn recover_from_receive_error(&mut self, error: &io::Error) {
        self.stats.receive_error();
        warn!(error = %error, "Unable to read packet");
        self.backoff.wait().await;
    }
}

/// Answers one datagram. The permit is released when the reply is sent.
async fn handle_datagram(
    socket: Arc<UdpSocket>,
    payload: Bytes,
    peer: SocketAddr,
    processor: CommandProcessor,
    stats: Arc<ServerStats>,
    _permit: OwnedSemaphorePermit,
) {
    let command = decode_command(&payload);
    let response = processor.process(&command);
    stats.command_processed();

    match socket.send_to(response.as_bytes(), peer).await {
        Ok(n) => {
            stats.datagram_sent(n);
            trace!(peer = %peer, bytes = n, "Sent reply datagram");
        }
        Err(e) => {
            debug!(peer = %peer, error = %e, "Failed to send reply datagram");
        }
    }
}
