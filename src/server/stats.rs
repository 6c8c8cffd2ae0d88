//! Server Statistics
//!
//! Counters shared by the UDP loop, the TCP loop and every handler they
//! spawn. All updates use relaxed atomics: the numbers are for logging and
//! tests, nothing synchronizes on them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for both transports
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Total number of TCP connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently open TCP connections
    pub active_connections: AtomicU64,
    /// TCP connections closed by the idle timeout
    pub idle_timeouts: AtomicU64,
    /// Total commands processed over either transport
    pub commands_processed: AtomicU64,
    /// Total bytes read from TCP connections
    pub bytes_read: AtomicU64,
    /// Total bytes written over either transport
    pub bytes_written: AtomicU64,
    /// Datagrams received on the UDP socket
    pub datagrams_received: AtomicU64,
    /// Reply datagrams successfully sent
    pub datagrams_sent: AtomicU64,
    /// Failed `accept()` calls on the TCP listener
    pub accept_errors: AtomicU64,
    /// Failed `recv_from()` calls on the UDP socket
    pub receive_errors: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn idle_timeout(&self) {
        self.idle_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn datagram_received(&self) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn datagram_sent(&self, count: usize) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_written(count);
    }

    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counters() {
        let stats = ServerStats::new();

        stats.connection_opened();
        stats.connection_opened();
        stats.connection_closed();

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 2);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_datagram_counters() {
        let stats = ServerStats::new();

        stats.datagram_received();
        stats.datagram_sent(11);

        assert_eq!(stats.datagrams_received.load(Ordering::Relaxed), 1);
        assert_eq!(stats.datagrams_sent.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 11);
    }
}
