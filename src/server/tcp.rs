//! TCP Loop
//!
//! Owns the TCP listener and spawns one [`SessionHandler`] task per
//! accepted connection. The session task owns its stream; the loop keeps
//! nothing but the listener.
//!
//! [`SessionHandler`]: crate::connection::SessionHandler

use crate::commands::CommandProcessor;
use crate::connection::handle_connection;
use crate::server::backoff::{Backoff, BackoffConfig};
use crate::server::ServerStats;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// The accept loop for the TCP transport.
pub struct TcpLoop {
    listener: TcpListener,
    processor: CommandProcessor,
    idle_timeout: Duration,
    /// Bounds the number of open sessions
    limiter: Arc<Semaphore>,
    backoff: Backoff,
    stats: Arc<ServerStats>,
}

impl TcpLoop {
    pub fn new(
        listener: TcpListener,
        processor: CommandProcessor,
        idle_timeout: Duration,
        max_connections: usize,
        backoff: BackoffConfig,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            listener,
            processor,
            idle_timeout,
            limiter: Arc::new(Semaphore::new(max_connections)),
            backoff: Backoff::new(backoff),
            stats,
        }
    }

    /// Accepts connections forever.
    ///
    /// Accept errors are logged and retried after a backoff; they never end
    /// the loop. While `max_connections` sessions are open, new connections
    /// wait in the listen backlog.
    pub async fn run(mut self) {
        loop {
            let permit = match Arc::clone(&self.limiter).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("TCP admission limiter closed, stopping TCP loop");
                    return;
                }
            };

            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    self.backoff.reset();

                    let processor = self.processor.clone();
                    let idle_timeout = self.idle_timeout;
                    let stats = Arc::clone(&self.stats);

                    // Spawn a task to handle this connection
                    tokio::spawn(async move {
                        let outcome =
                            handle_connection(stream, addr, processor, idle_timeout, stats).await;
                        debug!(client = %addr, outcome = ?outcome, "Session finished");
                        drop(permit);
                    });
                }
                Err(e) => {
                    drop(permit);
                    self.recover_from_accept_error(&e).await;
                }
            }
        }
    }

    /// Logs a failed `accept()` and sleeps before the next attempt.
    async fn recover_from_accept_error(&mut self, error: &io::Error) {
        self.stats.accept_error();
        warn!(error = %error, "Error while waiting for a TCP connection");
        self.backoff.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::FixedClock;
    use chrono::{FixedOffset, TimeZone};
    use std::net::SocketAddr;
    use std::sync::atomic::Ordering;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn fixed_processor() -> CommandProcessor {
        let instant = FixedOffset::east_opt(-4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 15, 4, 5)
            .unwrap();
        CommandProcessor::with_clock(FixedClock::new(instant))
    }

    async fn create_test_server(max_connections: usize) -> (SocketAddr, Arc<ServerStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(ServerStats::new());

        let tcp = TcpLoop::new(
            listener,
            fixed_processor(),
            Duration::from_secs(5),
            max_connections,
            BackoffConfig::default(),
            Arc::clone(&stats),
        );
        tokio::spawn(tcp.run());

        (addr, stats)
    }

    async fn roundtrip(client: &mut TcpStream, request: &[u8]) -> Vec<u8> {
        client.write_all(request).await.unwrap();
        let mut buf = [0u8; 64];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .expect("no response")
            .unwrap();
        buf[..n].to_vec()
    }

    #[tokio::test]
    async fn test_accepts_multiple_connections() {
        let (addr, stats) = create_test_server(16).await;

        let mut a = TcpStream::connect(addr).await.unwrap();
        let mut b = TcpStream::connect(addr).await.unwrap();

        assert_eq!(roundtrip(&mut a, b"time\n").await, b"15:04:05-04:00\n");
        assert_eq!(roundtrip(&mut b, b"date\n").await, b"2024-03-09\n");
        assert_eq!(roundtrip(&mut a, b"date\n").await, b"2024-03-09\n");

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_connection_limit_queues_new_clients() {
        let (addr, _) = create_test_server(1).await;

        let mut first = TcpStream::connect(addr).await.unwrap();
        assert_eq!(roundtrip(&mut first, b"date\n").await, b"2024-03-09\n");

        // The second client connects (kernel backlog) but is not served yet
        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"date\n").await.unwrap();
        let mut buf = [0u8; 64];
        let pending =
            tokio::time::timeout(Duration::from_millis(200), second.read(&mut buf)).await;
        assert!(pending.is_err(), "second client was served while the limit was reached");

        // Closing the first session frees the slot
        drop(first);
        let n = tokio::time::timeout(Duration::from_secs(2), second.read(&mut buf))
            .await
            .expect("second client was never served")
            .unwrap();
        assert_eq!(&buf[..n], b"2024-03-09\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_errors_back_off_and_loop_keeps_serving() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(ServerStats::new());

        let mut tcp = TcpLoop::new(
            listener,
            fixed_processor(),
            Duration::from_secs(5),
            16,
            BackoffConfig {
                min_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
            },
            Arc::clone(&stats),
        );

        let start = tokio::time::Instant::now();
        let error = io::Error::new(io::ErrorKind::Other, "too many open files");
        for _ in 0..4 {
            tcp.recover_from_accept_error(&error).await;
        }

        // 10 + 20 + 40 + 40 ms
        assert!(start.elapsed() >= Duration::from_millis(110));
        assert_eq!(stats.accept_errors.load(Ordering::Relaxed), 4);

        // Real sockets from here on
        tokio::time::resume();
        tokio::spawn(tcp.run());

        let mut client = TcpStream::connect(addr).await.unwrap();
        assert_eq!(roundtrip(&mut client, b"date\n").await, b"2024-03-09\n");
    }
}
