//! Server configuration

use crate::connection::DEFAULT_IDLE_TIMEOUT;
use crate::server::backoff::BackoffConfig;
use crate::server::ServerError;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default limit on concurrently open TCP sessions
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default limit on concurrently running UDP handlers
pub const DEFAULT_MAX_INFLIGHT_DATAGRAMS: usize = 1024;

/// Longest accepted idle timeout (one day)
pub const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration shared by both transports.
///
/// UDP and TCP always bind the same `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on, for both UDP and TCP. `0` picks one ephemeral
    /// port that both transports share.
    pub port: u16,

    /// Maximum silence on a TCP connection before it is closed
    pub idle_timeout: Duration,

    /// Maximum number of TCP sessions served at once
    pub max_connections: usize,

    /// Maximum number of datagrams being answered at once
    pub max_inflight_datagrams: usize,

    /// Retry policy for failed `accept()` / `recv_from()` calls
    pub backoff: BackoffConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_inflight_datagrams: DEFAULT_MAX_INFLIGHT_DATAGRAMS,
            backoff: BackoffConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Default configuration listening on `port` on all interfaces.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Returns the bind address as a string.
    ///
    /// IPv6 literals are bracketed, so `--host ::` binds `[::]:8000`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Rejects values the loops cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        check_limit("max_connections", self.max_connections)?;
        check_limit("max_inflight_datagrams", self.max_inflight_datagrams)?;

        if self.idle_timeout.is_zero() || self.idle_timeout > MAX_IDLE_TIMEOUT {
            return Err(ServerError::InvalidConfig(format!(
                "idle_timeout must be between 1ns and {:?}, got {:?}",
                MAX_IDLE_TIMEOUT, self.idle_timeout
            )));
        }
        if self.backoff.min_delay > self.backoff.max_delay {
            return Err(ServerError::InvalidConfig(
                "backoff min_delay must not exceed max_delay".to_string(),
            ));
        }
        Ok(())
    }
}

/// Admission limits back a `Semaphore`, which only holds up to `MAX_PERMITS`.
fn check_limit(name: &str, value: usize) -> Result<(), ServerError> {
    if value == 0 || value > Semaphore::MAX_PERMITS {
        return Err(ServerError::InvalidConfig(format!(
            "{} must be between 1 and {}, got {}",
            name,
            Semaphore::MAX_PERMITS,
            value
        )));
    }
    Ok(())
}
