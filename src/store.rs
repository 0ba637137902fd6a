//! Persistence-layer connection seam.
//!
//! The core only ever calls [`Store::connect`] once, at startup, from a
//! detached task. Whatever the outcome, request serving continues; storage
//! failures surface lazily inside the mounted handlers that use storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

use crate::error::StoreError;

/// Default timeout for the startup connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ports assumed for common database schemes when the URL carries none.
const DEFAULT_SCHEME_PORTS: &[(&str, u16)] = &[
    ("mongodb", 27017),
    ("postgres", 5432),
    ("postgresql", 5432),
    ("mysql", 3306),
    ("redis", 6379),
];

/// A persistence backend the core can ask to connect.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Establish (or verify) the backend connection.
    async fn connect(&self) -> Result<(), StoreError>;
}

/// Store that verifies reachability of the database host over TCP.
#[derive(Debug, Clone)]
pub struct TcpStore {
    url: Option<String>,
    timeout: Duration,
}

impl TcpStore {
    /// Create a store for the given database URL.
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the connection timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `host:port` from the configured URL.
    pub fn address(&self) -> Result<String, StoreError> {
        let raw = self.url.as_deref().ok_or(StoreError::NotConfigured)?;
        let url = Url::parse(raw).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StoreError::InvalidUrl("URL has no host".to_string()))?;

        let port = url
            .port_or_known_default()
            .or_else(|| {
                DEFAULT_SCHEME_PORTS
                    .iter()
                    .find(|(scheme, _)| *scheme == url.scheme())
                    .map(|(_, port)| *port)
            })
            .ok_or_else(|| {
                StoreError::InvalidUrl(format!("no port for scheme '{}'", url.scheme()))
            })?;

        Ok(format!("{}:{}", host, port))
    }
}

#[async_trait]
impl Store for TcpStore {
    async fn connect(&self) -> Result<(), StoreError> {
        let addr = self.address()?;

        match tokio::time::timeout(self.timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => {
                info!(addr = %addr, "Database reachable");
                Ok(())
            }
            Ok(Err(e)) => Err(StoreError::Connection(e.to_string())),
            Err(_) => Err(StoreError::Timeout {
                addr,
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

/// Start the connection attempt without waiting for it.
///
/// A failure is logged and goes no further.
pub fn spawn_connect(store: Arc<dyn Store>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = store.connect().await {
            error!(error = %e, "Database connection failed; serving without storage");
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
