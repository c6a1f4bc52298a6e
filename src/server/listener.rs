//! TCP listener for incoming relay connections

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};

use super::session::Session;
use crate::config::Config;
use crate::error::{RelayError, Result};

/// Relay statistics
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Total connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active sessions
    pub connections_active: AtomicU64,
    /// Connections rejected due to the cap
    pub connections_rejected: AtomicU64,
}

/// TCP listener that accepts downstream connections and spawns one relay
/// session per connection
pub struct Relay {
    /// TCP listener
    listener: TcpListener,
    /// Upstream dial target (same port as the listener)
    upstream_addr: SocketAddr,
    /// Configuration
    config: Arc<Config>,
    /// Statistics
    stats: Arc<RelayStats>,
    /// Shutdown signal receiver
    shutdown_rx: broadcast::Receiver<()>,
    /// Session cap semaphore (None = unlimited)
    connection_semaphore: Option<Arc<Semaphore>>,
    /// Monotonic session id source
    session_counter: AtomicU64,
}

impl Relay {
    /// Bind the listener to (bind address, port).
    ///
    /// The upstream target is `upstream_addr` at the same port. A bind
    /// failure is fatal to startup; there is nothing useful to do without
    /// the listener.
    pub async fn bind(
        bind_addr: IpAddr,
        port: u16,
        upstream_addr: IpAddr,
        config: Arc<Config>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let addr = SocketAddr::new(bind_addr, port);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Bind(format!("cannot listen on {}: {}", addr, e)))?;

        // Create session cap semaphore (0 = unlimited)
        let connection_semaphore = if config.server.max_connections > 0 {
            info!(
                "Listening on {} (max {} connections)",
                addr, config.server.max_connections
            );
            Some(Arc::new(Semaphore::new(config.server.max_connections)))
        } else {
            info!("Listening on {} (unlimited connections)", addr);
            None
        };

        Ok(Self {
            listener,
            upstream_addr: SocketAddr::new(upstream_addr, port),
            config,
            stats: Arc::new(RelayStats::default()),
            shutdown_rx,
            connection_semaphore,
            session_counter: AtomicU64::new(1),
        })
    }

    /// Get relay statistics
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Get the local address the listener is bound to.
    ///
    /// This is useful when binding to port 0 to get an OS-assigned port.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the accept loop
    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                // Accept new connections
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            // Try to acquire a session permit if the cap is enabled
                            let permit = if let Some(ref semaphore) = self.connection_semaphore {
                                match semaphore.clone().try_acquire_owned() {
                                    Ok(permit) => Some(permit),
                                    Err(_) => {
                                        warn!(
                                            "Connection from {} rejected: max connections ({}) reached",
                                            addr,
                                            self.config.server.max_connections
                                        );
                                        self.stats.connections_rejected.fetch_add(1, Ordering::Relaxed);
                                        // Drop the stream immediately
                                        drop(stream);
                                        continue;
                                    }
                                }
                            } else {
                                None
                            };

                            debug!("Accepted connection from {}", addr);
                            self.stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
                            self.stats.connections_active.fetch_add(1, Ordering::Relaxed);

                            let session_id = self.session_counter.fetch_add(1, Ordering::Relaxed);
                            let session = Session::new(
                                stream,
                                addr,
                                self.upstream_addr,
                                session_id,
                                &self.config,
                            );
                            let stats = Arc::clone(&self.stats);

                            // The accept loop never waits on a session
                            tokio::spawn(async move {
                                // Hold permit for session lifetime (drops when the session ends)
                                let _permit = permit;

                                if let Err(e) = session.run().await {
                                    warn!("Session {} from {} error: {}", session_id, addr, e);
                                }
                                stats.connections_active.fetch_sub(1, Ordering::Relaxed);
                                debug!("Connection from {} closed", addr);
                            });
                        }
                        Err(e) if is_transient_accept_error(&e) => {
                            warn!("Accept error: {}", e);
                            // Brief delay before retrying
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                        Err(e) => {
                            error!("Listener failed: {}", e);
                            return Err(RelayError::Io(e));
                        }
                    }
                }

                // Shutdown signal
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        info!(
            "Listener stopped. Total: {}, Active: {}, Rejected: {}",
            self.stats.connections_accepted.load(Ordering::Relaxed),
            self.stats.connections_active.load(Ordering::Relaxed),
            self.stats.connections_rejected.load(Ordering::Relaxed)
        );

        Ok(())
    }
}

/// A handshake that dies before `accept()` returns is the peer's problem,
/// not the listener's; anything else means the listening socket itself is
/// unusable.
fn is_transient_accept_error(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::Interrupted
    )
}
