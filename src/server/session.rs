//! Per-connection relay session
//!
//! A session owns exactly one downstream (accepted) connection and one
//! upstream (dialed) connection, and nothing is shared with other sessions.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::split;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::copier::copy_until_close;
use crate::config::Config;
use crate::error::{RelayError, Result};

/// A relay session between one downstream and one upstream connection
pub struct Session {
    /// Accepted downstream stream
    downstream: TcpStream,
    /// Downstream peer address
    peer_addr: SocketAddr,
    /// Upstream dial target
    upstream_addr: SocketAddr,
    /// Session id for logging
    session_id: u64,
    /// Upstream connect timeout (0 = no timeout)
    connect_timeout: Duration,
    /// Idle read timeout per direction (0 = disabled)
    idle_timeout: Duration,
}

impl Session {
    /// Create a session for an accepted downstream connection
    pub fn new(
        downstream: TcpStream,
        peer_addr: SocketAddr,
        upstream_addr: SocketAddr,
        session_id: u64,
        config: &Config,
    ) -> Self {
        Self {
            downstream,
            peer_addr,
            upstream_addr,
            session_id,
            connect_timeout: Duration::from_secs(config.server.connect_timeout_secs),
            idle_timeout: Duration::from_secs(config.server.idle_timeout_secs),
        }
    }

    /// Dial the upstream and relay both directions until the pair is fully
    /// torn down.
    ///
    /// A failed dial drops the downstream connection and ends the session;
    /// there is no retry and no alternate target. After a successful dial,
    /// the session runs one copier per direction and ends when both have
    /// terminated. Each copier half-closes its destination on termination,
    /// which is what drags the other direction down with it, so this always
    /// converges once either side closes.
    pub async fn run(self) -> Result<()> {
        // On a failed dial the downstream stream drops with the session;
        // the caller owns the log line.
        let upstream = dial_upstream(self.upstream_addr, self.connect_timeout).await?;

        debug!(
            "Session {}: relaying {} <-> {}",
            self.session_id, self.peer_addr, self.upstream_addr
        );

        let (down_read, down_write) = split(self.downstream);
        let (up_read, up_write) = split(upstream);
        let idle_timeout = self.idle_timeout;

        let down_to_up = tokio::spawn(copy_until_close(
            down_read,
            up_write,
            "downstream->upstream",
            idle_timeout,
        ));
        let up_to_down = tokio::spawn(copy_until_close(
            up_read,
            down_write,
            "upstream->downstream",
            idle_timeout,
        ));

        // Both copiers must finish before the stream pair is dropped
        let (sent, received) = tokio::join!(down_to_up, up_to_down);
        let sent = sent.unwrap_or(0);
        let received = received.unwrap_or(0);

        info!(
            "Session {}: closed ({} bytes up, {} bytes down)",
            self.session_id, sent, received
        );

        Ok(())
    }
}

/// Dial the upstream target, optionally bounded by a connect timeout.
async fn dial_upstream(addr: SocketAddr, connect_timeout: Duration) -> Result<TcpStream> {
    let result = if connect_timeout.is_zero() {
        TcpStream::connect(addr).await
    } else {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(result) => result,
            Err(_) => {
                return Err(RelayError::UpstreamUnreachable(format!(
                    "connect to {} timed out after {:?}",
                    addr, connect_timeout
                )))
            }
        }
    };

    result.map_err(|e| {
        RelayError::UpstreamUnreachable(format!("connect to {} failed: {}", addr, e))
    })
}
