//! Transport trait for sending datagrams.
//!
//! Implementations:
//! - UDP: `hashgossip-daemon::udp::UdpTransport`
//! - In-memory recorder for tests

use async_trait::async_trait;
use std::net::SocketAddr;
use thiserror::Error;

/// Largest datagram the protocol sends or reads, prefix included.
pub const MAX_DATAGRAM_SIZE: usize = 8192;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Payload too large: {size} bytes exceeds maximum of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Send to {addr} failed: {source}")]
    SendFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Outbound half of the datagram layer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Put one datagram on the wire. No size check.
    async fn send_raw(&self, addr: SocketAddr, payload: &[u8]) -> Result<()>;

    /// Send one datagram, rejecting oversized payloads before any I/O.
    async fn send(&self, addr: SocketAddr, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        self.send_raw(addr, payload).await
    }
}
