//! Test doubles shared by the unit tests.

use crate::transport::{Result, Transport, TransportError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Mutex;

/// Transport that records every datagram instead of sending it.
///
/// Addresses registered with [`RecordingTransport::fail_for`] return an I/O
/// error and are not recorded.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
    failing: Mutex<HashSet<SocketAddr>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, addr: SocketAddr) {
        self.failing.lock().unwrap().insert(addr);
    }

    pub fn sent(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, addr: SocketAddr) -> Vec<Vec<u8>> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| *to == addr)
            .map(|(_, payload)| payload)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_raw(&self, addr: SocketAddr, payload: &[u8]) -> Result<()> {
        if self.failing.lock().unwrap().contains(&addr) {
            return Err(TransportError::SendFailed {
                addr,
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        self.sent.lock().unwrap().push((addr, payload.to_vec()));
        Ok(())
    }
}
