//! Joining the mesh.
//!
//! A node announces itself on the multicast group with HELLO until its peer
//! store is non-empty. The same group carries the operator commands sent by
//! the `--killer` and `--watcher` modes.

use anyhow::{Context, Result};
use hashgossip_core::protocol::{encode_port, frame};
use hashgossip_core::{MessageKind, Node, Transport};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// Pause between HELLO announcements.
pub const HELLO_INTERVAL: Duration = Duration::from_secs(1);

/// Address used to pick the outbound interface. Nothing is sent to it.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// The local IPv4 address the host would use to reach the internet.
///
/// Connecting a UDP socket only consults the routing table, so no packet
/// leaves the host.
pub async fn outbound_ip() -> Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .context("Failed to bind route probe socket")?;
    socket
        .connect(ROUTE_PROBE)
        .await
        .context("Failed to determine outbound IP")?;
    Ok(socket.local_addr()?.ip())
}

/// HELLO datagram advertising `port` as our reply port.
pub fn hello(port: u16) -> Vec<u8> {
    frame(MessageKind::Hello, &encode_port(port))
}

/// MONITORING datagram asking for a REPORT on `port`.
pub fn monitoring(port: u16) -> Vec<u8> {
    frame(MessageKind::Monitoring, &encode_port(port))
}

/// Bare SHUTDOWN datagram.
pub fn shutdown() -> Vec<u8> {
    frame(MessageKind::Shutdown, &[])
}

/// Announce ourselves on `group` until at least one peer is known.
///
/// Returns the number of HELLOs sent.
pub async fn announce_until_known(
    node: &Node,
    transport: &dyn Transport,
    group: SocketAddr,
    port: u16,
    interval: Duration,
) -> Result<usize> {
    let datagram = hello(port);
    let mut sent = 0;

    loop {
        transport
            .send(group, &datagram)
            .await
            .with_context(|| format!("Failed to send HELLO to {}", group))?;
        sent += 1;
        debug!("Sent HELLO #{} to {}", sent, group);

        tokio::time::sleep(interval).await;
        if !node.peers().is_empty() {
            info!("Joined mesh with {} known peer(s)", node.peers().len());
            return Ok(sent);
        }
    }
}
