//! UDP sockets for the daemon.
//!
//! - `UdpTransport`: outbound datagrams from a dedicated ephemeral socket
//! - `bind_unicast` / `bind_multicast`: the two listening sockets
//! - `serve`: the read loop shared by both listeners

use async_trait::async_trait;
use hashgossip_core::transport::{Result as TransportResult, TransportError};
use hashgossip_core::{Dispatch, Node, Transport, MAX_DATAGRAM_SIZE};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Sends datagrams from a single unconnected socket.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind the outbound socket on an ephemeral port.
    pub async fn bind() -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_raw(&self, addr: SocketAddr, payload: &[u8]) -> TransportResult<()> {
        self.socket
            .send_to(payload, addr)
            .await
            .map(|_| ())
            .map_err(|source| TransportError::SendFailed { addr, source })
    }
}

/// Bind the unicast listener.
pub async fn bind_unicast(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).await?;
    info!("Listening for unicast on {}", socket.local_addr()?);
    Ok(socket)
}

/// Join `group` on all interfaces and listen on its port.
///
/// The port is shared with other nodes on the same host, so the socket is
/// bound with address (and, on Unix, port) reuse.
pub fn bind_multicast(group: SocketAddrV4) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(MAX_DATAGRAM_SIZE)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, group.port())).into())?;
    socket.set_multicast_loop_v4(true)?;
    socket.join_multicast_v4(group.ip(), &Ipv4Addr::UNSPECIFIED)?;
    socket.set_nonblocking(true)?;

    let socket = UdpSocket::from_std(socket.into())?;
    info!("Joined multicast group {}", group);
    Ok(socket)
}

/// Read datagrams from `socket` and route each through `node`.
///
/// Each datagram is handled to completion before the next read. Read errors
/// are logged and the loop continues. Returns only when a shutdown command
/// arrives; the caller decides how to terminate.
pub async fn serve(socket: UdpSocket, node: &Node, label: &str) -> Dispatch {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("{} read failed: {}", label, e);
                continue;
            }
        };
        debug!("{} datagram of {} bytes from {}", label, len, src);

        if node.handle_datagram(src, &buf[..len]).await == Dispatch::Shutdown {
            return Dispatch::Shutdown;
        }
    }
}
