//! Node: shared state plus the datagram router.
//!
//! A `Node` is built once per process and shared (via `Arc`) by every read
//! loop. `handle_datagram` demultiplexes on the tag and runs the handler to
//! completion before returning, so a read loop that awaits it processes one
//! datagram at a time.
//!
//! Handler summary:
//! - `Message`: verify, offer to the slot, record the digest, and forward if
//!   the message both won the slot and was never seen before
//! - `Welcome`: merge the peer list, offer a non-empty valid message to the
//!   slot (never forwarded)
//! - `Report`: log only
//! - `Monitoring`: reply with the current message
//! - `Hello`: record the sender and reply with a `WelcomePack`
//! - `Shutdown`: reported to the caller, which terminates the process
//!
//! The slot and the dedup store are checked in separate critical sections.
//! When two read loops deliver the same message concurrently, one can win the
//! slot while the other wins the dedup check, in which case neither forwards
//! it. Forwarding is best-effort either way.

use crate::gossip::Gossiper;
use crate::protocol::{
    decode_message, decode_port, decode_welcome, encode_message, encode_welcome, frame,
    MessageKind, WelcomePack,
};
use crate::storage::{HashStore, MessageSlot, PeerStore};
use crate::transport::Transport;
use crate::Peer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the router did with a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Routed to a handler (which may still have dropped a malformed body)
    Handled,
    /// Too short or unknown tag; nothing was done
    Ignored,
    /// A shutdown command. The caller must terminate the process.
    Shutdown,
}

/// Process-wide protocol state.
pub struct Node {
    peers: Arc<PeerStore>,
    hashes: HashStore,
    slot: MessageSlot,
    gossiper: Gossiper,
    transport: Arc<dyn Transport>,
}

impl Node {
    /// Create a node with empty stores and start its gossip worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(transport: Arc<dyn Transport>) -> (Self, JoinHandle<()>) {
        let peers = Arc::new(PeerStore::new());
        let (gossiper, worker) = Gossiper::spawn(peers.clone(), transport.clone());
        (Self::with_parts(peers, gossiper, transport), worker)
    }

    /// Assemble a node around an existing peer store and gossiper.
    pub fn with_parts(
        peers: Arc<PeerStore>,
        gossiper: Gossiper,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            peers,
            hashes: HashStore::new(),
            slot: MessageSlot::new(),
            gossiper,
            transport,
        }
    }

    pub fn peers(&self) -> &PeerStore {
        &self.peers
    }

    pub fn hashes(&self) -> &HashStore {
        &self.hashes
    }

    pub fn slot(&self) -> &MessageSlot {
        &self.slot
    }

    pub fn gossiper(&self) -> &Gossiper {
        &self.gossiper
    }

    /// Route one inbound datagram from `src` to its handler.
    pub async fn handle_datagram(&self, src: SocketAddr, datagram: &[u8]) -> Dispatch {
        let Some((kind, body)) = MessageKind::split(datagram) else {
            debug!("Ignoring {} byte datagram from {}: unknown prefix", datagram.len(), src);
            return Dispatch::Ignored;
        };

        match kind {
            MessageKind::Message => self.on_message(src, body).await,
            MessageKind::Welcome => self.on_welcome(src, body),
            MessageKind::Report => self.on_report(src, body),
            MessageKind::Monitoring => self.on_monitoring(src, body).await,
            MessageKind::Shutdown => {
                warn!("Shutdown requested by {}", src);
                return Dispatch::Shutdown;
            }
            MessageKind::Hello => self.on_hello(src, body).await,
        }

        Dispatch::Handled
    }

    async fn on_message(&self, src: SocketAddr, body: &[u8]) {
        let msg = match decode_message(body) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Dropping message from {}: {}", src, e);
                return;
            }
        };
        debug!("Message {} from {}", msg, src);

        if !msg.is_valid() {
            warn!("Invalid message {} from {}", msg, src);
            return;
        }

        let stored = self.slot.set(msg.clone());
        let first_seen = self.hashes.add(msg.digest());
        if stored && first_seen {
            if let Err(e) = self.gossiper.send_message(&msg).await {
                warn!("Failed to queue message {} for gossip: {}", msg, e);
            }
        }
    }

    fn on_welcome(&self, src: SocketAddr, body: &[u8]) {
        let pack = match decode_welcome(body) {
            Ok(pack) => pack,
            Err(e) => {
                warn!("Dropping welcome from {}: {}", src, e);
                return;
            }
        };

        let added = self.peers.merge(&pack.peers);
        debug!(
            "Welcome from {} with {} peer(s), {} new",
            src,
            pack.peers.len(),
            added
        );

        if pack.message.is_empty() {
            return;
        }
        if pack.message.is_valid() {
            self.slot.set(pack.message);
        } else {
            warn!("Invalid message {} in welcome from {}", pack.message, src);
        }
    }

    fn on_report(&self, src: SocketAddr, body: &[u8]) {
        match decode_message(body) {
            Ok(msg) => info!(
                "Report from {}: message {} (digest {})",
                src,
                hex::encode(msg.payload()),
                msg.digest()
            ),
            Err(e) => warn!("Dropping report from {}: {}", src, e),
        }
    }

    async fn on_monitoring(&self, src: SocketAddr, body: &[u8]) {
        let Some(peer) = reply_peer(src, body, "monitoring") else {
            return;
        };

        let body = match encode_message(&self.slot.get()) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode report for {}: {}", peer, e);
                return;
            }
        };

        if let Err(e) = self
            .transport
            .send(peer.socket_addr(), &frame(MessageKind::Report, &body))
            .await
        {
            warn!("Failed to send report to {}: {}", peer, e);
        }
    }

    async fn on_hello(&self, src: SocketAddr, body: &[u8]) {
        let Some(peer) = reply_peer(src, body, "hello") else {
            return;
        };
        self.peers.add(peer);

        let pack = WelcomePack::new(self.peers.list(), self.slot.get());
        let body = match encode_welcome(&pack) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode welcome for {}: {}", peer, e);
                return;
            }
        };

        if let Err(e) = self
            .transport
            .send(peer.socket_addr(), &frame(MessageKind::Welcome, &body))
            .await
        {
            warn!("Failed to send welcome to {}: {}", peer, e);
        }
    }
}

/// The peer a request asks us to answer: the sender's IP with the port from the body.
fn reply_peer(src: SocketAddr, body: &[u8], what: &str) -> Option<Peer> {
    match decode_port(body) {
        Ok(port) => Some(Peer::new(src.ip(), port)),
        Err(e) => {
            warn!("Dropping {} from {}: {}", what, src, e);
            None
        }
    }
}
