//! Membership view: every peer this node has heard of.
//!
//! Peers are only ever added. There is no leave, timeout or failure detection,
//! so the view grows monotonically for the lifetime of the process.

use crate::Peer;
use std::sync::RwLock;
use tracing::info;

/// Insertion-ordered set of known peers.
///
/// Thread-safe for use in multi-threaded Tokio runtime.
/// Wrap in `Arc` for shared ownership.
///
/// Membership checks are a linear scan, so a merge costs
/// O(existing × incoming). Fine for LAN-sized meshes; a large mesh would want
/// an index alongside the list.
#[derive(Default)]
pub struct PeerStore {
    peers: RwLock<Vec<Peer>>,
}

impl PeerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. No-op if it is already known.
    ///
    /// Returns true if the peer was new.
    pub fn add(&self, peer: Peer) -> bool {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        add_locked(&mut peers, peer)
    }

    /// Add every peer of `incoming` under a single lock.
    ///
    /// Returns how many peers were new.
    pub fn merge(&self, incoming: &[Peer]) -> usize {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        incoming
            .iter()
            .filter(|peer| add_locked(&mut peers, **peer))
            .count()
    }

    /// Snapshot of the current membership, in insertion order.
    pub fn list(&self) -> Vec<Peer> {
        self.peers.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, peer: &Peer) -> bool {
        self.peers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(peer)
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn add_locked(peers: &mut Vec<Peer>, peer: Peer) -> bool {
    if peers.contains(&peer) {
        return false;
    }
    peers.push(peer);
    info!("New peer {}", peer);
    true
}
