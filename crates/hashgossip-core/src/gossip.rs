//! Gossip fan-out.
//!
//! `Gossiper` handles enqueue serialized messages on a bounded queue; a single
//! worker task drains it and floods each message to every known peer. The
//! queue is the only asynchronous boundary between the datagram handlers and
//! the network: when it is full, `send_message` waits for room.

use crate::protocol::{encode_message, frame, CodecError, MessageKind};
use crate::storage::PeerStore;
use crate::transport::Transport;
use crate::Message;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Serialized messages that may wait for the worker before senders block.
pub const GOSSIP_QUEUE_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub enum GossipError {
    #[error("Failed to encode message: {0}")]
    Encode(#[from] CodecError),

    #[error("Gossip worker has stopped")]
    Closed,
}

/// Handle for queueing messages for dissemination.
///
/// Cheap to clone. The worker stops once every handle is dropped and the
/// queue has drained.
#[derive(Clone)]
pub struct Gossiper {
    queue: mpsc::Sender<Vec<u8>>,
}

impl Gossiper {
    /// Start the fan-out worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(peers: Arc<PeerStore>, transport: Arc<dyn Transport>) -> (Self, JoinHandle<()>) {
        let (queue, rx) = mpsc::channel(GOSSIP_QUEUE_CAPACITY);
        let worker = tokio::spawn(fan_out_loop(rx, peers, transport));
        (Self { queue }, worker)
    }

    /// Serialize `message` and queue it for every peer.
    ///
    /// Encoding failures are returned without queueing anything. Waits while
    /// the queue is full.
    pub async fn send_message(&self, message: &Message) -> Result<(), GossipError> {
        let body = encode_message(message)?;
        self.queue.send(body).await.map_err(|_| GossipError::Closed)
    }
}

async fn fan_out_loop(
    mut rx: mpsc::Receiver<Vec<u8>>,
    peers: Arc<PeerStore>,
    transport: Arc<dyn Transport>,
) {
    while let Some(body) = rx.recv().await {
        let datagram = frame(MessageKind::Message, &body);
        let targets = peers.list();
        debug!("Gossiping {} bytes to {} peer(s)", datagram.len(), targets.len());

        for peer in targets {
            if let Err(e) = transport.send(peer.socket_addr(), &datagram).await {
                warn!("Failed to gossip to {}: {}", peer, e);
            }
        }
    }
    debug!("Gossip queue closed, worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_message, PREFIX_LEN};
    use crate::test_support::RecordingTransport;
    use crate::Peer;
    use std::time::Duration;

    fn peer(port: u16) -> Peer {
        Peer::new("127.0.0.1".parse().unwrap(), port)
    }

    /// Drop the handle and wait for the worker to drain the queue.
    async fn drain(gossiper: Gossiper, worker: JoinHandle<()>) {
        drop(gossiper);
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .expect("worker did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_fans_out_to_every_peer() {
        let peers = Arc::new(PeerStore::new());
        peers.merge(&[peer(4001), peer(4002), peer(4003)]);
        let transport = Arc::new(RecordingTransport::new());
        let (gossiper, worker) = Gossiper::spawn(peers, transport.clone());

        let msg = Message::new(b"flood me".to_vec());
        gossiper.send_message(&msg).await.unwrap();
        drain(gossiper, worker).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        for (i, (addr, datagram)) in sent.iter().enumerate() {
            assert_eq!(*addr, peer(4001 + i as u16).socket_addr());
            assert_eq!(&datagram[..PREFIX_LEN], MessageKind::Message.tag());
            assert_eq!(decode_message(&datagram[PREFIX_LEN..]).unwrap(), msg);
        }
    }

    #[tokio::test]
    async fn test_failed_peer_does_not_block_others() {
        let peers = Arc::new(PeerStore::new());
        peers.merge(&[peer(5001), peer(5002), peer(5003)]);
        let transport = Arc::new(RecordingTransport::new());
        transport.fail_for(peer(5002).socket_addr());
        let (gossiper, worker) = Gossiper::spawn(peers, transport.clone());

        gossiper
            .send_message(&Message::new(b"best effort".to_vec()))
            .await
            .unwrap();
        drain(gossiper, worker).await;

        assert_eq!(transport.sent_to(peer(5001).socket_addr()).len(), 1);
        assert!(transport.sent_to(peer(5002).socket_addr()).is_empty());
        assert_eq!(transport.sent_to(peer(5003).socket_addr()).len(), 1);
    }

    #[tokio::test]
    async fn test_messages_sent_in_queue_order() {
        let peers = Arc::new(PeerStore::new());
        peers.add(peer(6001));
        let transport = Arc::new(RecordingTransport::new());
        let (gossiper, worker) = Gossiper::spawn(peers, transport.clone());

        let first = Message::new(b"first".to_vec());
        let second = Message::new(b"second".to_vec());
        gossiper.send_message(&first).await.unwrap();
        gossiper.send_message(&second).await.unwrap();
        drain(gossiper, worker).await;

        let bodies: Vec<Message> = transport
            .sent()
            .iter()
            .map(|(_, d)| decode_message(&d[PREFIX_LEN..]).unwrap())
            .collect();
        assert_eq!(bodies, vec![first, second]);
    }

    #[tokio::test]
    async fn test_peer_list_read_per_message() {
        let peers = Arc::new(PeerStore::new());
        peers.add(peer(7001));
        let transport = Arc::new(RecordingTransport::new());
        let (gossiper, worker) = Gossiper::spawn(peers.clone(), transport.clone());

        let first = Message::new(b"before join".to_vec());
        gossiper.send_message(&first).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while transport.sent().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first message was not sent");

        peers.add(peer(7002));
        let second = Message::new(b"after join".to_vec());
        gossiper.send_message(&second).await.unwrap();
        drain(gossiper, worker).await;

        assert_eq!(transport.sent_to(peer(7001).socket_addr()).len(), 2);
        let late: Vec<Message> = transport
            .sent_to(peer(7002).socket_addr())
            .iter()
            .map(|d| decode_message(&d[PREFIX_LEN..]).unwrap())
            .collect();
        assert_eq!(late, vec![second]);
    }

    #[tokio::test]
    async fn test_no_peers_sends_nothing() {
        let transport = Arc::new(RecordingTransport::new());
        let (gossiper, worker) = Gossiper::spawn(Arc::new(PeerStore::new()), transport.clone());

        gossiper
            .send_message(&Message::new(b"nobody home".to_vec()))
            .await
            .unwrap();
        drain(gossiper, worker).await;

        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_blocks_sender() {
        // No worker: the receiver is held but never drained
        let (queue, _rx) = mpsc::channel(GOSSIP_QUEUE_CAPACITY);
        let gossiper = Gossiper { queue };
        let msg = Message::new(b"backpressure".to_vec());

        for _ in 0..GOSSIP_QUEUE_CAPACITY {
            gossiper.send_message(&msg).await.unwrap();
        }

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), gossiper.send_message(&msg)).await;
        assert!(blocked.is_err(), "send should wait while the queue is full");
    }

    #[tokio::test]
    async fn test_send_after_worker_gone() {
        let (queue, rx) = mpsc::channel(GOSSIP_QUEUE_CAPACITY);
        drop(rx);
        let gossiper = Gossiper { queue };

        let err = gossiper
            .send_message(&Message::new(b"late".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, GossipError::Closed));
    }
}
