//! hashgossip-core: Epidemic message dissemination over UDP.
//!
//! This crate provides the protocol engine:
//! - Message and peer value types with SHA-1 integrity digests
//! - Peer membership, digest dedup and current-message stores
//! - Prefix-tagged wire protocol and the datagram router
//! - The gossip fan-out worker
//!
//! Sockets, configuration and process lifecycle live in `hashgossip-daemon`;
//! the core only sees them through the [`Transport`] trait.

pub mod emitter;
pub mod gossip;
pub mod message;
pub mod node;
pub mod peer;
pub mod protocol;
pub mod storage;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use gossip::{Gossiper, GossipError, GOSSIP_QUEUE_CAPACITY};
pub use message::{Digest, Message};
pub use node::{Dispatch, Node};
pub use peer::Peer;
pub use protocol::{MessageKind, WelcomePack, PREFIX_LEN};
pub use storage::{HashStore, MessageSlot, PeerStore};
pub use transport::{Transport, TransportError, MAX_DATAGRAM_SIZE};
