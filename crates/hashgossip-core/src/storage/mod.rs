//! Shared node state.
//!
//! Each store guards its own structure with its own lock. There is no
//! transaction spanning stores: callers that check one store and then update
//! another do so in separate critical sections.

pub mod hashes;
pub mod peers;
pub mod slot;

pub use hashes::HashStore;
pub use peers::PeerStore;
pub use slot::MessageSlot;
