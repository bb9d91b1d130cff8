//! Message: a payload paired with its SHA-1 digest.
//!
//! The digest doubles as the integrity check and as the ordering key: the
//! node keeps whichever valid message has the lexicographically largest
//! digest, regardless of when it was created.

use serde::{Deserialize, Serialize};
use sha1::{Digest as _, Sha1};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// A content digest.
///
/// Held as a byte string rather than a fixed array: the empty message carries
/// a zero-length digest that orders below every real one, and digests decoded
/// from the wire are compared as-is before being verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Compute the SHA-1 digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hasher.finalize().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..self.0.len().min(5)])
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// A disseminated message.
///
/// Never trust a message received from the network without calling
/// [`Message::is_valid`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    payload: Vec<u8>,
    digest: Digest,
}

impl Message {
    /// Create a message, computing the digest over `payload`.
    pub fn new(payload: Vec<u8>) -> Self {
        let digest = Digest::of(&payload);
        Self { payload, digest }
    }

    /// Assemble a message from parts without hashing.
    pub fn from_parts(payload: Vec<u8>, digest: Digest) -> Self {
        Self { payload, digest }
    }

    /// The empty message the current-message slot starts with.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Recompute the digest over the payload and compare it to the stored one.
    pub fn is_valid(&self) -> bool {
        let valid = Digest::of(&self.payload) == self.digest;
        if !valid {
            debug!("Digest mismatch for message {}", self.digest.short());
        }
        valid
    }

    /// Order two messages by their digests.
    pub fn compare(&self, other: &Message) -> Ordering {
        self.digest.cmp(&other.digest)
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.digest.short(), self.payload.len())
    }
}
