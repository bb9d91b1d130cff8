//! Dedup store: digests of every message already accepted as new.
//!
//! Append-only and never pruned. The router consults it to decide whether a
//! message has been forwarded before.

use crate::Digest;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct HashStore {
    seen: Mutex<HashSet<Digest>>,
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a digest.
    ///
    /// Returns true only the first time a given digest is added.
    pub fn add(&self, digest: &Digest) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        if seen.contains(digest) {
            return false;
        }
        seen.insert(digest.clone())
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(digest)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_add_wins() {
        let store = HashStore::new();
        let digest = Digest::of(b"one");

        assert!(store.add(&digest));
        assert!(!store.add(&digest));
        assert!(!store.add(&digest));
        assert!(store.contains(&digest));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_interleaved_digests() {
        let store = HashStore::new();
        let a = Digest::of(b"a");
        let b = Digest::of(b"b");

        assert!(store.add(&a));
        assert!(store.add(&b));
        assert!(!store.add(&a));
        assert!(!store.add(&b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unknown_digest() {
        let store = HashStore::new();
        assert!(store.is_empty());
        assert!(!store.contains(&Digest::of(b"never added")));
    }

    #[test]
    fn test_concurrent_add_has_single_winner() {
        let store = std::sync::Arc::new(HashStore::new());
        let digest = Digest::of(b"contended");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let digest = digest.clone();
                std::thread::spawn(move || store.add(&digest))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
