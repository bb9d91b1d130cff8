//! The current-message slot.
//!
//! Holds a single message: the valid one with the largest digest seen so far.
//! "Largest digest" is the replacement rule, not arrival time, so the slot
//! converges to the same message on every node that has seen the same set.

use crate::Message;
use std::cmp::Ordering;
use std::sync::Mutex;
use tracing::info;

#[derive(Default)]
pub struct MessageSlot {
    current: Mutex<Message>,
}

impl MessageSlot {
    /// Create a slot holding the empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current message if `message` has a strictly greater digest.
    ///
    /// Returns true if the slot was replaced. Callers are expected to have
    /// validated the message.
    pub fn set(&self, message: Message) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if current.compare(&message) == Ordering::Less {
            info!("New message was set {}", message);
            *current = message;
            return true;
        }
        false
    }

    /// The current message (the empty message before any successful `set`).
    pub fn get(&self) -> Message {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
