//! Random message source.
//!
//! Drives the mesh in demos and soak runs: every few seconds it creates a
//! message with a random payload and hands it to the gossiper. A configurable
//! fraction of messages is deliberately corrupted after hashing so receivers
//! exercise their integrity checks.
//!
//! Emitted messages are not written to the local slot. The node is a member of
//! its own peer list, so it receives its own gossip like any other peer.

use crate::gossip::Gossiper;
use crate::Message;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Payload size of emitted messages.
pub const PAYLOAD_LEN: usize = 32;

/// Upper bound (exclusive) of the pause before each emission, in seconds.
pub const MAX_PAUSE_SECS: u64 = 10;

/// Build a valid message with a random payload of `len` bytes.
pub fn random_message(len: usize) -> Message {
    let mut payload = vec![0u8; len];
    rand::rng().fill(&mut payload[..]);
    Message::new(payload)
}

/// Flip the first payload byte while keeping the digest, making the message invalid.
///
/// Empty messages are returned unchanged.
pub fn corrupt(message: Message) -> Message {
    let mut payload = message.payload().to_vec();
    if let Some(first) = payload.first_mut() {
        *first ^= 0xff;
    }
    Message::from_parts(payload, message.digest().clone())
}

/// Pick the next message, corrupting it with probability `invalid_frequency`.
fn next_message(invalid_frequency: f64) -> Message {
    let probability = if invalid_frequency.is_nan() {
        0.0
    } else {
        invalid_frequency.clamp(0.0, 1.0)
    };
    let message = random_message(PAYLOAD_LEN);
    if rand::rng().random_bool(probability) {
        debug!("Corrupting message {}", message);
        corrupt(message)
    } else {
        message
    }
}

/// Emit `count` messages, pausing a random whole number of seconds before each.
pub async fn run(gossiper: Gossiper, count: usize, invalid_frequency: f64) {
    run_with_pause(gossiper, count, invalid_frequency, |secs| {
        Duration::from_secs(secs)
    })
    .await
}

async fn run_with_pause(
    gossiper: Gossiper,
    count: usize,
    invalid_frequency: f64,
    pause: impl Fn(u64) -> Duration,
) {
    info!("Emitting {} message(s)", count);

    for _ in 0..count {
        let secs = rand::rng().random_range(0..MAX_PAUSE_SECS);
        tokio::time::sleep(pause(secs)).await;

        let message = next_message(invalid_frequency);
        debug!("Emitting message {}", message);
        if let Err(e) = gossiper.send_message(&message).await {
            warn!("Failed to emit message {}: {}", message, e);
        }
    }

    info!("Emitter finished");
}
