//! Body encoding.
//!
//! Structured bodies (`Message`, `WelcomePack`) are bincode. Port bodies are a
//! bare little-endian u16 so a HELLO fits in seven bytes.

use super::prefix::{MessageKind, PREFIX_LEN};
use crate::{Message, Peer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid port body: expected 2 bytes, got {0}")]
    InvalidPort(usize),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Bootstrap snapshot sent in reply to a HELLO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomePack {
    /// Every peer the sender knows, including the newcomer
    pub peers: Vec<Peer>,
    /// The sender's current message (may be empty)
    pub message: Message,
}

impl WelcomePack {
    pub fn new(peers: Vec<Peer>, message: Message) -> Self {
        Self { peers, message }
    }
}

/// Prepend the tag for `kind` to `body`.
pub fn frame(kind: MessageKind, body: &[u8]) -> Vec<u8> {
    let mut datagram = Vec::with_capacity(PREFIX_LEN + body.len());
    datagram.extend_from_slice(kind.tag());
    datagram.extend_from_slice(body);
    datagram
}

pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    bincode::serialize(message).map_err(|e| CodecError::Serialization(e.to_string()))
}

pub fn decode_message(body: &[u8]) -> Result<Message> {
    bincode::deserialize(body).map_err(|e| CodecError::Deserialization(e.to_string()))
}

pub fn encode_welcome(pack: &WelcomePack) -> Result<Vec<u8>> {
    bincode::serialize(pack).map_err(|e| CodecError::Serialization(e.to_string()))
}

pub fn decode_welcome(body: &[u8]) -> Result<WelcomePack> {
    bincode::deserialize(body).map_err(|e| CodecError::Deserialization(e.to_string()))
}

pub fn encode_port(port: u16) -> [u8; 2] {
    port.to_le_bytes()
}

pub fn decode_port(body: &[u8]) -> Result<u16> {
    let bytes: [u8; 2] = body
        .try_into()
        .map_err(|_| CodecError::InvalidPort(body.len()))?;
    Ok(u16::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_prepends_tag() {
        let datagram = frame(MessageKind::Report, &[1, 2, 3]);
        assert_eq!(&datagram[..PREFIX_LEN], b"REPRT");
        assert_eq!(&datagram[PREFIX_LEN..], &[1, 2, 3]);
    }

    #[test]
    fn test_message_body_roundtrip() {
        let msg = Message::new(vec![9; 32]);
        let body = encode_message(&msg).unwrap();
        let decoded = decode_message(&body).unwrap();
        assert_eq!(decoded, msg);
        assert!(decoded.is_valid());
    }

    #[test]
    fn test_welcome_carries_peers_and_message() {
        let peers = vec![
            Peer::new("10.0.0.1".parse().unwrap(), 4000),
            Peer::new("::1".parse().unwrap(), 4001),
        ];
        let pack = WelcomePack::new(peers.clone(), Message::empty());

        let decoded = decode_welcome(&encode_welcome(&pack).unwrap()).unwrap();

        assert_eq!(decoded.peers, peers);
        assert!(decoded.message.is_empty());
    }

    #[test]
    fn test_garbage_body_is_rejected() {
        assert!(matches!(
            decode_message(&[0xff, 0xff, 0xff]),
            Err(CodecError::Deserialization(_))
        ));
        assert!(decode_welcome(b"").is_err());
    }

    #[test]
    fn test_port_is_little_endian() {
        assert_eq!(encode_port(0x1027), [0x27, 0x10]);
        assert_eq!(decode_port(&[0x27, 0x10]).unwrap(), 0x1027);
    }

    #[test]
    fn test_port_body_must_be_two_bytes() {
        assert!(matches!(decode_port(&[1]), Err(CodecError::InvalidPort(1))));
        assert!(matches!(decode_port(&[1, 2, 3]), Err(CodecError::InvalidPort(3))));
        assert!(matches!(decode_port(&[]), Err(CodecError::InvalidPort(0))));
    }

    #[test]
    fn test_typical_message_fits_a_datagram() {
        let msg = Message::new(vec![0; 32]);
        let datagram = frame(MessageKind::Message, &encode_message(&msg).unwrap());
        assert!(datagram.len() < crate::MAX_DATAGRAM_SIZE);
    }
}
