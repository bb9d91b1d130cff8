//! Wire protocol.
//!
//! Every datagram is a fixed-width ASCII tag followed by a body:
//!
//! | Kind         | Tag     | Body                              |
//! |--------------|---------|-----------------------------------|
//! | `Message`    | `MESSG` | bincode [`Message`](crate::Message) |
//! | `Welcome`    | `WELCM` | bincode [`WelcomePack`]           |
//! | `Report`     | `REPRT` | bincode [`Message`](crate::Message) |
//! | `Monitoring` | `MONIT` | u16 little-endian reply port      |
//! | `Shutdown`   | `SHTDN` | none                              |
//! | `Hello`      | `HELLO` | u16 little-endian reply port      |

pub mod codec;
pub mod prefix;

pub use codec::{
    decode_message, decode_port, decode_welcome, encode_message, encode_port, encode_welcome,
    frame, CodecError, WelcomePack,
};
pub use prefix::{MessageKind, PREFIX_LEN};
