//! hashgossip-daemon library: Exposes internal modules for testing.
//!
//! This is a thin library layer over the daemon components,
//! allowing integration tests to access internal types.

pub mod bootstrap;
pub mod config;
pub mod udp;

pub use config::Config;
pub use udp::{bind_multicast, bind_unicast, serve, UdpTransport};

/// Exit status of a node stopped by a SHUTDOWN datagram.
pub const SHUTDOWN_EXIT_CODE: i32 = 2;
