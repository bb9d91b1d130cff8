//! Configuration loading

use std::net::{SocketAddr, SocketAddrV4};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Daemon configuration, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Multicast group and port used for discovery, monitoring and shutdown
    #[serde(default = "default_multicast_address")]
    pub multicast_address: SocketAddr,

    /// The emitter sends a random number of messages below this limit
    #[serde(default = "default_limit_messages")]
    pub limit_messages: usize,

    /// Fraction of emitted messages that are deliberately invalid (0.0 to 1.0)
    #[serde(default = "default_invalid_frequency")]
    pub invalid_frequency: f64,
}

fn default_multicast_address() -> SocketAddr {
    SocketAddr::from(([239, 255, 42, 99], 9999))
}

fn default_limit_messages() -> usize {
    10
}

fn default_invalid_frequency() -> f64 {
    0.1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multicast_address: default_multicast_address(),
            limit_messages: default_limit_messages(),
            invalid_frequency: default_invalid_frequency(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate TOML configuration.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.multicast_group()?;
        if !(0.0..=1.0).contains(&config.invalid_frequency) {
            bail!(
                "invalid_frequency must be between 0 and 1, got {}",
                config.invalid_frequency
            );
        }
        Ok(config)
    }

    /// The multicast address as an IPv4 group.
    pub fn multicast_group(&self) -> Result<SocketAddrV4> {
        match self.multicast_address {
            SocketAddr::V4(addr) if addr.ip().is_multicast() => Ok(addr),
            other => bail!("multicast_address must be an IPv4 multicast address, got {}", other),
        }
    }
}
