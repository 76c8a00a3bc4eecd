//! Host configuration
//!
//! Settings a host needs before its first exchange. Stored as JSON; missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::protocol::{ChecksumMode, DEFAULT_BAUD_RATE, DEFAULT_HOST_ADDRESS, DEFAULT_TIMEOUT_MS};

/// Protocol settings of a ccTalk host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Address the host sends from
    pub address: u8,

    /// Checksum mode; must match every peer on the bus
    pub checksum_mode: ChecksumMode,

    /// Timeout applied to each individual read or write, in milliseconds
    pub timeout_ms: u64,

    /// Read back and compare our own transmission after every send.
    ///
    /// Needed on single-wire multidrop buses, where the host hears itself.
    /// Turn off for point-to-point links that do not echo.
    pub verify_echo: bool,

    /// Line speed used when opening a serial port
    pub baud_rate: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_HOST_ADDRESS,
            checksum_mode: ChecksumMode::Simple,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verify_echo: true,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl HostConfig {
    /// Per-call timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse a JSON document
    pub fn from_json(content: &str) -> io::Result<Self> {
        serde_json::from_str(content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}
