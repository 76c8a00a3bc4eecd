//! # ccTalk Core Library
//!
//! Host-side implementation of the ccTalk serial protocol.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Frame encoding/decoding with both ccTalk checksum modes
//! - A blocking, timeout-bounded host over a serial line (or any [`protocol::Channel`])
//! - Device scanning with capability detection
//! - Coin acceptance policy and credit polling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cctalk_core::{config::HostConfig, device::Device, protocol::Host};
//!
//! let host = Host::open("/dev/ttyUSB0", HostConfig::default())?;
//! let mut acceptor = Device::scan(&host, 2)?;
//!
//! acceptor.set_coin_mask(0x00ff);
//! acceptor.set_accept_coins(true)?;
//!
//! let credits = acceptor.query_credits()?;
//! println!("event counter: {}", credits.sequence);
//! ```

pub mod config;
pub mod device;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::HostConfig;
    pub use crate::device::{Capabilities, CoinEvent, CommsRevision, CreditInfo, Device};
    pub use crate::protocol::{
        AcceptorError, Channel, ChecksumMode, ErrorKind, Frame, Host, Method, ProtocolError,
        SerialChannel,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
