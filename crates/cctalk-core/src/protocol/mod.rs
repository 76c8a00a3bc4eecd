//! ccTalk Protocol Communication
//!
//! Implements the ccTalk framing, both checksum modes and the blocking
//! request/reply host used to talk to peripherals on a shared serial line.
//!
//! Wire layout of every frame:
//! - 1 byte: destination address
//! - 1 byte: payload length N
//! - 1 byte: source address (CRC-16 low byte in [`ChecksumMode::Ccitt`])
//! - 1 byte: header (method on request, status on reply)
//! - N bytes: payload
//! - 1 byte: checksum (CRC-16 high byte in [`ChecksumMode::Ccitt`])

pub mod checksum;
pub mod commands;
mod error;
mod host;
mod packet;
pub mod serial;
mod stream;

pub use checksum::ChecksumMode;
pub use commands::{AcceptorError, Method};
pub use error::{ErrorKind, ProtocolError};
pub use host::{Host, TrafficCounters};
pub use packet::{Frame, WireHeader};
pub use serial::open_port;
pub use stream::{Channel, SerialChannel};

/// Default baud rate for ccTalk peripherals
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout in milliseconds for the wait on each next byte
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default address used by the host (ccTalk reserves 1 for the master)
pub const DEFAULT_HOST_ADDRESS: u8 = 1;

/// Number of header bytes preceding the payload
pub const HEADER_LEN: usize = 4;

/// Largest payload the length byte can describe
pub const MAX_PAYLOAD_LEN: usize = 255;
