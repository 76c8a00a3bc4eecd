//! Protocol errors

use thiserror::Error;

/// Coarse classification of a [`ProtocolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open/read/write/timeout failure on the byte channel
    Transport,
    /// Checksum mismatch on a received frame
    Integrity,
    /// Reply (or request) did not have the expected shape
    Protocol,
    /// Valid reply carrying a nonzero status byte
    DeviceStatus,
}

/// Errors that can occur during protocol communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Timed out waiting for the serial line")]
    Timeout,

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Echo of the sent frame did not match")]
    EchoMismatch,

    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("Malformed reply to method {method}: expected {expected} payload bytes, got {actual}")]
    MalformedReply {
        method: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),

    #[error("Frame has no source address to encode")]
    UnknownSource,

    #[error("Device returned status {0}")]
    DeviceStatus(u8),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Which part of the stack the error originates from
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::SerialError(_)
            | ProtocolError::Timeout
            | ProtocolError::PortNotFound(_)
            | ProtocolError::EchoMismatch
            | ProtocolError::IoError(_) => ErrorKind::Transport,
            ProtocolError::ChecksumMismatch { .. } => ErrorKind::Integrity,
            ProtocolError::MalformedReply { .. }
            | ProtocolError::Truncated { .. }
            | ProtocolError::PayloadTooLarge(_)
            | ProtocolError::UnknownSource => ErrorKind::Protocol,
            ProtocolError::DeviceStatus(_) => ErrorKind::DeviceStatus,
        }
    }
}
