//! Frame checksums
//!
//! ccTalk defines two mutually incompatible integrity checks:
//!
//! - **Simple**: one trailing byte chosen so that every byte of the frame,
//!   checksum included, sums to zero modulo 256.
//! - **CRC-16/CCITT** (poly `0x1021`, init `0x0000`, no reflection): computed
//!   over destination, length, header and payload. The low byte of the CRC
//!   replaces the source address on the wire and the high byte is the
//!   trailing checksum.
//!
//! Because the CRC occupies the source position, the sender's address is not
//! transmitted at all in CCITT mode. Decoded frames report no source then.

use crc::{Crc, CRC_16_XMODEM};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::packet::WireHeader;
use super::ProtocolError;

const CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Checksum algorithm shared by the host and its peers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMode {
    /// 8-bit two's-complement sum
    #[default]
    Simple,
    /// CRC-16/CCITT split across the source field and the trailing byte
    Ccitt,
}

impl fmt::Display for ChecksumMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumMode::Simple => f.write_str("simple"),
            ChecksumMode::Ccitt => f.write_str("ccitt"),
        }
    }
}

impl FromStr for ChecksumMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" | "8" | "8bit" => Ok(ChecksumMode::Simple),
            "ccitt" | "crc16" | "16" | "16bit" => Ok(ChecksumMode::Ccitt),
            other => Err(format!("unknown checksum mode '{}'", other)),
        }
    }
}

impl ChecksumMode {
    /// Compute the bytes that protect a frame.
    ///
    /// `header.source_or_crc` must hold the logical source address. Returns the
    /// header as it goes on the wire together with the trailing checksum byte.
    pub fn seal(self, header: WireHeader, payload: &[u8]) -> (WireHeader, u8) {
        match self {
            ChecksumMode::Simple => (header, simple(&header, payload)),
            ChecksumMode::Ccitt => {
                let [low, high] = crc16(&header, payload).to_le_bytes();
                let wire = WireHeader {
                    source_or_crc: low,
                    ..header
                };
                (wire, high)
            }
        }
    }

    /// Check a received frame against its trailing checksum byte
    pub fn verify(
        self,
        header: &WireHeader,
        payload: &[u8],
        trailer: u8,
    ) -> Result<(), ProtocolError> {
        match self {
            ChecksumMode::Simple => {
                let expected = simple(header, payload);
                if expected != trailer {
                    return Err(ProtocolError::ChecksumMismatch {
                        expected: expected as u16,
                        actual: trailer as u16,
                    });
                }
            }
            ChecksumMode::Ccitt => {
                let expected = crc16(header, payload);
                let actual = u16::from_le_bytes([header.source_or_crc, trailer]);
                if expected != actual {
                    return Err(ProtocolError::ChecksumMismatch { expected, actual });
                }
            }
        }
        Ok(())
    }
}

/// Simple checksum: the byte that makes header + payload + checksum sum to zero
pub fn simple(header: &WireHeader, payload: &[u8]) -> u8 {
    let sum = header
        .to_bytes()
        .iter()
        .chain(payload)
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    sum.wrapping_neg()
}

/// CRC-16/CCITT over destination, length, header and payload (source skipped)
pub fn crc16(header: &WireHeader, payload: &[u8]) -> u16 {
    let mut digest = CCITT.digest();
    digest.update(&[header.destination, header.length, header.header]);
    digest.update(payload);
    digest.finalize()
}
