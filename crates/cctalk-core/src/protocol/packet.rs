//! Frame encoding/decoding
//!
//! A [`Frame`] is the logical message: who it is for, who sent it, the
//! method/status byte and the payload. [`WireHeader`] is the four bytes that
//! actually precede the payload on the line. The two differ in CCITT mode,
//! where the source position carries half of the CRC.

use super::{ChecksumMode, ProtocolError, HEADER_LEN, MAX_PAYLOAD_LEN};

/// The four header bytes exactly as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    /// Destination address
    pub destination: u8,
    /// Payload length
    pub length: u8,
    /// Source address, or the CRC-16 low byte in CCITT mode
    pub source_or_crc: u8,
    /// Method code (request) or status code (reply)
    pub header: u8,
}

impl WireHeader {
    /// Serialize in wire order
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        [self.destination, self.length, self.source_or_crc, self.header]
    }

    /// Parse from wire order
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            destination: bytes[0],
            length: bytes[1],
            source_or_crc: bytes[2],
            header: bytes[3],
        }
    }
}

/// A validated ccTalk message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    destination: u8,
    source: Option<u8>,
    header: u8,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame, rejecting payloads the length byte cannot describe
    pub fn new(
        destination: u8,
        source: u8,
        header: u8,
        payload: Vec<u8>,
    ) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            destination,
            source: Some(source),
            header,
            payload,
        })
    }

    /// Destination address
    pub fn destination(&self) -> u8 {
        self.destination
    }

    /// Sender address.
    ///
    /// `None` for frames received in CCITT mode, where the source position on
    /// the wire holds CRC bits instead of an address.
    pub fn source(&self) -> Option<u8> {
        self.source
    }

    /// Method code of a request or status code of a reply
    pub fn header(&self) -> u8 {
        self.header
    }

    /// Reply status, 0 meaning success
    pub fn status(&self) -> u8 {
        self.header
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the frame and return its payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Payload length as carried in the length byte
    pub fn length(&self) -> u8 {
        // Bounded by MAX_PAYLOAD_LEN in every constructor
        self.payload.len() as u8
    }

    /// Get the total encoded size
    pub fn encoded_size(&self) -> usize {
        HEADER_LEN + self.payload.len() + 1
    }

    /// Header, payload and checksum as three separate wire segments
    pub(crate) fn seal(&self, mode: ChecksumMode) -> Result<(WireHeader, u8), ProtocolError> {
        let source = match (mode, self.source) {
            (_, Some(source)) => source,
            // Never transmitted: the CRC low byte takes its place
            (ChecksumMode::Ccitt, None) => 0,
            (ChecksumMode::Simple, None) => return Err(ProtocolError::UnknownSource),
        };
        let logical = WireHeader {
            destination: self.destination,
            length: self.length(),
            source_or_crc: source,
            header: self.header,
        };
        Ok(mode.seal(logical, &self.payload))
    }

    /// Encode the frame to raw bytes
    pub fn to_bytes(&self, mode: ChecksumMode) -> Result<Vec<u8>, ProtocolError> {
        let (wire, trailer) = self.seal(mode)?;
        let mut bytes = Vec::with_capacity(self.encoded_size());
        bytes.extend_from_slice(&wire.to_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes.push(trailer);
        Ok(bytes)
    }

    /// Validate the pieces of a received frame and assemble it
    pub fn decode(
        header: WireHeader,
        payload: Vec<u8>,
        trailer: u8,
        mode: ChecksumMode,
    ) -> Result<Self, ProtocolError> {
        if payload.len() != header.length as usize {
            return Err(ProtocolError::Truncated {
                expected: header.length as usize,
                actual: payload.len(),
            });
        }

        mode.verify(&header, &payload, trailer)?;

        let source = match mode {
            ChecksumMode::Simple => Some(header.source_or_crc),
            ChecksumMode::Ccitt => None,
        };

        Ok(Self {
            destination: header.destination,
            source,
            header: header.header,
            payload,
        })
    }

    /// Decode a frame from the start of `data`; trailing bytes are ignored
    pub fn from_bytes(data: &[u8], mode: ChecksumMode) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_LEN + 1 {
            return Err(ProtocolError::Truncated {
                expected: HEADER_LEN + 1,
                actual: data.len(),
            });
        }

        let header = WireHeader::from_bytes([data[0], data[1], data[2], data[3]]);
        let end = HEADER_LEN + header.length as usize;
        if data.len() < end + 1 {
            return Err(ProtocolError::Truncated {
                expected: end + 1,
                actual: data.len(),
            });
        }

        Frame::decode(header, data[HEADER_LEN..end].to_vec(), data[end], mode)
    }
}
