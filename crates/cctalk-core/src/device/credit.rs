//! Buffered credit polling
//!
//! A coin acceptor keeps its last five credit/error events together with an
//! event counter. The counter is 0 only after power-up or reset and wraps from
//! 255 to 1, so the number of new events between two polls is recoverable as
//! long as fewer than 255 happened.

use serde::{Deserialize, Serialize};

use crate::protocol::{AcceptorError, Method, ProtocolError};

/// Number of events a device buffers
pub const EVENT_SLOTS: usize = 5;

/// Payload length of a buffered credit reply: counter plus two bytes per event
pub const CREDIT_REPLY_LEN: usize = 1 + 2 * EVENT_SLOTS;

/// One buffered event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinEvent {
    /// Coin position that was credited, 0 for an error event
    pub coin_value: u8,
    /// Sorter path taken, 0 if the device has no sorter
    pub sorter_path: u8,
    /// Acceptor error; meaningful only when `coin_value` is 0
    pub acceptor_error: AcceptorError,
}

impl CoinEvent {
    /// Decode the (result A, result B) pair of one event
    pub fn from_pair(a: u8, b: u8) -> Self {
        if a == 0 {
            Self {
                coin_value: 0,
                sorter_path: 0,
                acceptor_error: AcceptorError::from(b),
            }
        } else {
            Self {
                coin_value: a,
                sorter_path: b,
                acceptor_error: AcceptorError::NullEvent,
            }
        }
    }

    /// True when a coin was accepted
    pub fn is_credit(&self) -> bool {
        self.coin_value != 0
    }
}

/// Snapshot returned by a buffered credit poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInfo {
    /// Event counter
    pub sequence: u8,
    /// Last five events, in the order the device reports them
    pub events: [CoinEvent; EVENT_SLOTS],
}

impl CreditInfo {
    /// Parse the reply payload of "read buffered credit or error codes"
    ///
    /// Each event slot carries two wire bytes (A, B) that decode into three fields:
    /// `coin_value` and `sorter_path` for a credit, or `acceptor_error` when A is zero.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() != CREDIT_REPLY_LEN {
            return Err(ProtocolError::MalformedReply {
                method: Method::ReadBufferedCredit.code(),
                expected: CREDIT_REPLY_LEN,
                actual: payload.len(),
            });
        }

        let mut events = [CoinEvent::from_pair(0, 0); EVENT_SLOTS];
        for (event, pair) in events.iter_mut().zip(payload[1..].chunks_exact(2)) {
            *event = CoinEvent::from_pair(pair[0], pair[1]);
        }

        Ok(Self {
            sequence: payload[0],
            events,
        })
    }

    /// Events recorded since a poll that saw `previous`.
    ///
    /// Returns 0 when the device was reset in between (counter back at 0).
    /// Values above [`EVENT_SLOTS`] mean events were lost.
    pub fn new_events_since(&self, previous: u8) -> usize {
        match (previous, self.sequence) {
            (_, 0) => 0,
            (0, current) => current as usize,
            (previous, current) if current >= previous => (current - previous) as usize,
            (previous, current) => current as usize + 255 - previous as usize,
        }
    }
}

/// Counter value following `seq`: 255 wraps to 1, never back to 0
pub fn next_sequence(seq: u8) -> u8 {
    if seq == u8::MAX {
        1
    } else {
        seq + 1
    }
}
