//! Simulated ccTalk bus for integration tests

#![allow(dead_code)]

use cctalk_core::device::next_sequence;
use cctalk_core::protocol::{Channel, ChecksumMode, Frame, ProtocolError, HEADER_LEN};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// NAK status used by refusing peers
pub const NAK: u8 = 5;

/// Scriptable coin acceptor living on the simulated bus
#[derive(Debug, Clone)]
pub struct CoinAcceptor {
    pub address: u8,
    /// Payload of the comms revision reply
    pub revision: Vec<u8>,
    pub master_inhibit: bool,
    pub inhibit_status: bool,
    /// Method codes answered with NAK (or silence) regardless of features
    pub refuse: Vec<u8>,
    /// Refuse with NAK instead of staying silent
    pub nak_unsupported: bool,
    /// Master inhibit state, true = accepting
    pub accepting: bool,
    pub inhibit_mask: u16,
    pub counter: u8,
    /// Every credit poll records one more coin
    pub coin_per_poll: bool,
    /// Drop the last byte of credit replies
    pub truncate_credit: bool,
    pub events: VecDeque<(u8, u8)>,
    /// Requests addressed to this device, in order
    pub requests: Vec<Frame>,
}

impl CoinAcceptor {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            revision: vec![1, 4, 2],
            master_inhibit: true,
            inhibit_status: true,
            refuse: Vec::new(),
            nak_unsupported: false,
            accepting: false,
            inhibit_mask: 0,
            counter: 0,
            coin_per_poll: false,
            truncate_credit: false,
            events: VecDeque::from(vec![(0, 0); 5]),
            requests: Vec::new(),
        }
    }

    /// A device that implements none of the optional inhibit methods
    pub fn basic(address: u8) -> Self {
        Self {
            master_inhibit: false,
            inhibit_status: false,
            ..Self::new(address)
        }
    }

    pub fn shared(self) -> Rc<RefCell<CoinAcceptor>> {
        Rc::new(RefCell::new(self))
    }

    /// Insert a coin: pushes an event and advances the counter
    pub fn insert(&mut self, coin: u8, sorter: u8) {
        self.events.push_front((coin, sorter));
        self.events.truncate(5);
        self.counter = next_sequence(self.counter);
    }

    fn unsupported(&self) -> Option<(u8, Vec<u8>)> {
        self.nak_unsupported.then(|| (NAK, Vec::new()))
    }

    fn handle(&mut self, request: &Frame) -> Option<(u8, Vec<u8>)> {
        if request.destination() != self.address {
            return None;
        }
        self.requests.push(request.clone());

        let method = request.header();
        if self.refuse.contains(&method) {
            return self.unsupported();
        }

        let payload = request.payload();
        match method {
            1 => {
                self.counter = 0;
                self.events = VecDeque::from(vec![(0, 0); 5]);
                self.accepting = false;
                Some((0, Vec::new()))
            }
            4 => Some((0, self.revision.clone())),
            254 => Some((0, Vec::new())),
            227 if self.master_inhibit => Some((0, vec![u8::from(self.accepting)])),
            228 if self.master_inhibit => {
                if let [state] = payload {
                    self.accepting = state & 0x01 != 0;
                }
                Some((0, Vec::new()))
            }
            229 => {
                if self.coin_per_poll {
                    self.insert(1, 1);
                }
                let mut reply = vec![self.counter];
                for (a, b) in &self.events {
                    reply.push(*a);
                    reply.push(*b);
                }
                if self.truncate_credit {
                    reply.pop();
                }
                Some((0, reply))
            }
            230 if self.inhibit_status => Some((0, self.inhibit_mask.to_le_bytes().to_vec())),
            231 if self.inhibit_status => {
                if let [low, high] = payload {
                    self.inhibit_mask = u16::from_le_bytes([*low, *high]);
                }
                Some((0, Vec::new()))
            }
            _ => self.unsupported(),
        }
    }
}

/// Half-duplex line shared by the host and any number of acceptors
pub struct SimulatedBus {
    mode: ChecksumMode,
    /// The line echoes the host's own transmission
    pub echo: bool,
    /// Flip a bit in the echoed checksum byte
    pub mangle_echo: bool,
    /// Flip a bit in every reply's checksum byte
    pub corrupt_replies: bool,
    pub peers: Vec<Rc<RefCell<CoinAcceptor>>>,
    /// Raw bytes to serve after the next request instead of a peer reply
    pub scripted: Option<Vec<u8>>,
    /// Every byte the host wrote
    pub written: Vec<u8>,
    pending: Vec<u8>,
    rx: VecDeque<u8>,
}

impl SimulatedBus {
    pub fn new(mode: ChecksumMode) -> Self {
        Self {
            mode,
            echo: true,
            mangle_echo: false,
            corrupt_replies: false,
            peers: Vec::new(),
            scripted: None,
            written: Vec::new(),
            pending: Vec::new(),
            rx: VecDeque::new(),
        }
    }

    pub fn with_peer(mut self, peer: Rc<RefCell<CoinAcceptor>>) -> Self {
        self.peers.push(peer);
        self
    }

    /// Parse a completed request out of the pending bytes and queue replies
    fn dispatch(&mut self) {
        if self.pending.len() < HEADER_LEN + 1 {
            return;
        }
        let total = HEADER_LEN + self.pending[1] as usize + 1;
        if self.pending.len() < total {
            return;
        }

        let raw: Vec<u8> = self.pending.drain(..total).collect();
        let request = match Frame::from_bytes(&raw, self.mode) {
            Ok(frame) => frame,
            Err(_) => return,
        };

        if let Some(bytes) = self.scripted.take() {
            self.rx.extend(bytes);
            return;
        }

        let replies: Vec<(u8, Vec<u8>)> = self
            .peers
            .iter()
            .filter_map(|peer| peer.borrow_mut().handle(&request))
            .collect();

        for (status, payload) in replies {
            let reply = Frame::new(
                request.source().unwrap_or(1),
                request.destination(),
                status,
                payload,
            )
            .and_then(|frame| frame.to_bytes(self.mode))
            .expect("peer reply encodes");

            let mut reply = reply;
            if self.corrupt_replies {
                let last = reply.len() - 1;
                reply[last] ^= 0x01;
            }
            self.rx.extend(reply);
        }
    }
}

impl Channel for SimulatedBus {
    fn write_all_timeout(&mut self, data: &[u8], _: Duration) -> Result<(), ProtocolError> {
        self.written.extend_from_slice(data);
        self.pending.extend_from_slice(data);
        if self.echo {
            self.rx.extend(data);
            if self.mangle_echo {
                if let Some(last) = self.rx.back_mut() {
                    *last ^= 0x80;
                }
            }
        }
        self.dispatch();
        Ok(())
    }

    fn read_exact_timeout(&mut self, buf: &mut [u8], _: Duration) -> Result<(), ProtocolError> {
        if self.rx.len() < buf.len() {
            // The bytes that did arrive are consumed by the failed read
            self.rx.clear();
            return Err(ProtocolError::Timeout);
        }
        for b in buf.iter_mut() {
            *b = self.rx.pop_front().unwrap_or_default();
        }
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.rx.clear();
        Ok(())
    }
}

/// Test log output, enabled with RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
