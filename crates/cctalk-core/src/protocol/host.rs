//! Host management
//!
//! A [`Host`] owns the byte channel of one bus and performs strictly
//! half-duplex request/reply exchanges on it. The configured timeout bounds
//! the wait for each next byte of every read and write; there is no overall
//! deadline and no retry.

use std::cell::{Cell, RefCell};

use super::{open_port, Channel, Frame, ProtocolError, SerialChannel, WireHeader, HEADER_LEN};
use crate::config::HostConfig;

/// Cumulative traffic seen by a host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficCounters {
    /// Bytes written, echo excluded
    pub tx_bytes: u64,
    /// Bytes of received frames
    pub rx_bytes: u64,
    /// Frames sent
    pub tx_frames: u64,
    /// Valid frames received
    pub rx_frames: u64,
}

/// ccTalk host on a single bus
///
/// The channel sits behind a `RefCell`, so a host can be shared by reference
/// between the [`Device`](crate::device::Device)s on its bus while staying
/// `!Sync`. Serialize access with a `Mutex` to use it from several threads.
pub struct Host<C: Channel = SerialChannel> {
    channel: RefCell<C>,
    config: HostConfig,
    counters: Cell<TrafficCounters>,
}

impl Host<SerialChannel> {
    /// Open the serial line at `path` and build a host on it
    pub fn open(path: &str, config: HostConfig) -> Result<Self, ProtocolError> {
        let channel = open_port(path, Some(config.baud_rate))?;
        Ok(Self::new(channel, config))
    }
}

impl<C: Channel> Host<C> {
    /// Create a host over an already opened channel
    pub fn new(channel: C, config: HostConfig) -> Self {
        Self {
            channel: RefCell::new(channel),
            config,
            counters: Cell::new(TrafficCounters::default()),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Mutable configuration; changes apply to the next exchange
    pub fn config_mut(&mut self) -> &mut HostConfig {
        &mut self.config
    }

    /// Address the host sends from
    pub fn address(&self) -> u8 {
        self.config.address
    }

    /// Get cumulative tx/rx counters
    pub fn counters(&self) -> TrafficCounters {
        self.counters.get()
    }

    /// Send one request frame.
    ///
    /// Header, payload and checksum are written as three timeout-bounded
    /// writes; the first failure aborts the rest. With `verify_echo` the
    /// frame is then read back from the line and must match byte for byte.
    pub fn send(
        &self,
        destination: u8,
        method: impl Into<u8>,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        let frame = Frame::new(destination, self.config.address, method.into(), payload.to_vec())?;
        let (wire, trailer) = frame.seal(self.config.checksum_mode)?;
        let header = wire.to_bytes();
        let timeout = self.config.timeout();

        tracing::debug!(
            destination,
            method = frame.header(),
            len = payload.len(),
            "sending ccTalk frame"
        );

        let mut channel = self.channel.borrow_mut();

        // A late reply to an earlier, timed-out request must not be read as ours
        channel.clear_input()?;

        channel.write_all_timeout(&header, timeout)?;
        if !payload.is_empty() {
            channel.write_all_timeout(payload, timeout)?;
        }
        channel.write_all_timeout(&[trailer], timeout)?;

        let mut counters = self.counters.get();
        counters.tx_bytes += frame.encoded_size() as u64;
        counters.tx_frames += 1;
        self.counters.set(counters);

        if self.config.verify_echo {
            let mut echo = vec![0u8; frame.encoded_size()];
            channel.read_exact_timeout(&mut echo, timeout)?;

            let echoed_ok = echo[..HEADER_LEN] == header
                && echo[HEADER_LEN..HEADER_LEN + payload.len()] == *payload
                && echo[HEADER_LEN + payload.len()] == trailer;
            if !echoed_ok {
                tracing::debug!(echo = ?echo, "echo mismatch");
                return Err(ProtocolError::EchoMismatch);
            }
        }

        Ok(())
    }

    /// Receive one frame and validate its checksum.
    ///
    /// Nothing is returned unless the whole frame arrived and checked out.
    pub fn recv(&self) -> Result<Frame, ProtocolError> {
        let timeout = self.config.timeout();
        let mut channel = self.channel.borrow_mut();

        let mut header = [0u8; HEADER_LEN];
        channel.read_exact_timeout(&mut header, timeout)?;
        let header = WireHeader::from_bytes(header);

        let mut payload = vec![0u8; header.length as usize];
        if !payload.is_empty() {
            channel.read_exact_timeout(&mut payload, timeout)?;
        }

        let mut trailer = [0u8; 1];
        channel.read_exact_timeout(&mut trailer, timeout)?;

        let frame = Frame::decode(header, payload, trailer[0], self.config.checksum_mode)?;

        let mut counters = self.counters.get();
        counters.rx_bytes += frame.encoded_size() as u64;
        counters.rx_frames += 1;
        self.counters.set(counters);

        tracing::debug!(
            destination = frame.destination(),
            source = ?frame.source(),
            status = frame.status(),
            len = frame.payload().len(),
            "received ccTalk frame"
        );

        Ok(frame)
    }

    /// Receive a reply and return its status byte (0 = success)
    pub fn recv_status(&self) -> Result<u8, ProtocolError> {
        self.recv().map(|frame| frame.status())
    }

    /// Receive a reply, copy its payload into `buf` and return its status.
    ///
    /// `buf` is zeroed first, so a shorter payload leaves the tail at 0; a
    /// longer one is cut to `buf.len()`.
    pub fn recv_data(&self, buf: &mut [u8]) -> Result<u8, ProtocolError> {
        buf.fill(0);

        let frame = self.recv()?;
        let n = frame.payload().len().min(buf.len());
        buf[..n].copy_from_slice(&frame.payload()[..n]);

        Ok(frame.status())
    }

    /// Send a request and wait for its reply
    pub fn transact(
        &self,
        destination: u8,
        method: impl Into<u8>,
        payload: &[u8],
    ) -> Result<Frame, ProtocolError> {
        self.send(destination, method, payload)?;
        self.recv()
    }

    /// Release the host and hand back its channel
    pub fn into_channel(self) -> C {
        self.channel.into_inner()
    }

    /// Release the host, closing its channel
    pub fn close(self) {
        drop(self);
    }
}
