//! Byte channel abstraction
//!
//! The host talks to a [`Channel`]: a duplex byte stream whose every read and
//! write is bounded by its own timeout. [`SerialChannel`] is the production
//! implementation over a `serialport` handle; tests substitute simulated buses.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::ProtocolError;

/// Duplex byte channel whose timeouts bound the wait for each next byte
pub trait Channel {
    /// Write all of `data`; `timeout` bounds the wait before each next byte is accepted
    fn write_all_timeout(&mut self, data: &[u8], timeout: Duration) -> Result<(), ProtocolError>;

    /// Fill `buf` completely; `timeout` bounds the wait for each next byte.
    ///
    /// A slow peer that keeps every gap under `timeout` succeeds. A short read
    /// is a failure; partially received bytes are discarded.
    fn read_exact_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<(), ProtocolError>;

    /// Discard anything already waiting in the receive buffer
    fn clear_input(&mut self) -> Result<(), ProtocolError>;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn write_all_timeout(&mut self, data: &[u8], timeout: Duration) -> Result<(), ProtocolError> {
        (**self).write_all_timeout(data, timeout)
    }

    fn read_exact_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<(), ProtocolError> {
        (**self).read_exact_timeout(buf, timeout)
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        (**self).clear_input()
    }
}

/// Serial port wrapper implementing [`Channel`]
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an already opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Port name, if the backend knows it
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

    /// Give back the underlying port
    pub fn into_inner(self) -> Box<dyn SerialPort> {
        self.port
    }

    /// Arm the port timeout with whatever is left until `deadline`
    fn arm(&mut self, deadline: Instant) -> Result<(), ProtocolError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ProtocolError::Timeout);
        }
        self.port
            .set_timeout(remaining)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }
}

impl Channel for SerialChannel {
    fn write_all_timeout(&mut self, data: &[u8], timeout: Duration) -> Result<(), ProtocolError> {
        let mut deadline = Instant::now() + timeout;
        let mut written = 0;

        while written < data.len() {
            self.arm(deadline)?;
            match self.port.write(&data[written..]) {
                Ok(0) => {
                    return Err(ProtocolError::SerialError(
                        "serial port accepted no bytes".to_string(),
                    ))
                }
                Ok(n) => {
                    written += n;
                    deadline = Instant::now() + timeout;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Err(ProtocolError::Timeout)
                }
                Err(e) => return Err(ProtocolError::IoError(e)),
            }
        }

        tracing::trace!(bytes = ?data, "serial write");
        Ok(())
    }

    fn read_exact_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<(), ProtocolError> {
        let mut deadline = Instant::now() + timeout;
        let mut filled = 0;

        while filled < buf.len() {
            self.arm(deadline)?;
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => return Err(ProtocolError::SerialError("serial port closed".to_string())),
                Ok(n) => {
                    filled += n;
                    // The timeout bounds the gap between bytes, not the whole read
                    deadline = Instant::now() + timeout;
                }
                Err(ref e)
                    if e.kind() == io::ErrorKind::Interrupted
                        || e.kind() == io::ErrorKind::WouldBlock => {}
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    tracing::trace!(received = filled, wanted = buf.len(), "serial read timed out");
                    return Err(ProtocolError::Timeout);
                }
                Err(e) => return Err(ProtocolError::IoError(e)),
            }
        }

        tracing::trace!(bytes = ?buf, "serial read");
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }
}
