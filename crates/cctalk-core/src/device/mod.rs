//! Peer devices
//!
//! A [`Device`] is one peripheral on a host's bus. It is created only by
//! [`Device::scan`], which learns the comms revision and probes the optional
//! inhibit features once. The probed [`Capabilities`] never change after
//! that; only the coin mask is policy state the caller can update.

mod credit;

pub use credit::{next_sequence, CoinEvent, CreditInfo, CREDIT_REPLY_LEN, EVENT_SLOTS};

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::protocol::{Channel, Frame, Host, Method, ProtocolError, SerialChannel};

/// Comms revision reported by "request comms revision"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommsRevision {
    /// Release level
    pub level: u8,
    /// Major revision
    pub major: u8,
    /// Minor revision
    pub minor: u8,
}

impl CommsRevision {
    /// Version packed as `major << 8 | minor`
    pub fn as_u16(&self) -> u16 {
        (u16::from(self.major) << 8) | u16::from(self.minor)
    }
}

impl fmt::Display for CommsRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} (level {})", self.major, self.minor, self.level)
    }
}

/// Optional features detected during the scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    master_inhibit: bool,
    inhibit_status: bool,
}

impl Capabilities {
    /// Device answers both master inhibit methods (227/228)
    pub fn has_master_inhibit(&self) -> bool {
        self.master_inhibit
    }

    /// Device answers both per-coin inhibit methods (230/231)
    pub fn has_inhibit_status(&self) -> bool {
        self.inhibit_status
    }
}

/// A scanned ccTalk peripheral reachable through a [`Host`]
pub struct Device<'h, C: Channel = SerialChannel> {
    host: &'h Host<C>,
    address: u8,
    revision: CommsRevision,
    capabilities: Capabilities,
    coin_mask: u16,
}

impl<'h, C: Channel> Device<'h, C> {
    /// Identify the device at `address` and detect what it supports.
    ///
    /// Fails only if the comms revision cannot be read. Capability probes that
    /// time out or are refused just leave the capability off.
    pub fn scan(host: &'h Host<C>, address: u8) -> Result<Self, ProtocolError> {
        let reply = host.transact(address, Method::RequestCommsRevision, &[])?;
        let payload = expect_reply(Method::RequestCommsRevision, reply)?;
        let revision = CommsRevision {
            level: payload[0],
            major: payload[1],
            minor: payload[2],
        };

        let capabilities = Capabilities {
            master_inhibit: probe(host, address, Method::RequestMasterInhibitStatus)
                && probe(host, address, Method::ModifyMasterInhibitStatus),
            inhibit_status: probe(host, address, Method::RequestInhibitStatus)
                && probe(host, address, Method::ModifyInhibitStatus),
        };

        tracing::debug!(
            address,
            revision = %revision,
            master_inhibit = capabilities.master_inhibit,
            inhibit_status = capabilities.inhibit_status,
            "scanned ccTalk device"
        );

        Ok(Self {
            host,
            address,
            revision,
            capabilities,
            coin_mask: u16::MAX,
        })
    }

    /// Bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Comms version as `major << 8 | minor`
    pub fn version(&self) -> u16 {
        self.revision.as_u16()
    }

    /// Full comms revision
    pub fn revision(&self) -> CommsRevision {
        self.revision
    }

    /// What the scan found
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Coins to accept; bit `i` enables coin position `i + 1`
    pub fn coin_mask(&self) -> u16 {
        self.coin_mask
    }

    /// Host this device talks through
    pub fn host(&self) -> &'h Host<C> {
        self.host
    }

    /// Accept (`on`) or reject all coins.
    ///
    /// Uses the master inhibit if present, otherwise the per-coin inhibit
    /// loaded with the coin mask (or all zeroes). A device with neither is
    /// assumed to always accept: nothing is sent and the call succeeds.
    pub fn set_accept_coins(&self, on: bool) -> Result<(), ProtocolError> {
        if self.capabilities.master_inhibit {
            return self.command(Method::ModifyMasterInhibitStatus, &[u8::from(on)]);
        }

        if self.capabilities.inhibit_status {
            let mut mask = [0u8; 2];
            LittleEndian::write_u16(&mut mask, if on { self.coin_mask } else { 0 });
            return self.command(Method::ModifyInhibitStatus, &mask);
        }

        tracing::debug!(address = self.address, "no inhibit support, accepting implicitly");
        Ok(())
    }

    /// Change the set of acceptable coins.
    ///
    /// Local only: the mask reaches the device with the next
    /// `set_accept_coins(true)`, and never on devices without inhibit support.
    pub fn set_coin_mask(&mut self, mask: u16) {
        self.coin_mask = mask;
    }

    /// Read the buffered credit and error events
    pub fn query_credits(&self) -> Result<CreditInfo, ProtocolError> {
        let reply = self.request(Method::ReadBufferedCredit, &[])?;
        CreditInfo::from_payload(reply.payload())
    }

    /// Check the device is alive
    pub fn poll(&self) -> Result<(), ProtocolError> {
        self.command(Method::SimplePoll, &[])
    }

    /// Reset the device to its power-up state
    pub fn reset(&self) -> Result<(), ProtocolError> {
        self.command(Method::ResetDevice, &[])
    }

    /// Per-coin inhibit mask currently active on the device
    pub fn read_inhibit_status(&self) -> Result<u16, ProtocolError> {
        let reply = self.request(Method::RequestInhibitStatus, &[])?;
        let payload = expect_reply(Method::RequestInhibitStatus, reply)?;
        Ok(LittleEndian::read_u16(&payload))
    }

    /// Whether the master inhibit currently lets coins through
    pub fn read_master_inhibit_status(&self) -> Result<bool, ProtocolError> {
        let reply = self.request(Method::RequestMasterInhibitStatus, &[])?;
        let payload = expect_reply(Method::RequestMasterInhibitStatus, reply)?;
        Ok(payload[0] & 0x01 != 0)
    }

    /// Request/reply with a successful status required
    fn request(&self, method: Method, payload: &[u8]) -> Result<Frame, ProtocolError> {
        let reply = self.host.transact(self.address, method, payload)?;
        match reply.status() {
            0 => Ok(reply),
            status => Err(ProtocolError::DeviceStatus(status)),
        }
    }

    /// Request whose reply carries nothing but a status
    fn command(&self, method: Method, payload: &[u8]) -> Result<(), ProtocolError> {
        self.host.send(self.address, method, payload)?;
        match self.host.recv_status()? {
            0 => Ok(()),
            status => Err(ProtocolError::DeviceStatus(status)),
        }
    }
}

impl<C: Channel> fmt::Debug for Device<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address)
            .field("revision", &self.revision)
            .field("capabilities", &self.capabilities)
            .field("coin_mask", &format_args!("{:#06x}", self.coin_mask))
            .finish()
    }
}

/// True if `method` is answered with a success status
fn probe<C: Channel>(host: &Host<C>, address: u8, method: Method) -> bool {
    let supported = host
        .send(address, method, &[])
        .and_then(|_| host.recv_status())
        .map(|status| status == 0);

    match supported {
        Ok(supported) => supported,
        Err(e) => {
            tracing::debug!(address, method = method.code(), error = %e, "capability probe failed");
            false
        }
    }
}

/// Require a successful reply of the registry-defined length
fn expect_reply(method: Method, reply: Frame) -> Result<Vec<u8>, ProtocolError> {
    if reply.status() != 0 {
        return Err(ProtocolError::DeviceStatus(reply.status()));
    }
    let expected = method.reply_len().unwrap_or(reply.payload().len());
    if reply.payload().len() != expected {
        return Err(ProtocolError::MalformedReply {
            method: method.code(),
            expected,
            actual: reply.payload().len(),
        });
    }
    Ok(reply.into_payload())
}
