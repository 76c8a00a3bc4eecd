//! Protocol commands
//!
//! The subset of the ccTalk method registry used by the device layer, and
//! the coin acceptor error codes reported through buffered credit polls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ccTalk methods (header codes) understood by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Reset device (1)
    ResetDevice,

    /// Request comms revision (4)
    RequestCommsRevision,

    /// Request master inhibit status (227)
    RequestMasterInhibitStatus,

    /// Modify master inhibit status (228)
    ModifyMasterInhibitStatus,

    /// Read buffered credit or error codes (229)
    ReadBufferedCredit,

    /// Request inhibit status (230)
    RequestInhibitStatus,

    /// Modify inhibit status (231)
    ModifyInhibitStatus,

    /// Simple poll (254)
    SimplePoll,
}

impl Method {
    /// Header byte for this method
    pub fn code(&self) -> u8 {
        match self {
            Method::ResetDevice => 1,
            Method::RequestCommsRevision => 4,
            Method::RequestMasterInhibitStatus => 227,
            Method::ModifyMasterInhibitStatus => 228,
            Method::ReadBufferedCredit => 229,
            Method::RequestInhibitStatus => 230,
            Method::ModifyInhibitStatus => 231,
            Method::SimplePoll => 254,
        }
    }

    /// Look up a method by header byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Method::ResetDevice),
            4 => Some(Method::RequestCommsRevision),
            227 => Some(Method::RequestMasterInhibitStatus),
            228 => Some(Method::ModifyMasterInhibitStatus),
            229 => Some(Method::ReadBufferedCredit),
            230 => Some(Method::RequestInhibitStatus),
            231 => Some(Method::ModifyInhibitStatus),
            254 => Some(Method::SimplePoll),
            _ => None,
        }
    }

    /// Payload length of a successful reply, where the registry fixes one
    pub fn reply_len(&self) -> Option<usize> {
        match self {
            Method::ResetDevice
            | Method::ModifyMasterInhibitStatus
            | Method::ModifyInhibitStatus
            | Method::SimplePoll => Some(0),
            Method::RequestCommsRevision => Some(3),
            Method::RequestMasterInhibitStatus => Some(1),
            Method::ReadBufferedCredit => Some(11),
            Method::RequestInhibitStatus => Some(2),
        }
    }
}

impl From<Method> for u8 {
    fn from(method: Method) -> Self {
        method.code()
    }
}

/// Coin acceptor error codes (result B of a buffered credit event with result A = 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcceptorError {
    NullEvent,
    RejectCoin,
    InhibitedCoin,
    MultipleWindow,
    WakeUpTimeout,
    ValidationTimeout,
    CreditSensorTimeout,
    SorterOptoTimeout,
    SecondCloseCoin,
    AcceptGateNotReady,
    CreditSensorNotReady,
    SorterNotReady,
    RejectCoinNotCleared,
    ValidationSensorNotReady,
    CreditSensorBlocked,
    SorterOptoBlocked,
    CreditSequenceError,
    CoinGoingBackwards,
    CoinTooFastOverCreditSensor,
    CoinTooSlowOverCreditSensor,
    CoinOnStringActivated,
    DceOptoTimeout,
    DceOptoNotSeen,
    CreditSensorReachedTooEarly,
    RejectCoinRepeatedTrip,
    RejectSlug,
    RejectSensorBlocked,
    GamesOverload,
    MaxCoinMeterPulsesExceeded,
    AcceptGateOpenNotClosed,
    AcceptGateClosedNotOpen,
    ManifoldOptoTimeout,
    ManifoldOptoBlocked,
    ManifoldNotReady,
    SecurityStatusChanged,
    MotorException,
    SwallowedCoin,
    CoinTooFastOverValidationSensor,
    CoinTooSlowOverValidationSensor,
    CoinIncorrectlySorted,
    ExternalLightAttack,
    /// Coin of the given position (1..=32) was inhibited (codes 128..=159)
    InhibitedCoinPosition(u8),
    DataBlockRequest,
    CoinReturnMechanismActivated,
    UnspecifiedAlarm,
    /// Code not in the table
    Unknown(u8),
}

const NAMED: [AcceptorError; 41] = [
    AcceptorError::NullEvent,
    AcceptorError::RejectCoin,
    AcceptorError::InhibitedCoin,
    AcceptorError::MultipleWindow,
    AcceptorError::WakeUpTimeout,
    AcceptorError::ValidationTimeout,
    AcceptorError::CreditSensorTimeout,
    AcceptorError::SorterOptoTimeout,
    AcceptorError::SecondCloseCoin,
    AcceptorError::AcceptGateNotReady,
    AcceptorError::CreditSensorNotReady,
    AcceptorError::SorterNotReady,
    AcceptorError::RejectCoinNotCleared,
    AcceptorError::ValidationSensorNotReady,
    AcceptorError::CreditSensorBlocked,
    AcceptorError::SorterOptoBlocked,
    AcceptorError::CreditSequenceError,
    AcceptorError::CoinGoingBackwards,
    AcceptorError::CoinTooFastOverCreditSensor,
    AcceptorError::CoinTooSlowOverCreditSensor,
    AcceptorError::CoinOnStringActivated,
    AcceptorError::DceOptoTimeout,
    AcceptorError::DceOptoNotSeen,
    AcceptorError::CreditSensorReachedTooEarly,
    AcceptorError::RejectCoinRepeatedTrip,
    AcceptorError::RejectSlug,
    AcceptorError::RejectSensorBlocked,
    AcceptorError::GamesOverload,
    AcceptorError::MaxCoinMeterPulsesExceeded,
    AcceptorError::AcceptGateOpenNotClosed,
    AcceptorError::AcceptGateClosedNotOpen,
    AcceptorError::ManifoldOptoTimeout,
    AcceptorError::ManifoldOptoBlocked,
    AcceptorError::ManifoldNotReady,
    AcceptorError::SecurityStatusChanged,
    AcceptorError::MotorException,
    AcceptorError::SwallowedCoin,
    AcceptorError::CoinTooFastOverValidationSensor,
    AcceptorError::CoinTooSlowOverValidationSensor,
    AcceptorError::CoinIncorrectlySorted,
    AcceptorError::ExternalLightAttack,
];

impl AcceptorError {
    /// Wire code of this error
    pub fn code(&self) -> u8 {
        match self {
            AcceptorError::InhibitedCoinPosition(position) => 127u8.saturating_add(*position),
            AcceptorError::DataBlockRequest => 253,
            AcceptorError::CoinReturnMechanismActivated => 254,
            AcceptorError::UnspecifiedAlarm => 255,
            AcceptorError::Unknown(code) => *code,
            named => NAMED
                .iter()
                .position(|e| e == named)
                .map(|i| i as u8)
                .unwrap_or(0),
        }
    }

    /// True for the "no error" placeholder
    pub fn is_null(&self) -> bool {
        matches!(self, AcceptorError::NullEvent)
    }
}

impl From<u8> for AcceptorError {
    fn from(code: u8) -> Self {
        match code {
            0..=40 => NAMED[code as usize],
            128..=159 => AcceptorError::InhibitedCoinPosition(code - 127),
            253 => AcceptorError::DataBlockRequest,
            254 => AcceptorError::CoinReturnMechanismActivated,
            255 => AcceptorError::UnspecifiedAlarm,
            other => AcceptorError::Unknown(other),
        }
    }
}

impl fmt::Display for AcceptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptorError::InhibitedCoinPosition(position) => {
                write!(f, "inhibited coin (type {})", position)
            }
            AcceptorError::Unknown(code) => write!(f, "unknown acceptor error {}", code),
            other => write!(f, "{:?} ({})", other, other.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_codes() {
        assert_eq!(u8::from(Method::RequestCommsRevision), 4);
        assert_eq!(u8::from(Method::ResetDevice), 1);
        assert_eq!(u8::from(Method::ReadBufferedCredit), 229);
        assert_eq!(Method::ModifyMasterInhibitStatus.code(), 228);
        assert_eq!(Method::ModifyInhibitStatus.code(), 231);
    }

    #[test]
    fn test_method_code_lookup() {
        for method in [
            Method::ResetDevice,
            Method::RequestCommsRevision,
            Method::RequestMasterInhibitStatus,
            Method::ModifyMasterInhibitStatus,
            Method::ReadBufferedCredit,
            Method::RequestInhibitStatus,
            Method::ModifyInhibitStatus,
            Method::SimplePoll,
        ] {
            assert_eq!(Method::from_code(method.code()), Some(method));
        }
        assert_eq!(Method::from_code(0), None);
    }

    #[test]
    fn test_acceptor_error_table() {
        assert_eq!(AcceptorError::from(0), AcceptorError::NullEvent);
        assert_eq!(AcceptorError::from(2), AcceptorError::InhibitedCoin);
        assert_eq!(AcceptorError::from(40), AcceptorError::ExternalLightAttack);
        assert_eq!(AcceptorError::from(128), AcceptorError::InhibitedCoinPosition(1));
        assert_eq!(AcceptorError::from(159), AcceptorError::InhibitedCoinPosition(32));
        assert_eq!(AcceptorError::from(100), AcceptorError::Unknown(100));
        assert_eq!(AcceptorError::from(255), AcceptorError::UnspecifiedAlarm);
    }

    #[test]
    fn test_acceptor_error_codes_are_stable() {
        for code in 0..=u8::MAX {
            assert_eq!(AcceptorError::from(code).code(), code);
        }
    }
}
