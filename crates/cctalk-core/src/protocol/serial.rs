//! Serial port handling
//!
//! Opens and configures the line a ccTalk bus lives on: 8 data bits, no
//! parity, one stop bit, no flow control.

use serialport::SerialPort;
use std::time::Duration;

use super::{ProtocolError, SerialChannel, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Open and configure a serial port for a ccTalk bus
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<SerialChannel, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

    let mut port = serialport::new(name, baud)
        .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(name.to_string()),
            _ => ProtocolError::SerialError(e.to_string()),
        })?;

    configure_port(port.as_mut())?;
    clear_buffers(port.as_mut())?;

    tracing::debug!(port = name, baud, "opened ccTalk serial line");
    Ok(SerialChannel::new(port))
}

/// Configure a serial port for raw 8N1 operation
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}
