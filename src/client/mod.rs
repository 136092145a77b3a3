//! Host side of the serial link. Sends protocol commands to the digitizer
//! and waits for each acknowledgement.

use std::{
    io::{self, Read, Write},
    string::FromUtf8Error,
    time::Duration,
};

use serialport::{DataBits, Parity, SerialPortType, StopBits, TTYPort};
use thiserror::Error;

use crate::{
    constants::{MAX_LINE_LENGTH, SERIAL_TERMINATOR},
    protocol::{self, Command, ProtocolError},
};

pub const NO_RESPONSE: &str = "No response (timeout)";

#[derive(Error, Debug)]
pub enum SerialClientError {
    #[error("failed to open serial port: {0}")]
    Open(#[from] serialport::Error),
    #[error("serial error: {0}")]
    Io(#[from] io::Error),
    #[error("response decode error: {0}")]
    Decode(#[from] FromUtf8Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("response longer than {0} bytes")]
    LineTooLong(usize),
}

/// Outcome of a command: success and the error message reported by the
/// digitizer, if any
pub type CommandResult = (bool, Option<String>);

/// A serial port found on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub device: String,
    pub description: String,
}

/// List the serial ports available on this host
pub fn list_ports() -> Result<Vec<PortInfo>, SerialClientError> {
    let ports = serialport::available_ports()?;
    let ports = ports
        .into_iter()
        .map(|port| {
            let description = match port.port_type {
                SerialPortType::UsbPort(info) => info
                    .product
                    .or(info.manufacturer)
                    .unwrap_or_else(|| format!("USB {:04x}:{:04x}", info.vid, info.pid)),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::Unknown => "n/a".to_string(),
            };
            PortInfo {
                device: port.port_name,
                description,
            }
        })
        .collect();
    Ok(ports)
}

/// Sends commands over the serial link, one at a time
#[derive(Debug)]
pub struct SerialClient<P: Read + Write = TTYPort> {
    port: P,
    pending: Vec<u8>,
}

impl SerialClient<TTYPort> {
    /// Open `device` with 8N1 framing. `timeout` bounds the wait for each
    /// response.
    pub fn connect(device: &str, baud_rate: u32, timeout: Duration) -> Result<Self, SerialClientError> {
        let builder = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout);
        let port = match TTYPort::open(&builder) {
            Ok(port) => port,
            Err(e) => {
                log::error!("Failed to connect to {device}: {e}");
                return Err(e.into());
            }
        };
        log::info!("Connected to {device} at {baud_rate} baud");
        Ok(Self::new(port))
    }
}

impl<P: Read + Write> SerialClient<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Send a command and wait for its response line
    pub fn send_command(&mut self, command: &Command) -> Result<CommandResult, SerialClientError> {
        self.send_line(&command.to_string())
    }

    /// Send a raw command line (without terminator) and wait for the
    /// response. A read timeout is reported as a failed command, not an error.
    pub fn send_line(&mut self, command: &str) -> Result<CommandResult, SerialClientError> {
        let line = protocol::format_command_for_send(command);
        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;
        log::debug!("Sent command: {command}");

        let Some(response) = self.read_line()? else {
            log::warn!("No response from digitizer (timeout)");
            return Ok((false, Some(NO_RESPONSE.to_string())));
        };
        let response = String::from_utf8(response)?;
        let response = response.trim();
        log::debug!("Received response: {response}");

        let (success, error) = protocol::parse_response(response);
        if !success {
            log::warn!(
                "Command failed: {}",
                error.as_deref().unwrap_or("Unknown error")
            );
        }
        Ok((success, error))
    }

    pub fn move_to(&mut self, x: i64, y: i64) -> Result<CommandResult, SerialClientError> {
        let command = protocol::format_move(x, y)?;
        self.send_line(&command)
    }

    pub fn click(&mut self, button: &str) -> Result<CommandResult, SerialClientError> {
        let command = protocol::format_click(button)?;
        self.send_line(&command)
    }

    pub fn release(&mut self) -> Result<CommandResult, SerialClientError> {
        self.send_line(&protocol::format_release())
    }

    pub fn gesture_start(&mut self) -> Result<CommandResult, SerialClientError> {
        self.send_line(&protocol::format_gesture_start())
    }

    pub fn gesture_stop(&mut self) -> Result<CommandResult, SerialClientError> {
        self.send_line(&protocol::format_gesture_stop())
    }

    /// Read up to the next terminator. Returns `None` if the port timed out
    /// or closed before a full line arrived.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, SerialClientError> {
        let terminator = SERIAL_TERMINATOR as u8;
        let mut buf = [0u8; 64];
        let mut scanned = 0;
        loop {
            if let Some(offset) = self.pending[scanned..].iter().position(|b| *b == terminator) {
                let mut line: Vec<u8> = self.pending.drain(..=scanned + offset).collect();
                line.pop();
                return Ok(Some(line));
            }
            scanned = self.pending.len();
            if scanned > MAX_LINE_LENGTH {
                self.pending.clear();
                return Err(SerialClientError::LineTooLong(MAX_LINE_LENGTH));
            }
            match self.port.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(count) => self.pending.extend_from_slice(&buf[..count]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    self.pending.clear();
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
