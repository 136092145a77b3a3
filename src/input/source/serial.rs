use std::{
    io::{self, Read, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use serialport::{DataBits, Parity, StopBits, TTYPort};
use thiserror::Error;

use crate::{
    constants::{MAX_LINE_LENGTH, SERIAL_TERMINATOR},
    protocol::format_response,
};

/// Back-off after an unexpected port error before reading again
const ERROR_BACKOFF: Duration = Duration::from_millis(100);
const READ_BUFFER_SIZE: usize = 256;

/// Message sent back when a command exceeds [MAX_LINE_LENGTH]
pub const LINE_TOO_LONG: &str = "Line too long";

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("failed to open serial port: {0}")]
    Open(#[from] serialport::Error),
    #[error("serial i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Reads newline terminated commands from the serial link and answers each
/// one before reading the next.
#[derive(Debug)]
pub struct SerialListener<P: Read + Write = TTYPort> {
    port: P,
    running: Arc<AtomicBool>,
    pending: Vec<u8>,
    overflowed: bool,
}

impl SerialListener<TTYPort> {
    /// Open the gadget side of the serial link (8N1)
    pub fn open(device: &str, baud_rate: u32, timeout: Duration) -> Result<Self, SerialError> {
        let builder = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout);
        let port = match TTYPort::open(&builder) {
            Ok(port) => port,
            Err(e) => {
                log::error!("Failed to open serial port {device}: {e}");
                return Err(e.into());
            }
        };
        log::info!("Opened serial port: {device} at {baud_rate} baud");
        Ok(Self::new(port))
    }
}

impl<P: Read + Write> SerialListener<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            running: Arc::new(AtomicBool::new(false)),
            pending: Vec::new(),
            overflowed: false,
        }
    }

    /// Returns a flag that stops [SerialListener::listen] when cleared. The
    /// loop notices within one read timeout.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn stop(&self) {
        log::info!("Stopping serial listener...");
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Send a response line. Failures are logged and otherwise ignored.
    pub fn send_response(&mut self, message: &str) {
        let line = format!("{message}{SERIAL_TERMINATOR}");
        let result = self
            .port
            .write_all(line.as_bytes())
            .and_then(|_| self.port.flush());
        match result {
            Ok(_) => log::debug!("Sent response: {message}"),
            Err(e) => log::error!("Error sending response: {e}"),
        }
    }

    /// Read commands until stopped or the port hangs up, passing each
    /// non-empty line to `handler` and writing back the line it returns.
    /// Read timeouts are not errors.
    pub fn listen<F>(&mut self, mut handler: F) -> Result<(), SerialError>
    where
        F: FnMut(&str) -> String,
    {
        self.running.store(true, Ordering::SeqCst);
        log::info!("Starting serial listener...");

        let mut buf = [0u8; READ_BUFFER_SIZE];
        while self.running.load(Ordering::SeqCst) {
            let count = match self.port.read(&mut buf) {
                Ok(0) => {
                    log::info!("Serial port closed");
                    break;
                }
                Ok(count) => count,
                Err(e) => match e.kind() {
                    io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::Interrupted => continue,
                    _ => {
                        log::error!("Serial error: {e}");
                        thread::sleep(ERROR_BACKOFF);
                        continue;
                    }
                },
            };
            self.process_bytes(&buf[..count], &mut handler);
        }

        self.running.store(false, Ordering::SeqCst);
        log::info!("Serial listener stopped");
        Ok(())
    }

    /// Feed freshly read bytes into the line buffer, handling every line they
    /// complete. Only the new bytes are scanned for the terminator.
    fn process_bytes<F>(&mut self, mut data: &[u8], handler: &mut F)
    where
        F: FnMut(&str) -> String,
    {
        let terminator = SERIAL_TERMINATOR as u8;
        while let Some(end) = data.iter().position(|b| *b == terminator) {
            self.buffer_bytes(&data[..end]);
            data = &data[end + 1..];

            let line = std::mem::take(&mut self.pending);
            if std::mem::take(&mut self.overflowed) {
                self.send_response(&format_response(false, LINE_TOO_LONG));
                continue;
            }
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            self.handle_line(line, handler);
        }
        self.buffer_bytes(data);
    }

    /// Append to the pending line. A line longer than [MAX_LINE_LENGTH] is
    /// dropped up to its terminator.
    fn buffer_bytes(&mut self, bytes: &[u8]) {
        if self.overflowed {
            return;
        }
        if self.pending.len() + bytes.len() > MAX_LINE_LENGTH {
            log::warn!("Discarding command longer than {MAX_LINE_LENGTH} bytes");
            self.pending.clear();
            self.overflowed = true;
            return;
        }
        self.pending.extend_from_slice(bytes);
    }

    fn handle_line<F>(&mut self, line: Vec<u8>, handler: &mut F)
    where
        F: FnMut(&str) -> String,
    {
        let line = match String::from_utf8(line) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to decode line: {e}");
                self.send_response(&format_response(false, "Invalid encoding"));
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        log::debug!("Received command: {line}");
        let response = handler(line);
        self.send_response(&response);
    }
}
