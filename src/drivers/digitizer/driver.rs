use std::{
    fs::{File, OpenOptions},
    io::Write,
    thread,
    time::Duration,
};

use crate::{constants::DEFAULT_CLICK_DURATION_MS, protocol::ButtonId};

use super::{
    hid_report::{clamp_coordinate, create_report},
    DigitizerError, DigitizerState, BUTTON_BARREL, BUTTON_MASK, BUTTON_TIP_SWITCH,
};

/// Returns the report bit for the given button
pub fn button_mask(button: ButtonId) -> u8 {
    match button {
        ButtonId::Left => BUTTON_TIP_SWITCH,
        ButtonId::Right => BUTTON_BARREL,
    }
}

/// Driver for a USB gadget HID digitizer. Owns the device sink and the last
/// successfully transmitted [DigitizerState].
#[derive(Debug)]
pub struct Driver<W: Write = File> {
    sink: W,
    state: DigitizerState,
    click_duration: Duration,
}

impl Driver<File> {
    /// Open the raw HID gadget character device (e.g. `/dev/hidg0`) for writing
    pub fn open(path: &str, click_duration: Duration) -> Result<Self, DigitizerError> {
        let device = match OpenOptions::new().write(true).open(path) {
            Ok(device) => device,
            Err(e) => {
                log::error!("Failed to open HID device {path}: {e}");
                return Err(e.into());
            }
        };
        log::info!("Opened HID device: {path}");
        Ok(Self::new(device, click_duration))
    }
}

impl<W: Write> Driver<W> {
    /// Create a new driver writing reports to the given sink
    pub fn new(sink: W, click_duration: Duration) -> Self {
        Self {
            sink,
            state: DigitizerState::default(),
            click_duration,
        }
    }

    /// Create a new driver with the default click duration
    pub fn with_sink(sink: W) -> Self {
        Self::new(sink, Duration::from_millis(DEFAULT_CLICK_DURATION_MS))
    }

    pub fn state(&self) -> DigitizerState {
        self.state
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Encode and write a report. State is only updated once the report was
    /// written and flushed.
    pub fn send_report(
        &mut self,
        x: i64,
        y: i64,
        buttons: u8,
        in_range: bool,
    ) -> Result<(), DigitizerError> {
        let buttons = buttons & BUTTON_MASK;
        let report = create_report(x, y, buttons as u32, in_range)?;

        let result = self
            .sink
            .write_all(&report)
            .and_then(|_| self.sink.flush());
        if let Err(e) = result {
            log::error!("Failed to send HID report: {e}");
            return Err(e.into());
        }

        self.state = DigitizerState {
            x: clamp_coordinate(x),
            y: clamp_coordinate(y),
            buttons,
        };
        log::debug!("Sent HID report: x={x}, y={y}, buttons=0x{buttons:02x}, in_range={in_range}");

        Ok(())
    }

    /// Move the cursor to an absolute position with all buttons up
    pub fn move_to(&mut self, x: u16, y: u16) -> Result<(), DigitizerError> {
        self.send_report(x as i64, y as i64, 0, true)?;
        log::info!("Moved to ({x}, {y})");
        Ok(())
    }

    /// Press and release the given button at the current position. Blocks
    /// for the configured click duration between the two reports.
    pub fn click(&mut self, button: ButtonId) -> Result<(), DigitizerError> {
        let DigitizerState { x, y, .. } = self.state;
        self.send_report(x as i64, y as i64, button_mask(button), true)?;
        log::debug!("Pressed {button} button");

        thread::sleep(self.click_duration);

        let DigitizerState { x, y, .. } = self.state;
        self.send_report(x as i64, y as i64, 0, true)?;
        log::debug!("Released {button} button");

        log::info!("Clicked {button} button at ({x}, {y})");
        Ok(())
    }

    /// Click a button by name. Unknown names are logged and ignored.
    pub fn click_named(&mut self, name: &str) -> Result<(), DigitizerError> {
        let Some(button) = ButtonId::from_name(name) else {
            log::error!("Invalid button: {name}");
            return Ok(());
        };
        self.click(button)
    }

    /// Release all buttons at the current position
    pub fn release(&mut self) -> Result<(), DigitizerError> {
        let DigitizerState { x, y, .. } = self.state;
        self.send_report(x as i64, y as i64, 0, true)?;
        log::info!("Released all buttons");
        Ok(())
    }

    /// Move to the origin with all buttons released
    pub fn reset(&mut self) -> Result<(), DigitizerError> {
        self.send_report(0, 0, 0, true)?;
        log::info!("Reset digitizer to (0, 0)");
        Ok(())
    }
}
