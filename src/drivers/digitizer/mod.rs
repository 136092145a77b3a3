pub mod driver;
pub mod hid_report;
#[cfg(test)]
pub mod hid_report_test;
pub mod report_descriptor;

use std::io;

use thiserror::Error;

/// Size of a single input report in bytes
pub const REPORT_SIZE: usize = 8;

/// Tip switch (primary/left) button bit
pub const BUTTON_TIP_SWITCH: u8 = 0x01;
/// Barrel switch (secondary/right) button bit
pub const BUTTON_BARREL: u8 = 0x02;
/// All bits with a meaning in the report descriptor
pub const BUTTON_MASK: u8 = BUTTON_TIP_SWITCH | BUTTON_BARREL;

/// Errors from the HID digitizer device
#[derive(Error, Debug)]
pub enum DigitizerError {
    #[error("hid device i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to pack hid report: {0}")]
    Packing(String),
}

/// Last report successfully written to the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigitizerState {
    pub x: u16,
    pub y: u16,
    pub buttons: u8,
}
