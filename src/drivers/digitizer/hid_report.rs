use packed_struct::prelude::*;

use crate::constants::{MAX_COORDINATE, MIN_COORDINATE};

use super::{DigitizerError, REPORT_SIZE};

// Centered cursor, tip switch down, in range:
// # Tip Switch: 1 | Barrel Switch: 0 | X:  16384 | Y:   8192 | In Range: 1
// E: 000000.000000 8 01 00 40 00 20 00 00 01
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct PackedDigitizerReport {
    #[packed_field(bytes = "0")]
    pub buttons: u8,
    #[packed_field(bytes = "1..=2", endian = "lsb")]
    pub x: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "3..=4", endian = "lsb")]
    pub y: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "5..=6", endian = "lsb")]
    pub reserved: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "7")]
    pub in_range: u8,
}

impl Default for PackedDigitizerReport {
    fn default() -> Self {
        Self {
            buttons: 0,
            x: Integer::from_primitive(0),
            y: Integer::from_primitive(0),
            reserved: Integer::from_primitive(0),
            in_range: 1,
        }
    }
}

impl PackedDigitizerReport {
    pub fn get_x(&self) -> u16 {
        self.x.to_primitive()
    }

    pub fn get_y(&self) -> u16 {
        self.y.to_primitive()
    }

    pub fn is_in_range(&self) -> bool {
        self.in_range != 0
    }
}

/// Clamp a coordinate into digitizer space
pub fn clamp_coordinate(value: i64) -> u16 {
    value.clamp(MIN_COORDINATE as i64, MAX_COORDINATE as i64) as u16
}

/// Build an input report. Out of range values are clamped instead of
/// rejected: coordinates into `[0, 32767]` and buttons into 8 bits.
pub fn create_report(
    x: i64,
    y: i64,
    buttons: u32,
    in_range: bool,
) -> Result<[u8; REPORT_SIZE], DigitizerError> {
    let report = PackedDigitizerReport {
        buttons: (buttons & 0xFF) as u8,
        x: Integer::from_primitive(clamp_coordinate(x)),
        y: Integer::from_primitive(clamp_coordinate(y)),
        reserved: Integer::from_primitive(0),
        in_range: in_range as u8,
    };

    report
        .pack()
        .map_err(|e| DigitizerError::Packing(format!("{e:?}")))
}
