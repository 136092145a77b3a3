use std::error::Error;

use packed_struct::prelude::*;

use crate::drivers::digitizer::{
    hid_report::{create_report, PackedDigitizerReport},
    report_descriptor::{input_report_bits, to_hex_lines, REPORT_DESCRIPTOR},
    REPORT_SIZE,
};

// # Tip Switch: 1 | Barrel Switch: 0 | X:  16384 | Y:   8192 | In Range: 1
// E: 000000.000000 8 01 00 40 00 20 00 00 01
#[tokio::test]
async fn test_digitizer_report() -> Result<(), Box<dyn Error>> {
    let mut report = PackedDigitizerReport::default();
    println!("Before Report: {}", report);
    report.buttons = 0x01;
    report.x = Integer::from_primitive(16384);
    report.y = Integer::from_primitive(8192);

    println!("After Report: {}", report);

    let expected: [u8; 8] = [0x01, 0x00, 0x40, 0x00, 0x20, 0x00, 0x00, 0x01];
    let packed = report.pack()?;
    assert_eq!(expected, packed);

    let created = create_report(16384, 8192, 0x01, true)?;
    assert_eq!(expected, created);

    let unpacked = PackedDigitizerReport::unpack(&created)?;
    assert_eq!(unpacked.get_x(), 16384);
    assert_eq!(unpacked.get_y(), 8192);
    assert!(unpacked.is_in_range());

    Ok(())
}

#[test]
fn test_report_layout() -> Result<(), Box<dyn Error>> {
    let report = create_report(0x1234, 0x7abc, 0x02, false)?;
    assert_eq!(report.len(), REPORT_SIZE);
    assert_eq!(report[0], 0x02);
    assert_eq!(&report[1..=2], &[0x34, 0x12]);
    assert_eq!(&report[3..=4], &[0xbc, 0x7a]);
    assert_eq!(&report[5..=6], &[0x00, 0x00]);
    assert_eq!(report[7], 0x00);

    Ok(())
}

#[test]
fn test_report_clamping() -> Result<(), Box<dyn Error>> {
    for y in [0, 1, 16384, 32767] {
        assert_eq!(create_report(40000, y, 0, true)?, create_report(32767, y, 0, true)?);
        assert_eq!(
            create_report(i64::MAX, y, 0, true)?,
            create_report(32767, y, 0, true)?
        );
        assert_eq!(create_report(-5, y, 0, true)?, create_report(0, y, 0, true)?);
    }
    assert_eq!(
        create_report(100, 99999, 0, true)?,
        create_report(100, 32767, 0, true)?
    );

    // Buttons are truncated to 8 bits
    let report = create_report(0, 0, 0x1ff, true)?;
    assert_eq!(report[0], 0xff);
    let report = create_report(0, 0, 0x301, true)?;
    assert_eq!(report[0], 0x01);

    Ok(())
}

#[test]
fn test_report_descriptor() {
    assert_eq!(input_report_bits(), REPORT_SIZE * 8);
    assert_eq!(REPORT_DESCRIPTOR.first(), Some(&0x05));
    assert_eq!(REPORT_DESCRIPTOR.last(), Some(&0xC0));

    let lines = to_hex_lines();
    assert_eq!(lines.len(), REPORT_DESCRIPTOR.len().div_ceil(16));
    assert!(lines[0].starts_with("05 0d 09 02 a1 01"));
}
