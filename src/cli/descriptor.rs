use std::{
    error::Error,
    io::{self, Write},
};

use crate::drivers::digitizer::report_descriptor::{to_hex_lines, REPORT_DESCRIPTOR};

/// Print the report descriptor, e.g. to write into the gadget's configfs
/// `report_desc` attribute
pub fn handle_descriptor(binary: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    if binary {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&REPORT_DESCRIPTOR)?;
        stdout.flush()?;
        return Ok(());
    }

    for line in to_hex_lines() {
        println!("{line}");
    }
    Ok(())
}
