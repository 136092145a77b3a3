/// USB HID report descriptor for a single-contact pen digitizer whose input
/// report is the 8-byte [super::hid_report::PackedDigitizerReport]. Written to
/// the `report_desc` attribute of the USB gadget HID function.
pub const REPORT_DESCRIPTOR: [u8; 61] = [
    0x05, 0x0D, // Usage Page (Digitizers)
    0x09, 0x02, // Usage (Pen)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x20, //   Usage (Stylus)
    0xA1, 0x00, //   Collection (Physical)
    0x09, 0x42, //     Usage (Tip Switch)
    0x09, 0x44, //     Usage (Barrel Switch)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x02, //     Input (Data,Var,Abs)
    0x95, 0x06, //     Report Count (6)
    0x81, 0x03, //     Input (Const,Var,Abs)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x26, 0xFF, 0x7F, // Logical Maximum (32767)
    0x75, 0x10, //     Report Size (16)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x02, //     Input (Data,Var,Abs)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x03, //     Input (Const,Var,Abs)
    0x05, 0x0D, //     Usage Page (Digitizers)
    0x09, 0x32, //     Usage (In Range)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x02, //     Input (Data,Var,Abs)
    0xC0, //           End Collection
    0xC0, //         End Collection
];

/// Format the descriptor as space separated hex, 16 bytes per line
pub fn to_hex_lines() -> Vec<String> {
    REPORT_DESCRIPTOR
        .chunks(16)
        .map(|chunk| {
            chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Total number of input bits declared by the descriptor. Used to check the
/// descriptor against the packed report size.
pub fn input_report_bits() -> usize {
    let mut bits = 0;
    let mut report_size = 0usize;
    let mut report_count = 0usize;
    let mut i = 0;
    while i < REPORT_DESCRIPTOR.len() {
        let prefix = REPORT_DESCRIPTOR[i];
        let len = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = &REPORT_DESCRIPTOR[(i + 1).min(REPORT_DESCRIPTOR.len())
            ..(i + 1 + len).min(REPORT_DESCRIPTOR.len())];
        let value = data
            .iter()
            .rev()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        match prefix & 0xFC {
            0x74 => report_size = value,
            0x94 => report_count = value,
            0x80 => bits += report_size * report_count,
            _ => (),
        }
        i += 1 + len;
    }
    bits
}
