/// Version of the ASCII command protocol spoken over the serial link
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Minimum value of a digitizer axis
pub const MIN_COORDINATE: u16 = 0;
/// Maximum value of a digitizer axis (USB HID Digitizer logical maximum)
pub const MAX_COORDINATE: u16 = 32767;

/// Serial link settings (8N1)
pub const SERIAL_BAUDRATE: u32 = 115_200;
pub const SERIAL_TERMINATOR: char = '\n';
/// Longest line accepted on the serial link, terminator excluded
pub const MAX_LINE_LENGTH: usize = 1024;

/// Default device nodes on the USB gadget
pub const DEFAULT_HID_DEVICE: &str = "/dev/hidg0";
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyGS0";

/// Read timeout on the serial link in milliseconds
pub const DEFAULT_SERIAL_TIMEOUT_MS: u64 = 1000;
/// How long a button is held down during a click in milliseconds
pub const DEFAULT_CLICK_DURATION_MS: u64 = 50;
/// How long to wait for a worker thread to exit when stopping, in milliseconds
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2000;
