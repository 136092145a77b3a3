//! Touchless pointer control for USB gadget HID digitizers.
//!
//! Pointer commands arrive over a serial link ([protocol]) or from a camera
//! driven gesture ([gesture]) and gaze ([gaze]) pipeline. Both are turned
//! into USB HID digitizer reports by a single device actor
//! ([input::target::digitizer::DigitizerDevice]).
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod drivers;
pub mod gaze;
pub mod gesture;
pub mod input;
pub mod protocol;
pub mod sync;
