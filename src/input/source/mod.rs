pub mod camera;
#[cfg(test)]
pub mod camera_test;
pub mod serial;
#[cfg(test)]
pub mod serial_test;
