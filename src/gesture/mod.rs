//! Hand gesture recognition. Landmark positions from an external hand
//! landmark model are turned into discrete click/release events, and an
//! optional sequence classifier adds continuous gestures on top.
pub mod classifier;
pub mod detector;
#[cfg(test)]
pub mod detector_test;
pub mod event;
pub mod landmarks;
pub mod recognizer;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GestureError {
    #[error("touch threshold {touch} must be less than release threshold {release}")]
    InvalidThresholds { touch: f64, release: f64 },
    #[error("expected {expected} hand landmarks, got {actual}")]
    InvalidLandmarks { expected: usize, actual: usize },
    #[error("invalid classifier configuration: {0}")]
    InvalidClassifier(String),
}
