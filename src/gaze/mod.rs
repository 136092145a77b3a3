//! Gaze driven cursor control. A calibrated polynomial maps gaze
//! observations from an external gaze model to screen positions.
pub mod calibrator;
pub mod tracker;

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("need at least {required} calibration points, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },
    #[error("calibration point has non-finite values: {0:?}")]
    NonFinite(GazeObservation),
    #[error("calibration has not been performed")]
    NotCalibrated,
    #[error("least squares fit failed: {0}")]
    Solve(String),
    #[error("calibration model expects {expected:?} features, configured for {actual:?}")]
    ModeMismatch {
        expected: FeatureMode,
        actual: FeatureMode,
    },
    #[error("could not access calibration file: {0}")]
    Io(#[from] io::Error),
    #[error("could not (de)serialize calibration model: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Polynomial feature set used for the gaze to screen mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    /// Second degree terms of gaze pitch/yaw and the gaze origin pixel
    #[default]
    OriginAware,
    /// Second degree terms of gaze pitch/yaw only
    GazeOnly,
}

impl FeatureMode {
    /// Number of polynomial terms, which is also the minimum number of
    /// calibration points
    pub fn feature_count(&self) -> usize {
        match self {
            FeatureMode::OriginAware => 15,
            FeatureMode::GazeOnly => 6,
        }
    }

    pub fn features(&self, gaze: [f64; 2], origin: [f64; 2]) -> Vec<f64> {
        let [g0, g1] = gaze;
        match self {
            FeatureMode::OriginAware => {
                let [o0, o1] = origin;
                vec![
                    1.0,
                    g0,
                    g1,
                    o0,
                    o1,
                    g0 * g0,
                    g0 * g1,
                    g0 * o0,
                    g0 * o1,
                    g1 * g1,
                    g1 * o0,
                    g1 * o1,
                    o0 * o0,
                    o0 * o1,
                    o1 * o1,
                ]
            }
            FeatureMode::GazeOnly => vec![1.0, g0, g1, g0 * g0, g0 * g1, g1 * g1],
        }
    }
}

/// One output of the external gaze model
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GazeObservation {
    /// Pitch and yaw of the gaze direction
    pub gaze: [f64; 2],
    /// Pixel position the gaze originates from (between the eyes)
    pub origin: [f64; 2],
}
