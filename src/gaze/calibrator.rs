use std::{fs::File, path::Path};

use nalgebra::{DMatrix, DVector, SVD};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_COORDINATE;

use super::{CalibrationError, FeatureMode, GazeObservation};

/// Iteration limit for the least squares decomposition
const SVD_MAX_ITERATIONS: usize = 1000;

/// Observed features and the screen point the user was looking at
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSample {
    pub features: Vec<f64>,
    pub target: (f64, f64),
}

/// Fitted coefficients for screen X and Y
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CalibrationModel {
    pub mode: FeatureMode,
    pub coeff_x: Vec<f64>,
    pub coeff_y: Vec<f64>,
}

impl CalibrationModel {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let file = File::open(path)?;
        let model: CalibrationModel = serde_yaml::from_reader(file)?;
        let expected = model.mode.feature_count();
        if model.coeff_x.len() != expected || model.coeff_y.len() != expected {
            return Err(CalibrationError::Solve(format!(
                "expected {expected} coefficients per axis, got {} and {}",
                model.coeff_x.len(),
                model.coeff_y.len()
            )));
        }
        Ok(model)
    }

    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CalibrationError> {
        let file = File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> (f64, f64) {
        (dot(features, &self.coeff_x), dot(features, &self.coeff_y))
    }
}

/// Fits a second degree polynomial from gaze features to screen coordinates
/// with ordinary least squares, independently for X and Y.
#[derive(Debug, Clone)]
pub struct GazeCalibrator {
    mode: FeatureMode,
    samples: Vec<CalibrationSample>,
    model: Option<CalibrationModel>,
}

impl GazeCalibrator {
    pub fn new(mode: FeatureMode) -> Self {
        Self {
            mode,
            samples: Vec::new(),
            model: None,
        }
    }

    pub fn mode(&self) -> FeatureMode {
        self.mode
    }

    /// Minimum number of samples [GazeCalibrator::calibrate] needs
    pub fn required_samples(&self) -> usize {
        self.mode.feature_count()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    pub fn is_calibrated(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&CalibrationModel> {
        self.model.as_ref()
    }

    /// Use a previously fitted model
    pub fn set_model(&mut self, model: CalibrationModel) -> Result<(), CalibrationError> {
        if model.mode != self.mode {
            return Err(CalibrationError::ModeMismatch {
                expected: model.mode,
                actual: self.mode,
            });
        }
        self.model = Some(model);
        Ok(())
    }

    /// Record that the user looked at `screen_point` while the gaze model
    /// reported `observation`. Points with non-finite values are rejected.
    pub fn add_calibration_point(
        &mut self,
        observation: GazeObservation,
        screen_point: (f64, f64),
    ) -> Result<(), CalibrationError> {
        let features = self.mode.features(observation.gaze, observation.origin);
        let finite = features.iter().all(|f| f.is_finite())
            && screen_point.0.is_finite()
            && screen_point.1.is_finite();
        if !finite {
            log::warn!("Rejected calibration point {observation:?} at {screen_point:?}");
            return Err(CalibrationError::NonFinite(observation));
        }
        log::debug!(
            "Added calibration point: gaze={:?}, origin={:?}, screen={screen_point:?}",
            observation.gaze,
            observation.origin
        );
        self.samples.push(CalibrationSample {
            features,
            target: screen_point,
        });
        Ok(())
    }

    /// Fit the model to the collected samples. Fails without touching the
    /// current model if there are too few samples.
    pub fn calibrate(&mut self) -> Result<&CalibrationModel, CalibrationError> {
        let required = self.required_samples();
        let actual = self.samples.len();
        if actual < required {
            return Err(CalibrationError::InsufficientSamples { required, actual });
        }

        let columns = self.mode.feature_count();
        let rows: Vec<f64> = self
            .samples
            .iter()
            .flat_map(|sample| sample.features.iter().copied())
            .collect();
        let features = DMatrix::from_row_slice(actual, columns, &rows);
        let screen_x = DVector::from_iterator(actual, self.samples.iter().map(|s| s.target.0));
        let screen_y = DVector::from_iterator(actual, self.samples.iter().map(|s| s.target.1));

        let svd = SVD::try_new(features, true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or_else(|| CalibrationError::Solve("decomposition did not converge".into()))?;
        // Singular values below this are treated as zero (minimum norm solution)
        let eps = svd.singular_values.max() * actual.max(columns) as f64 * f64::EPSILON;
        let coeff_x = svd
            .solve(&screen_x, eps)
            .map_err(|e| CalibrationError::Solve(e.to_string()))?;
        let coeff_y = svd
            .solve(&screen_y, eps)
            .map_err(|e| CalibrationError::Solve(e.to_string()))?;

        log::info!("Calibration complete using {actual} points");
        let model = self.model.insert(CalibrationModel {
            mode: self.mode,
            coeff_x: coeff_x.iter().copied().collect(),
            coeff_y: coeff_y.iter().copied().collect(),
        });
        Ok(&*model)
    }

    /// Map a gaze observation to screen coordinates
    pub fn predict_screen_position(
        &self,
        observation: GazeObservation,
    ) -> Result<(f64, f64), CalibrationError> {
        let model = self.model.as_ref().ok_or(CalibrationError::NotCalibrated)?;
        let features = self.mode.features(observation.gaze, observation.origin);
        Ok(model.predict(&features))
    }

    /// Discard all samples and the fitted model
    pub fn clear_calibration(&mut self) {
        self.samples.clear();
        self.model = None;
        log::info!("Calibration cleared");
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

/// Screen points for a 5x5 calibration grid at 10, 30, 50, 70 and 90 percent
/// of the screen, row by row
pub fn calibration_grid(width: u32, height: u32) -> Vec<(f64, f64)> {
    const STEPS: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
    STEPS
        .iter()
        .flat_map(|fy| {
            STEPS
                .iter()
                .map(move |fx| (fx * width as f64, fy * height as f64))
        })
        .collect()
}

/// Scale a screen position into digitizer space, clamping points that fall
/// outside the screen
pub fn screen_to_digitizer(point: (f64, f64), width: u32, height: u32) -> (u16, u16) {
    let scale = |value: f64, size: u32| -> u16 {
        if size == 0 || value.is_nan() {
            return 0;
        }
        let scaled = (value / size as f64 * MAX_COORDINATE as f64).round();
        scaled.clamp(0.0, MAX_COORDINATE as f64) as u16
    };
    (scale(point.0, width), scale(point.1, height))
}
