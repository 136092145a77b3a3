use std::{error::Error, path::Path};

use thiserror::Error;

use crate::{
    config::GazeConfig,
    input::{
        source::camera::{Frame, FrameProcessor},
        target::client::{ClientError, DigitizerClient},
    },
};

use super::{
    calibrator::{screen_to_digitizer, CalibrationModel, GazeCalibrator},
    CalibrationError, GazeObservation,
};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("gaze estimation failed: {0}")]
    Gaze(Box<dyn Error + Send + Sync>),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("failed to move cursor: {0}")]
    Device(#[from] ClientError),
}

/// External gaze model. Returns nothing when no face is visible.
pub trait GazeSource: Send {
    fn estimate(&mut self, frame: &Frame)
        -> Result<Option<GazeObservation>, Box<dyn Error + Send + Sync>>;
}

/// Frame processor that moves the cursor to where the user is looking
pub struct GazeTracker {
    source: Box<dyn GazeSource>,
    calibrator: GazeCalibrator,
    digitizer: DigitizerClient,
    screen_width: u32,
    screen_height: u32,
    last_observation: Option<GazeObservation>,
    last_position: Option<(u16, u16)>,
}

impl std::fmt::Debug for GazeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GazeTracker")
            .field("calibrator", &self.calibrator)
            .field("screen_width", &self.screen_width)
            .field("screen_height", &self.screen_height)
            .field("last_position", &self.last_position)
            .finish()
    }
}

impl GazeTracker {
    pub fn new(
        source: Box<dyn GazeSource>,
        calibrator: GazeCalibrator,
        digitizer: DigitizerClient,
        screen_width: u32,
        screen_height: u32,
    ) -> Self {
        Self {
            source,
            calibrator,
            digitizer,
            screen_width,
            screen_height,
            last_observation: None,
            last_position: None,
        }
    }

    /// Build a tracker from the gaze configuration. A saved calibration is
    /// loaded when `calibration_file` is set and exists.
    pub fn from_config(
        source: Box<dyn GazeSource>,
        config: &GazeConfig,
        digitizer: DigitizerClient,
    ) -> Result<Self, CalibrationError> {
        let mut calibrator = GazeCalibrator::new(config.feature_mode);
        match config.calibration_file.as_deref() {
            Some(path) if Path::new(path).exists() => {
                calibrator.set_model(CalibrationModel::from_yaml_file(path)?)?;
                log::info!("Loaded gaze calibration from {path}");
            }
            Some(path) => log::info!("No gaze calibration at {path}, calibration required"),
            None => log::debug!("No gaze calibration file configured"),
        }
        Ok(Self::new(
            source,
            calibrator,
            digitizer,
            config.screen_width,
            config.screen_height,
        ))
    }

    pub fn calibrator(&self) -> &GazeCalibrator {
        &self.calibrator
    }

    pub fn calibrator_mut(&mut self) -> &mut GazeCalibrator {
        &mut self.calibrator
    }

    pub fn last_observation(&self) -> Option<GazeObservation> {
        self.last_observation
    }

    /// Pair the most recent gaze observation with the screen point the user
    /// was asked to look at. Returns false if no face has been seen yet.
    pub fn record_calibration_point(
        &mut self,
        screen_point: (f64, f64),
    ) -> Result<bool, CalibrationError> {
        let Some(observation) = self.last_observation else {
            log::warn!("No gaze observation available for calibration point {screen_point:?}");
            return Ok(false);
        };
        self.calibrator.add_calibration_point(observation, screen_point)?;
        Ok(true)
    }

    /// Estimate gaze for one frame and move the cursor if calibrated. Returns
    /// the digitizer position the cursor was moved to.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<Option<(u16, u16)>, TrackerError> {
        let Some(observation) = self.source.estimate(frame).map_err(TrackerError::Gaze)? else {
            return Ok(None);
        };
        self.last_observation = Some(observation);

        if !self.calibrator.is_calibrated() {
            return Ok(None);
        }
        let point = self.calibrator.predict_screen_position(observation)?;
        let position = screen_to_digitizer(point, self.screen_width, self.screen_height);
        if self.last_position == Some(position) {
            return Ok(Some(position));
        }

        log::trace!("Gaze at screen {point:?}, moving to {position:?}");
        self.digitizer.blocking_move_to(position.0, position.1)?;
        self.last_position = Some(position);
        Ok(Some(position))
    }
}

impl FrameProcessor for GazeTracker {
    fn name(&self) -> &str {
        "gaze"
    }

    fn process(&mut self, frame: &Frame) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.process_frame(frame)?;
        Ok(())
    }
}
