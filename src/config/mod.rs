pub mod path;


use std::{collections::BTreeMap, io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::{
        DEFAULT_CLICK_DURATION_MS, DEFAULT_HID_DEVICE, DEFAULT_JOIN_TIMEOUT_MS,
        DEFAULT_SERIAL_DEVICE, DEFAULT_SERIAL_TIMEOUT_MS, SERIAL_BAUDRATE,
    },
    gaze::FeatureMode,
    gesture::{
        detector::{DEFAULT_RELEASE_THRESHOLD, DEFAULT_TOUCH_THRESHOLD},
        event::ContinuousGesture,
    },
};

/// Represents all possible errors loading a [DigitizerConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top level daemon configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct DigitizerConfig {
    /// Raw HID gadget device the reports are written to
    pub hid_device: String,
    /// How long a button is held during a click
    pub click_duration_ms: u64,
    pub serial: SerialConfig,
    pub gesture: GestureConfig,
    pub gaze: GazeConfig,
}

impl Default for DigitizerConfig {
    fn default() -> Self {
        Self {
            hid_device: DEFAULT_HID_DEVICE.to_string(),
            click_duration_ms: DEFAULT_CLICK_DURATION_MS,
            serial: SerialConfig::default(),
            gesture: GestureConfig::default(),
            gaze: GazeConfig::default(),
        }
    }
}

impl DigitizerConfig {
    /// Load a [DigitizerConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<DigitizerConfig, LoadError> {
        let config: DigitizerConfig = serde_yaml::from_str(content.as_str())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a [DigitizerConfig] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<DigitizerConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: DigitizerConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the first configuration found in the config search paths. An
    /// explicitly given path must exist. Falls back to the built-in defaults
    /// when no config file is installed.
    pub fn load(explicit: Option<&Path>) -> Result<DigitizerConfig, LoadError> {
        if let Some(path) = explicit {
            log::info!("Loading config from {path:?}");
            return Self::from_yaml_file(path);
        }

        for path in path::get_config_paths() {
            if !path.is_file() {
                log::trace!("No config at {path:?}");
                continue;
            }
            log::info!("Loading config from {path:?}");
            return Self::from_yaml_file(path);
        }

        log::info!("No config file found, using defaults");
        Ok(DigitizerConfig::default())
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<(), LoadError> {
        self.gesture.validate()?;
        self.gaze.validate()
    }

    pub fn click_duration(&self) -> Duration {
        Duration::from_millis(self.click_duration_ms)
    }
}

/// Serial link settings. Framing is always 8N1.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_SERIAL_DEVICE.to_string(),
            baud_rate: SERIAL_BAUDRATE,
            timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Camera driven gesture recognition settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct GestureConfig {
    pub enabled: bool,
    pub touch_threshold: f64,
    pub release_threshold: f64,
    pub fps: f64,
    pub join_timeout_ms: u64,
    /// Continuous gesture classification is disabled when absent
    pub classifier: Option<ClassifierConfig>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            touch_threshold: DEFAULT_TOUCH_THRESHOLD,
            release_threshold: DEFAULT_RELEASE_THRESHOLD,
            fps: 30.0,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            classifier: None,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.touch_threshold.is_nan()
            || self.release_threshold.is_nan()
            || self.touch_threshold >= self.release_threshold
        {
            return Err(LoadError::Invalid(format!(
                "touch threshold {} must be below release threshold {}",
                self.touch_threshold, self.release_threshold
            )));
        }
        let interval = Duration::try_from_secs_f64(1.0 / self.fps);
        if self.fps.is_nan() || self.fps <= 0.0 || interval.is_err() {
            return Err(LoadError::Invalid(format!(
                "fps must be positive with a representable frame interval, got {}",
                self.fps
            )));
        }
        if let Some(classifier) = self.classifier.as_ref() {
            classifier.validate()?;
        }
        Ok(())
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Sliding window classifier settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct ClassifierConfig {
    /// Number of samples per classification
    pub window_len: usize,
    /// Only every n-th frame contributes a sample
    pub frame_skip: u32,
    pub confidence_threshold: f32,
    /// Classification cycles a gesture stays suppressed after firing
    pub cooldown_frames: u32,
    /// Model output index to gesture. Unlisted indices never fire.
    pub labels: BTreeMap<usize, ContinuousGesture>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_len: 10,
            frame_skip: 3,
            confidence_threshold: 0.85,
            cooldown_frames: 20,
            labels: BTreeMap::from([
                (3, ContinuousGesture::ThumbsDown),
                (4, ContinuousGesture::ThumbsUp),
            ]),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.window_len == 0 {
            return Err(LoadError::Invalid("window_len must be at least 1".into()));
        }
        if self.frame_skip == 0 {
            return Err(LoadError::Invalid("frame_skip must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(LoadError::Invalid(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Gaze driven cursor settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct GazeConfig {
    pub enabled: bool,
    pub feature_mode: FeatureMode,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Saved calibration model to load at startup
    pub calibration_file: Option<String>,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            feature_mode: FeatureMode::default(),
            screen_width: 1920,
            screen_height: 1080,
            calibration_file: None,
        }
    }
}

impl GazeConfig {
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(LoadError::Invalid(format!(
                "screen size {}x{} must be non-zero",
                self.screen_width, self.screen_height
            )));
        }
        Ok(())
    }
}
