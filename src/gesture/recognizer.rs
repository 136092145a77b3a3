use std::{collections::BTreeMap, error::Error};

use thiserror::Error;
use tokio::sync::broadcast;

use crate::{
    config::GestureConfig,
    input::{
        source::camera::{Frame, FrameProcessor},
        target::client::{ClientError, DigitizerClient},
    },
    protocol::ButtonId,
};

use super::{
    classifier::{ContinuousGestureClassifier, SequenceModel},
    detector::GestureEventDetector,
    event::{ContinuousGesture, Finger, GestureEvent},
    landmarks::HandLandmarks,
    GestureError,
};

const EVENT_BUFFER_SIZE: usize = 64;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("hand landmark detection failed: {0}")]
    Landmarks(Box<dyn Error + Send + Sync>),
    #[error("failed to drive digitizer: {0}")]
    Device(#[from] ClientError),
}

/// External hand landmark model. Returns the landmarks of at most one hand.
pub trait HandLandmarkSource: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Option<HandLandmarks>, Box<dyn Error + Send + Sync>>;
}

/// Snapshot of the recognizer state
#[derive(Debug, Clone, PartialEq)]
pub struct GestureStatistics {
    pub frame_count: u64,
    pub touch_threshold: f64,
    pub release_threshold: f64,
    pub pressed: Vec<Finger>,
    pub cooldowns: BTreeMap<ContinuousGesture, u32>,
}

/// Frame processor that runs the gesture pipeline on the capture thread and
/// drives the digitizer with the resulting events.
pub struct GestureRecognizer {
    landmarks: Box<dyn HandLandmarkSource>,
    detector: GestureEventDetector,
    classifier: Option<ContinuousGestureClassifier>,
    digitizer: DigitizerClient,
    events: broadcast::Sender<GestureEvent>,
    frame_count: u64,
}

impl std::fmt::Debug for GestureRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureRecognizer")
            .field("detector", &self.detector)
            .field("classifier", &self.classifier)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

impl GestureRecognizer {
    pub fn new(
        landmarks: Box<dyn HandLandmarkSource>,
        detector: GestureEventDetector,
        classifier: Option<ContinuousGestureClassifier>,
        digitizer: DigitizerClient,
    ) -> Self {
        if classifier.is_none() {
            log::info!("Continuous gesture classification disabled");
        }
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            landmarks,
            detector,
            classifier,
            digitizer,
            events,
            frame_count: 0,
        }
    }

    /// Build a recognizer from the gesture configuration. Continuous gestures
    /// are only classified when both a classifier section and a model exist.
    pub fn from_config(
        landmarks: Box<dyn HandLandmarkSource>,
        model: Option<Box<dyn SequenceModel>>,
        config: &GestureConfig,
        digitizer: DigitizerClient,
    ) -> Result<Self, GestureError> {
        let detector = GestureEventDetector::new(config.touch_threshold, config.release_threshold)?;
        let classifier = match (model, config.classifier.as_ref()) {
            (Some(model), Some(classifier)) => {
                Some(ContinuousGestureClassifier::new(model, classifier)?)
            }
            (None, Some(_)) => {
                log::warn!("Continuous gestures configured but no sequence model was provided");
                None
            }
            (_, None) => None,
        };
        Ok(Self::new(landmarks, detector, classifier, digitizer))
    }

    /// Receive every event the recognizer emits
    pub fn subscribe(&self) -> broadcast::Receiver<GestureEvent> {
        self.events.subscribe()
    }

    /// Run one frame through landmark detection, the touch detector and the
    /// sequence classifier, then act on the events.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<Vec<GestureEvent>, RecognizerError> {
        self.frame_count += 1;

        let hand = self
            .landmarks
            .detect(frame)
            .map_err(RecognizerError::Landmarks)?;
        let mut events = self.detector.process(hand.as_ref());

        if let Some(classifier) = self.classifier.as_mut() {
            if let Some(gesture) = classifier.process_frame(frame) {
                events.push(GestureEvent::Continuous(gesture));
            }
        }

        // Every event reaches the digitizer even if an earlier one failed
        let mut first_error = None;
        for event in events.iter() {
            if self.events.send(*event).is_err() {
                log::trace!("No subscribers for gesture event {event}");
            }
            if let Err(e) = self.handle_event(*event) {
                log::error!("Failed to handle {event}: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(events),
        }
    }

    fn handle_event(&self, event: GestureEvent) -> Result<(), ClientError> {
        match event {
            GestureEvent::Clicked(finger) => {
                log::info!("{event}");
                self.digitizer.blocking_click_named(finger.button_name())
            }
            GestureEvent::Released(finger) => {
                if ButtonId::from_name(finger.button_name()).is_none() {
                    log::debug!("{event} has no digitizer button, ignoring");
                    return Ok(());
                }
                log::info!("{event}");
                self.digitizer.blocking_release()
            }
            GestureEvent::Continuous(gesture) => {
                log::info!("Continuous gesture: {gesture}");
                Ok(())
            }
        }
    }

    /// Clear touch state, the classifier window, cooldowns and the frame count
    pub fn reset(&mut self) {
        self.detector.reset();
        if let Some(classifier) = self.classifier.as_mut() {
            classifier.reset();
        }
        self.frame_count = 0;
        log::debug!("Gesture recognizer reset");
    }

    pub fn statistics(&self) -> GestureStatistics {
        GestureStatistics {
            frame_count: self.frame_count,
            touch_threshold: self.detector.touch_threshold(),
            release_threshold: self.detector.release_threshold(),
            pressed: Finger::ALL
                .into_iter()
                .filter(|finger| self.detector.is_pressed(*finger))
                .collect(),
            cooldowns: self
                .classifier
                .as_ref()
                .map(|classifier| classifier.cooldowns().clone())
                .unwrap_or_default(),
        }
    }
}

impl FrameProcessor for GestureRecognizer {
    fn name(&self) -> &str {
        "gesture"
    }

    fn process(&mut self, frame: &Frame) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.process_frame(frame)?;
        Ok(())
    }
}
