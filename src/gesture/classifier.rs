use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

use crate::{config::ClassifierConfig, input::source::camera::Frame};

use super::{
    event::{ClassifierLabel, ContinuousGesture},
    GestureError,
};

/// Error returned by a [SequenceModel]
#[derive(Error, Debug, Clone, PartialEq)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

/// Black box sequence classifier (e.g. an LSTM over stacked frames)
pub trait SequenceModel: Send {
    /// Turn a camera frame into one sample of the input sequence
    fn preprocess(&mut self, frame: &Frame) -> Result<Vec<f32>, InferenceError>;
    /// Return class probabilities for a full window of samples
    fn predict(&mut self, window: &[Vec<f32>]) -> Result<Vec<f32>, InferenceError>;
}

/// Wraps a [SequenceModel] with a sliding sample window, a confidence
/// threshold and a per-gesture cooldown.
///
/// Every `frame_skip`-th frame contributes a sample. Once the window holds
/// `window_len` samples it is classified, then the oldest half is evicted so
/// the next classification overlaps the previous one. The same physical
/// gesture can therefore be seen by two consecutive cycles; the cooldown is
/// what keeps it from firing twice.
pub struct ContinuousGestureClassifier {
    model: Box<dyn SequenceModel>,
    window: VecDeque<Vec<f32>>,
    window_len: usize,
    frame_skip: u64,
    confidence_threshold: f32,
    cooldown_frames: u32,
    labels: BTreeMap<usize, ContinuousGesture>,
    cooldowns: BTreeMap<ContinuousGesture, u32>,
    frame_counter: u64,
}

impl std::fmt::Debug for ContinuousGestureClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuousGestureClassifier")
            .field("window", &self.window.len())
            .field("window_len", &self.window_len)
            .field("frame_skip", &self.frame_skip)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("cooldowns", &self.cooldowns)
            .finish()
    }
}

impl ContinuousGestureClassifier {
    pub fn new(
        model: Box<dyn SequenceModel>,
        config: &ClassifierConfig,
    ) -> Result<Self, GestureError> {
        if config.window_len == 0 {
            return Err(GestureError::InvalidClassifier(
                "window length must be at least 1".into(),
            ));
        }
        if config.frame_skip == 0 {
            return Err(GestureError::InvalidClassifier(
                "frame skip must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&config.confidence_threshold) {
            return Err(GestureError::InvalidClassifier(format!(
                "confidence threshold {} is outside [0, 1]",
                config.confidence_threshold
            )));
        }

        let cooldowns = config.labels.values().map(|g| (*g, 0)).collect();
        Ok(Self {
            model,
            window: VecDeque::with_capacity(config.window_len),
            window_len: config.window_len,
            frame_skip: config.frame_skip as u64,
            confidence_threshold: config.confidence_threshold,
            cooldown_frames: config.cooldown_frames,
            labels: config.labels.clone(),
            cooldowns,
            frame_counter: 0,
        })
    }

    /// Map a model output index to a label
    pub fn label(&self, class: usize) -> ClassifierLabel {
        match self.labels.get(&class) {
            Some(gesture) => ClassifierLabel::Gesture(*gesture),
            None => ClassifierLabel::Other(class),
        }
    }

    /// Feed one camera frame through the pipeline
    pub fn process_frame(&mut self, frame: &Frame) -> Option<ContinuousGesture> {
        self.frame_counter += 1;
        if self.frame_counter % self.frame_skip == 0 {
            match self.model.preprocess(frame) {
                Ok(sample) => self.push_sample(sample),
                Err(e) => log::debug!("Sequence frame preprocessing failed: {e}"),
            }
        }
        self.classify_window()
    }

    /// Append a preprocessed sample, dropping the oldest if the window is full
    pub fn push_sample(&mut self, sample: Vec<f32>) {
        if self.window.len() == self.window_len {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    /// Classify the window if it is full. On success the oldest half of the
    /// window is evicted. On inference failure the window is kept as is.
    pub fn classify_window(&mut self) -> Option<ContinuousGesture> {
        if self.window.len() < self.window_len {
            return None;
        }

        let samples: Vec<Vec<f32>> = self.window.iter().cloned().collect();
        let probabilities = match self.model.predict(&samples) {
            Ok(probabilities) => probabilities,
            Err(e) => {
                log::debug!("Sequence gesture detection failed: {e}");
                return None;
            }
        };

        let detected = self.classify(&probabilities);

        for _ in 0..self.window_len / 2 {
            self.window.pop_front();
        }

        detected
    }

    /// Run one classification cycle over a probability vector. Cooldowns are
    /// decremented first, then the arg-max class fires if it is a known
    /// gesture, confident enough and not cooling down.
    pub fn classify(&mut self, probabilities: &[f32]) -> Option<ContinuousGesture> {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }

        let (class, confidence) = argmax(probabilities)?;
        log::debug!("Sequence classifier predicted class {class} @ {:.2}%", confidence * 100.0);

        let ClassifierLabel::Gesture(gesture) = self.label(class) else {
            return None;
        };
        if confidence < self.confidence_threshold {
            return None;
        }

        let remaining = self.cooldowns.entry(gesture).or_insert(0);
        if *remaining > 0 {
            log::debug!("Gesture {gesture} in cooldown ({remaining} frames)");
            return None;
        }
        *remaining = self.cooldown_frames;
        log::info!(
            "Continuous gesture detected: {gesture} (confidence: {:.2}%)",
            confidence * 100.0
        );

        Some(gesture)
    }

    pub fn cooldown(&self, gesture: ContinuousGesture) -> u32 {
        self.cooldowns.get(&gesture).copied().unwrap_or(0)
    }

    pub fn cooldowns(&self) -> &BTreeMap<ContinuousGesture, u32> {
        &self.cooldowns
    }

    /// Number of samples currently in the window
    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Clear the window, frame counter and all cooldowns
    pub fn reset(&mut self) {
        self.window.clear();
        self.frame_counter = 0;
        for remaining in self.cooldowns.values_mut() {
            *remaining = 0;
        }
    }
}

/// Index and value of the largest probability, first one on ties
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}
