use super::{
    event::{Finger, GestureEvent},
    landmarks::HandLandmarks,
    GestureError,
};

/// Default distance below which a finger counts as touching the thumb
pub const DEFAULT_TOUCH_THRESHOLD: f64 = 0.06;
/// Default distance above which a touching finger counts as released
pub const DEFAULT_RELEASE_THRESHOLD: f64 = 0.10;

/// Turns per-frame thumb to finger distances into click and release events.
///
/// Each finger has its own hysteresis: it becomes pressed once its distance
/// drops below the touch threshold and is released once the distance rises
/// above the release threshold. Distances in between keep the previous state.
/// Events are only emitted on transitions.
#[derive(Debug, Clone)]
pub struct GestureEventDetector {
    touch_threshold: f64,
    release_threshold: f64,
    pressed: [bool; 3],
}

impl Default for GestureEventDetector {
    fn default() -> Self {
        Self {
            touch_threshold: DEFAULT_TOUCH_THRESHOLD,
            release_threshold: DEFAULT_RELEASE_THRESHOLD,
            pressed: [false; 3],
        }
    }
}

impl GestureEventDetector {
    pub fn new(touch_threshold: f64, release_threshold: f64) -> Result<Self, GestureError> {
        if touch_threshold.is_nan()
            || release_threshold.is_nan()
            || touch_threshold >= release_threshold
        {
            return Err(GestureError::InvalidThresholds {
                touch: touch_threshold,
                release: release_threshold,
            });
        }
        Ok(Self {
            touch_threshold,
            release_threshold,
            pressed: [false; 3],
        })
    }

    pub fn touch_threshold(&self) -> f64 {
        self.touch_threshold
    }

    pub fn release_threshold(&self) -> f64 {
        self.release_threshold
    }

    pub fn is_pressed(&self, finger: Finger) -> bool {
        self.pressed[finger.index()]
    }

    /// Process the landmarks of one frame. `None` means no hand was seen.
    pub fn process(&mut self, hand: Option<&HandLandmarks>) -> Vec<GestureEvent> {
        self.process_distances(hand.map(|hand| hand.touch_distances()))
    }

    /// Process one frame of touch distances in [Finger::ALL] order. When no
    /// hand was seen every pressed finger is released.
    pub fn process_distances(&mut self, distances: Option<[f64; 3]>) -> Vec<GestureEvent> {
        let Some(distances) = distances else {
            return self.release_all();
        };

        Finger::ALL
            .iter()
            .zip(distances)
            .filter_map(|(finger, distance)| self.update_finger(*finger, distance))
            .collect()
    }

    /// Apply the hysteresis rule to a single finger
    pub fn update_finger(&mut self, finger: Finger, distance: f64) -> Option<GestureEvent> {
        let pressed = &mut self.pressed[finger.index()];
        if !*pressed && distance < self.touch_threshold {
            *pressed = true;
            log::debug!("{finger} button clicked (distance: {distance:.4})");
            return Some(GestureEvent::Clicked(finger));
        }
        if *pressed && distance > self.release_threshold {
            *pressed = false;
            log::debug!("{finger} button released (distance: {distance:.4})");
            return Some(GestureEvent::Released(finger));
        }
        None
    }

    /// Release every pressed finger, in [Finger::ALL] order
    pub fn release_all(&mut self) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        for finger in Finger::ALL {
            if self.pressed[finger.index()] {
                self.pressed[finger.index()] = false;
                events.push(GestureEvent::Released(finger));
            }
        }
        events
    }

    /// Forget all touch state without emitting events
    pub fn reset(&mut self) {
        self.pressed = [false; 3];
    }
}
