use super::{event::Finger, GestureError};

// Hand landmark indices as produced by 21-point hand landmark models
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;

pub const LANDMARK_COUNT: usize = 21;

/// A single landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the image plane. Depth is ignored.
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Landmarks of one detected hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: Vec<Landmark>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Landmark>) -> Result<Self, GestureError> {
        if points.len() != LANDMARK_COUNT {
            return Err(GestureError::InvalidLandmarks {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn thumb_tip(&self) -> &Landmark {
        &self.points[THUMB_TIP]
    }

    /// Landmark index of the given finger's tip
    pub fn tip_index(finger: Finger) -> usize {
        match finger {
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
        }
    }

    pub fn finger_tip(&self, finger: Finger) -> &Landmark {
        &self.points[Self::tip_index(finger)]
    }

    /// Distance between the thumb tip and the given finger tip
    pub fn touch_distance(&self, finger: Finger) -> f64 {
        self.thumb_tip().distance_2d(self.finger_tip(finger))
    }

    /// Touch distances for every tracked finger, in [Finger::ALL] order
    pub fn touch_distances(&self) -> [f64; 3] {
        Finger::ALL.map(|finger| self.touch_distance(finger))
    }
}
