use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Fingers tracked against the thumb tip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
}

impl Finger {
    pub const ALL: [Finger; 3] = [Finger::Index, Finger::Middle, Finger::Ring];

    /// Digitizer button name driven by this finger. The ring finger maps to
    /// a tertiary button the digitizer does not have.
    pub fn button_name(&self) -> &'static str {
        match self {
            Finger::Index => "left",
            Finger::Middle => "right",
            Finger::Ring => "middle",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Finger::Index => 0,
            Finger::Middle => 1,
            Finger::Ring => 2,
        }
    }
}

impl Display for Finger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Finger::Index => "Primary",
            Finger::Middle => "Secondary",
            Finger::Ring => "Tertiary",
        };
        write!(f, "{name}")
    }
}

/// High level gestures recognized over a sequence of frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuousGesture {
    ThumbsUp,
    ThumbsDown,
}

impl Display for ContinuousGesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContinuousGesture::ThumbsUp => write!(f, "ThumbsUp"),
            ContinuousGesture::ThumbsDown => write!(f, "ThumbsDown"),
        }
    }
}

/// Output class of the sequence classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierLabel {
    Gesture(ContinuousGesture),
    Other(usize),
}

/// Discrete event produced by the gesture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Clicked(Finger),
    Released(Finger),
    Continuous(ContinuousGesture),
}

impl Display for GestureEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureEvent::Clicked(finger) => write!(f, "{finger}ButtonClicked"),
            GestureEvent::Released(finger) => write!(f, "{finger}ButtonReleased"),
            GestureEvent::Continuous(gesture) => write!(f, "{gesture}"),
        }
    }
}
