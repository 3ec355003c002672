use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One facial landmark in normalized image space (`x`, `y` in [0, 1]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

pub type FaceLandmarks = Vec<Landmark>;

/// Outcome of running the face landmarker on one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Detection {
    Detected(Vec<FaceLandmarks>),
    #[default]
    NotDetected,
}

impl Detection {
    /// An empty face list is reported as `NotDetected`.
    pub fn from_faces(faces: Vec<FaceLandmarks>) -> Self {
        if faces.is_empty() {
            Detection::NotDetected
        } else {
            Detection::Detected(faces)
        }
    }

    pub fn first_face(&self) -> Option<&FaceLandmarks> {
        match self {
            Detection::Detected(faces) => faces.first(),
            Detection::NotDetected => None,
        }
    }
}

/// Raw detector output as emitted by the landmarker (`faceLandmarks`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorOutput {
    #[serde(default)]
    pub face_landmarks: Vec<FaceLandmarks>,
}

impl From<DetectorOutput> for Detection {
    fn from(output: DetectorOutput) -> Self {
        Detection::from_faces(output.face_landmarks)
    }
}

/// The external face/iris landmarker.
///
/// Implementations own frame acquisition; `detect` runs on the most recent
/// video frame. Callers treat an `Err` the same as `NotDetected`.
pub trait LandmarkDetector: Send + Sync {
    fn detect(&self) -> impl Future<Output = Result<Detection>> + Send;
}
