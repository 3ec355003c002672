use std::{collections::VecDeque, fs, path::Path};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use super::detector::{Detection, DetectorOutput, LandmarkDetector};

/// Serves pre-recorded detector output, one frame per `detect` call.
///
/// The source is JSON lines, one `{"faceLandmarks": [[{x,y,z}, ...]]}` object
/// per frame. Blank lines are skipped. Once drained it reports `NotDetected`.
pub struct ReplayDetector {
    frames: Mutex<VecDeque<Detection>>,
}

impl ReplayDetector {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file {}", path.display()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut frames = VecDeque::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let output: DetectorOutput = serde_json::from_str(line)
                .with_context(|| format!("invalid detector frame on line {}", line_no + 1))?;
            frames.push_back(Detection::from(output));
        }
        Ok(Self {
            frames: Mutex::new(frames),
        })
    }

    pub fn from_detections(detections: impl IntoIterator<Item = Detection>) -> Self {
        Self {
            frames: Mutex::new(detections.into_iter().collect()),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.frames.lock().await.len()
    }
}

impl LandmarkDetector for ReplayDetector {
    async fn detect(&self) -> Result<Detection> {
        Ok(self.frames.lock().await.pop_front().unwrap_or_default())
    }
}
