use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::TimeSeriesPoint;
use crate::db::GazeSample;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RecorderStatus {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// Everything captured between `start` and `stop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub samples: Vec<GazeSample>,
}

impl Session {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn points(&self) -> Vec<TimeSeriesPoint> {
        self.samples.iter().map(GazeSample::point).collect()
    }

    pub fn export_json(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write session to {}", path.display()))
    }
}
