use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use crate::gaze::{device_label, normalizer::DEFAULT_FPS_WINDOW};
use crate::recorder::state::DEFAULT_LIVE_BUFFER;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_DB_FILE: &str = "gaze-pipeline.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub database_path: PathBuf,
    /// Sampling tick period; 33 ms is roughly 30 Hz.
    pub sample_interval_ms: u64,
    pub sync_interval_ms: u64,
    /// Number of inter-frame durations averaged for the FPS estimate.
    pub fps_window: usize,
    /// Points kept for the live gaze view.
    pub live_buffer_size: usize,
    pub detector_timeout_ms: u64,
    pub upload_timeout_ms: u64,
    /// |velocity| in units/s above which a sample is flagged.
    pub velocity_anomaly_threshold: f64,
    pub device_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            database_path: PathBuf::from(DEFAULT_DB_FILE),
            sample_interval_ms: 33,
            sync_interval_ms: 1000,
            fps_window: DEFAULT_FPS_WINDOW,
            live_buffer_size: DEFAULT_LIVE_BUFFER,
            detector_timeout_ms: 1000,
            upload_timeout_ms: 10_000,
            velocity_anomaly_threshold: 1000.0,
            device_label: device_label(),
        }
    }
}

impl Settings {
    /// Defaults rooted in `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join(DEFAULT_DB_FILE),
            ..Self::default()
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms.max(1))
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_timeout_ms.max(1))
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms.max(1))
    }

    /// Applies `GAZE_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GAZE_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(path) = lookup("GAZE_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(label) = lookup("GAZE_DEVICE_LABEL") {
            self.device_label = label;
        }
        if let Some(raw) = lookup("GAZE_SAMPLE_INTERVAL_MS") {
            self.sample_interval_ms = parse_ms("GAZE_SAMPLE_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("GAZE_SYNC_INTERVAL_MS") {
            self.sync_interval_ms = parse_ms("GAZE_SYNC_INTERVAL_MS", &raw)?;
        }
        Ok(())
    }
}

fn parse_ms(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|err| anyhow!("{key} must be a whole number of milliseconds, got '{raw}': {err}"))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    /// Loads `path`, falling back to `defaults` when the file is missing or unreadable.
    pub fn new(path: PathBuf, defaults: Settings) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings file {}: {err}", path.display());
                defaults
            })
        } else {
            defaults
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Settings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
