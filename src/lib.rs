pub mod analysis;
pub mod calibration;
pub mod db;
pub mod gaze;
pub mod models;
pub mod recorder;
pub mod remote;
pub mod sampling;
pub mod settings;
pub mod store;
pub mod sync;
pub mod tasks;
pub mod utils;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Subcommand;
use log::info;
use serde::Serialize;
use tokio::sync::Mutex;

use analysis::{analyze, generate_dummy_series, series_between, AnalysisReport};
use calibration::CalibrationStateMachine;
use db::Database;
use gaze::{capture_calibration_point, ReplayDetector};
use models::Session;
use recorder::SampleRecorder;
use remote::RemoteClient;
use sampling::{GazeTracker, SamplingController};
use settings::{Settings, SettingsStore};
use sync::{NetworkProbe, SyncController, SyncEngine};

const SETTINGS_FILE: &str = "settings.json";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const DEMO_POINTS: usize = 512;

pub type LocalSync = SyncController<Database, RemoteClient, NetworkProbe>;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload buffered measurements every sync interval until Ctrl-C
    Sync,
    /// List session ids known to the backend
    Sessions,
    /// Download a session and print its analysis report
    Analyze {
        session_id: String,
        /// Start of the spectrum window (ms since epoch)
        #[arg(long)]
        from_ms: Option<i64>,
        /// End of the spectrum window (ms since epoch)
        #[arg(long)]
        to_ms: Option<i64>,
    },
    /// Analyze generated data
    Demo {
        #[arg(long, default_value_t = DEMO_POINTS)]
        points: usize,
    },
    /// Calibrate from and record a JSON-lines detector capture, then sync it
    Replay {
        file: PathBuf,
        /// Write the recorded session to this JSON file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

/// Settings, the local buffer and the backend client for one process.
pub struct Pipeline {
    settings: Settings,
    db: Database,
    remote: RemoteClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub session_id: String,
    pub samples: usize,
    pub report: AnalysisReport,
}

impl Pipeline {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let store = SettingsStore::new(data_dir.join(SETTINGS_FILE), Settings::in_dir(data_dir))?;
        if !store.path().exists() {
            store.update(store.snapshot())?;
        }
        let mut settings = store.snapshot();
        settings.apply_env()?;

        let db = Database::new(settings.database_path.clone())?;
        let remote = RemoteClient::new(&settings.backend_url, settings.upload_timeout())?;
        info!(
            "Pipeline ready (store {}, backend {})",
            db.path().display(),
            remote.base_url()
        );

        Ok(Self { settings, db, remote })
    }

    /// Effective settings: the settings file with `GAZE_*` overrides applied.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    pub fn recorder(&self) -> SampleRecorder<Database> {
        SampleRecorder::new(self.db.clone(), self.settings().live_buffer_size)
    }

    pub fn sync_controller(&self) -> Result<LocalSync> {
        let probe = NetworkProbe::for_url(&self.settings.backend_url, PROBE_TIMEOUT)?;
        Ok(SyncController::new(SyncEngine::new(
            self.db.clone(),
            self.remote.clone(),
            probe,
        )))
    }

    /// Downloads a session and analyzes it. The spectrum window defaults to
    /// the whole session.
    pub async fn analyze_session(
        &self,
        session_id: &str,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<AnalysisReport> {
        let series = self.remote.session_series(session_id).await?;
        if series.is_empty() {
            bail!("session {session_id} has no gaze data");
        }

        let threshold = self.settings.velocity_anomaly_threshold;
        let mut report = analyze(&series, threshold);
        if from_ms.is_some() || to_ms.is_some() {
            let start = from_ms.map_or(f64::MIN, |ms| ms as f64);
            let end = to_ms.map_or(f64::MAX, |ms| ms as f64);
            report.spectrum = analysis::spectrum(&series_between(&series, start, end));
        }
        Ok(report)
    }

    pub fn demo_report(&self, points: usize) -> AnalysisReport {
        let settings = &self.settings;
        let series = generate_dummy_series(
            &mut rand::thread_rng(),
            points,
            Utc::now().timestamp_millis() as f64,
            settings.sample_interval_ms as f64,
        );
        analyze(&series, settings.velocity_anomaly_threshold)
    }

    /// Calibrates from the first left/center/right detections of a capture,
    /// then records the remaining frames at the sampling rate.
    pub async fn replay(&self, path: &Path) -> Result<Session> {
        let settings = &self.settings;
        let detector = Arc::new(ReplayDetector::from_path(path)?);

        let mut machine = CalibrationStateMachine::new();
        while !machine.is_complete() {
            if detector.remaining().await == 0 {
                bail!(
                    "{} ran out of frames before calibration completed",
                    path.display()
                );
            }
            if let Some(step) = capture_calibration_point(detector.as_ref(), &mut machine).await {
                info!("Captured {} calibration point", step.as_str());
            }
        }

        let recorder = self.recorder();
        let tracker = Arc::new(GazeTracker::new(
            Arc::clone(&detector),
            Arc::new(Mutex::new(machine)),
            recorder.clone(),
            settings.fps_window,
            settings.device_label.clone(),
            settings.detector_timeout(),
        ));

        recorder.start().await;
        let mut sampling = SamplingController::new();
        sampling.start(tracker, settings.sample_interval())?;
        while detector.remaining().await > 0 {
            tokio::time::sleep(settings.sample_interval()).await;
        }
        sampling.stop().await?;

        Ok(recorder.stop().await)
    }
}

pub async fn run(data_dir: PathBuf, command: Command) -> Result<()> {
    utils::init_logging();
    info!("gaze-pipeline starting up...");

    let pipeline = Pipeline::open(&data_dir)?;

    match command {
        Command::Sync => {
            let mut controller = pipeline.sync_controller()?;
            controller.start(pipeline.settings().sync_interval())?;
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            controller.stop().await?;
            info!("Final sync: {:?}", controller.flush().await);
        }
        Command::Sessions => {
            for session_id in pipeline.remote().get_session_ids().await? {
                println!("{session_id}");
            }
        }
        Command::Analyze {
            session_id,
            from_ms,
            to_ms,
        } => {
            let report = pipeline.analyze_session(&session_id, from_ms, to_ms).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Demo { points } => {
            let report = pipeline.demo_report(points);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Replay { file, export } => {
            let session = pipeline.replay(&file).await?;
            if let Some(path) = export {
                session.export_json(&path)?;
                info!("Session exported to {}", path.display());
            }

            let summary = ReplaySummary {
                session_id: session.session_id.clone(),
                samples: session.len(),
                report: analyze(&session.points(), pipeline.settings().velocity_anomaly_threshold),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);

            let outcome = pipeline.sync_controller()?.flush().await;
            info!("Sync after replay: {:?}", outcome);
        }
    }

    Ok(())
}
