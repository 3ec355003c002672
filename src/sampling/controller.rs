use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gaze::LandmarkDetector;
use crate::store::MeasurementStore;

use super::loop_worker::sampling_loop;
use super::tracker::GazeTracker;

pub struct SamplingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start<D, S>(&mut self, tracker: Arc<GazeTracker<D, S>>, period: Duration) -> Result<()>
    where
        D: LandmarkDetector + 'static,
        S: MeasurementStore + 'static,
    {
        if self.handle.is_some() {
            bail!("sampling already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(tracker, period, cancel_token.clone()));
        info!("Sampling loop started ({}ms period)", period.as_millis());

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels further ticks and waits for the loop to exit. A frame already
    /// in flight finishes; the recorder discards it if recording has stopped.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SamplingController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationStateMachine;
    use crate::db::Database;
    use crate::gaze::test_support::detection_at;
    use crate::gaze::ReplayDetector;
    use crate::recorder::SampleRecorder;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn loop_records_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("sampling.sqlite3")).unwrap();

        let mut machine = CalibrationStateMachine::new();
        machine.submit(0.40);
        machine.submit(0.50);
        machine.submit(0.60);

        let frames: Vec<_> = (0..50).map(|i| detection_at(0.40 + i as f64 * 0.004)).collect();
        let recorder = SampleRecorder::new(db.clone(), 300);
        let tracker = Arc::new(GazeTracker::new(
            Arc::new(ReplayDetector::from_detections(frames)),
            Arc::new(Mutex::new(machine)),
            recorder.clone(),
            30,
            "test".into(),
            Duration::from_millis(100),
        ));
        recorder.start().await;

        let mut controller = SamplingController::new();
        controller
            .start(Arc::clone(&tracker), Duration::from_millis(5))
            .unwrap();
        assert!(controller
            .start(Arc::clone(&tracker), Duration::from_millis(5))
            .is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        controller.stop().await.unwrap();
        assert!(!controller.is_running());

        let session = recorder.stop().await;
        assert!(!session.is_empty());
        assert!(session
            .samples
            .windows(2)
            .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms));
        assert!(session.samples.iter().all(|s| (-1.0..=1.0).contains(&s.value)));
        assert_eq!(db.get_all_measurements().await.unwrap().len(), session.len());
    }
}
