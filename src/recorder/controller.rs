use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::analysis::TimeSeriesPoint;
use crate::calibration::CalibrationSet;
use crate::db::GazeSample;
use crate::gaze::calibrate;
use crate::models::{RecorderStatus, Session};
use crate::store::MeasurementStore;

use super::state::RecorderState;

/// Proof that the recorder was accepting samples when a frame started.
///
/// A ticket from an earlier recording is refused by `on_frame_with_ticket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct RecorderSnapshot {
    pub status: RecorderStatus,
    pub session_id: String,
    pub sample_count: usize,
}

/// Owns the recording flag and session buffer, and writes every accepted
/// sample through to the durable store.
#[derive(Clone)]
pub struct SampleRecorder<S> {
    state: Arc<Mutex<RecorderState>>,
    store: S,
    latest: Arc<watch::Sender<Option<f64>>>,
}

impl<S: MeasurementStore> SampleRecorder<S> {
    pub fn new(store: S, live_buffer_size: usize) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            state: Arc::new(Mutex::new(RecorderState::new(String::new(), live_buffer_size))),
            store,
            latest: Arc::new(latest),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a new recording with a fresh session id. No-op while recording.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.is_recording() {
            return;
        }
        let session_id = Uuid::new_v4().to_string();
        info!("Recording started for session {session_id}");
        state.begin(session_id, Utc::now());
    }

    pub async fn pause(&self) {
        self.state.lock().await.pause();
    }

    /// Continues a paused recording without clearing its buffer.
    pub async fn resume(&self) -> bool {
        self.state.lock().await.resume()
    }

    /// Ends the recording. The durable store is left alone; the sync engine drains it.
    pub async fn stop(&self) -> Session {
        let session = self.state.lock().await.finish(Utc::now());
        info!(
            "Recording stopped for session {} with {} samples",
            session.session_id,
            session.len()
        );
        session
    }

    pub async fn is_recording(&self) -> bool {
        self.state.lock().await.is_recording()
    }

    pub async fn snapshot(&self) -> RecorderSnapshot {
        let state = self.state.lock().await;
        RecorderSnapshot {
            status: state.status,
            session_id: state.session_id.clone(),
            sample_count: state.sample_count(),
        }
    }

    pub async fn live_points(&self) -> Vec<TimeSeriesPoint> {
        self.state.lock().await.live_points()
    }

    /// Latest calibrated value, for a live gaze indicator.
    pub fn subscribe(&self) -> watch::Receiver<Option<f64>> {
        self.latest.subscribe()
    }

    /// Issues a ticket if the recorder is currently accepting samples.
    pub async fn begin_frame(&self) -> Option<FrameTicket> {
        let state = self.state.lock().await;
        state.is_recording().then_some(FrameTicket {
            generation: state.generation,
        })
    }

    pub async fn on_frame(
        &self,
        midpoint: Option<f64>,
        calibration: &CalibrationSet,
        fps: f64,
        device_label: &str,
    ) -> Option<GazeSample> {
        self.accept(None, midpoint, calibration, fps, device_label)
            .await
    }

    /// Like `on_frame`, but discards the frame if recording stopped or
    /// restarted since `ticket` was issued.
    pub async fn on_frame_with_ticket(
        &self,
        ticket: FrameTicket,
        midpoint: Option<f64>,
        calibration: &CalibrationSet,
        fps: f64,
        device_label: &str,
    ) -> Option<GazeSample> {
        self.accept(Some(ticket), midpoint, calibration, fps, device_label)
            .await
    }

    async fn accept(
        &self,
        ticket: Option<FrameTicket>,
        midpoint: Option<f64>,
        calibration: &CalibrationSet,
        fps: f64,
        device_label: &str,
    ) -> Option<GazeSample> {
        let mut state = self.state.lock().await;
        if !state.is_recording() {
            return None;
        }
        if ticket.is_some_and(|t| t.generation != state.generation) {
            return None;
        }

        let calibration_params = calibration.params()?;
        let value = calibrate(midpoint?, calibration)?;

        let sample = GazeSample {
            session_id: state.session_id.clone(),
            timestamp_ms: state.next_timestamp(Utc::now().timestamp_millis()),
            value,
            sampling_rate: if fps.is_finite() { fps } else { 0.0 },
            device_label: device_label.to_string(),
            calibration_params,
        };

        state.push(sample.clone());
        // Held across the write so a concurrent stop observes either none or all of this frame.
        if let Err(err) = self.store.put(&sample).await {
            warn!(
                "failed to persist sample {} for session {}: {err:?}",
                sample.timestamp_ms, sample.session_id
            );
        }
        drop(state);

        self.latest.send_replace(Some(value));
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    fn recorder() -> (TempDir, SampleRecorder<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("recorder.sqlite3")).unwrap();
        (dir, SampleRecorder::new(db, 5))
    }

    fn calibration() -> CalibrationSet {
        CalibrationSet::complete(0.40, 0.50, 0.60)
    }

    #[tokio::test]
    async fn frames_while_not_recording_touch_nothing() {
        let (_dir, recorder) = recorder();

        let result = recorder
            .on_frame(Some(0.45), &calibration(), 30.0, "test")
            .await;
        assert!(result.is_none());
        assert_eq!(recorder.snapshot().await.sample_count, 0);
        assert!(recorder.live_points().await.is_empty());
        assert!(recorder.store().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accepted_frame_is_buffered_and_persisted() {
        let (_dir, recorder) = recorder();
        recorder.start().await;

        let sample = recorder
            .on_frame(Some(0.45), &calibration(), 29.97, "Linux Device")
            .await
            .expect("sample");

        assert!((sample.value + 0.5).abs() < 1e-9);
        assert_eq!(sample.calibration_params, [0.40, 0.50, 0.60]);
        assert_eq!(sample.sampling_rate, 29.97);
        assert_eq!(recorder.store().get_all().await.unwrap(), vec![sample.clone()]);
        assert_eq!(*recorder.subscribe().borrow(), Some(sample.value));

        let session = recorder.stop().await;
        assert_eq!(session.samples, vec![sample]);
        // Stopping leaves the durable copy for the sync engine.
        assert_eq!(recorder.store().get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_midpoint_or_calibration_is_skipped() {
        let (_dir, recorder) = recorder();
        recorder.start().await;

        assert!(recorder.on_frame(None, &calibration(), 30.0, "t").await.is_none());
        let partial = CalibrationSet {
            left: Some(0.4),
            center: None,
            right: Some(0.6),
        };
        assert!(recorder.on_frame(Some(0.5), &partial, 30.0, "t").await.is_none());
        let degenerate = CalibrationSet::complete(0.5, 0.5, 0.6);
        assert!(recorder.on_frame(Some(0.45), &degenerate, 30.0, "t").await.is_none());

        assert_eq!(recorder.snapshot().await.sample_count, 0);
    }

    #[tokio::test]
    async fn pause_gates_samples_and_resume_keeps_buffer() {
        let (_dir, recorder) = recorder();
        recorder.start().await;
        recorder.on_frame(Some(0.5), &calibration(), 30.0, "t").await;

        recorder.pause().await;
        assert!(recorder.on_frame(Some(0.5), &calibration(), 30.0, "t").await.is_none());

        assert!(recorder.resume().await);
        recorder.on_frame(Some(0.55), &calibration(), 30.0, "t").await;
        assert_eq!(recorder.stop().await.len(), 2);
    }

    #[tokio::test]
    async fn start_is_idempotent_while_recording() {
        let (_dir, recorder) = recorder();
        recorder.start().await;
        let session_id = recorder.snapshot().await.session_id;
        recorder.on_frame(Some(0.5), &calibration(), 30.0, "t").await;

        recorder.start().await;
        let snapshot = recorder.snapshot().await;
        assert_eq!(snapshot.session_id, session_id);
        assert_eq!(snapshot.sample_count, 1);
    }

    #[tokio::test]
    async fn new_recording_gets_new_session_and_empty_buffer() {
        let (_dir, recorder) = recorder();
        recorder.start().await;
        recorder.on_frame(Some(0.5), &calibration(), 30.0, "t").await;
        let first = recorder.stop().await;

        recorder.start().await;
        let snapshot = recorder.snapshot().await;
        assert_ne!(snapshot.session_id, first.session_id);
        assert_eq!(snapshot.sample_count, 0);
    }

    #[tokio::test]
    async fn stale_ticket_is_discarded() {
        let (_dir, recorder) = recorder();
        recorder.start().await;
        let ticket = recorder.begin_frame().await.expect("recording");

        // Recording restarted while the detector was running.
        recorder.stop().await;
        recorder.start().await;

        let result = recorder
            .on_frame_with_ticket(ticket, Some(0.5), &calibration(), 30.0, "t")
            .await;
        assert!(result.is_none());

        let fresh = recorder.begin_frame().await.unwrap();
        assert!(recorder
            .on_frame_with_ticket(fresh, Some(0.5), &calibration(), 30.0, "t")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn no_ticket_when_idle() {
        let (_dir, recorder) = recorder();
        assert!(recorder.begin_frame().await.is_none());
    }

    #[tokio::test]
    async fn back_to_back_frames_each_get_their_own_store_row() {
        let (_dir, recorder) = recorder();
        recorder.start().await;
        for _ in 0..200 {
            recorder
                .on_frame(Some(0.45), &calibration(), 30.0, "t")
                .await
                .expect("sample");
        }
        let session = recorder.stop().await;

        recorder.start().await;
        recorder
            .on_frame(Some(0.55), &calibration(), 30.0, "t")
            .await
            .expect("sample");
        let next = recorder.stop().await;

        let stored = recorder.store().get_all().await.unwrap();
        assert_eq!(session.len(), 200);
        assert_eq!(stored.len(), 201);
        assert!(session
            .samples
            .windows(2)
            .all(|pair| pair[0].timestamp_ms < pair[1].timestamp_ms));
        assert!(next.samples[0].timestamp_ms > session.samples[199].timestamp_ms);
    }
}
