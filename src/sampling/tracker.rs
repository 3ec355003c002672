use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

use crate::calibration::CalibrationStateMachine;
use crate::db::GazeSample;
use crate::gaze::{compute_midpoint, Detection, FpsEstimator, LandmarkDetector};
use crate::recorder::SampleRecorder;
use crate::store::MeasurementStore;
use crate::tasks::TickGuard;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous frame is still being processed.
    Busy,
    CalibrationIncomplete,
    NotRecording,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Skipped(SkipReason),
    /// Detector found no face, failed, or timed out.
    NoFace,
    /// A face was found but no sample came out (stale frame, degenerate calibration).
    Discarded,
    Sampled(GazeSample),
}

/// Everything one sampling tick needs: detector, shared calibration,
/// recorder and the frame-rate window.
pub struct GazeTracker<D, S> {
    detector: Arc<D>,
    calibration: Arc<Mutex<CalibrationStateMachine>>,
    recorder: SampleRecorder<S>,
    fps: Mutex<FpsEstimator>,
    device_label: String,
    detector_timeout: Duration,
    guard: TickGuard,
}

impl<D, S> GazeTracker<D, S>
where
    D: LandmarkDetector,
    S: MeasurementStore,
{
    pub fn new(
        detector: Arc<D>,
        calibration: Arc<Mutex<CalibrationStateMachine>>,
        recorder: SampleRecorder<S>,
        fps_window: usize,
        device_label: String,
        detector_timeout: Duration,
    ) -> Self {
        Self {
            detector,
            calibration,
            recorder,
            fps: Mutex::new(FpsEstimator::new(fps_window)),
            device_label,
            detector_timeout,
            guard: TickGuard::new(),
        }
    }

    pub fn recorder(&self) -> &SampleRecorder<S> {
        &self.recorder
    }

    pub async fn current_fps(&self) -> f64 {
        self.fps.lock().await.fps()
    }

    /// One sampling tick. Never fails; every problem maps to an outcome.
    pub async fn process_frame(&self) -> FrameOutcome {
        let Some(_permit) = self.guard.try_begin() else {
            return FrameOutcome::Skipped(SkipReason::Busy);
        };

        let calibration = self.calibration.lock().await.calibration();
        if !calibration.is_complete() {
            return FrameOutcome::Skipped(SkipReason::CalibrationIncomplete);
        }
        let Some(ticket) = self.recorder.begin_frame().await else {
            return FrameOutcome::Skipped(SkipReason::NotRecording);
        };

        let detection = match tokio::time::timeout(self.detector_timeout, self.detector.detect()).await {
            Ok(Ok(detection)) => detection,
            Ok(Err(err)) => {
                log_warn!("landmark detection failed: {err:?}");
                Detection::NotDetected
            }
            Err(_) => {
                log_warn!(
                    "landmark detection timed out after {}ms",
                    self.detector_timeout.as_millis()
                );
                Detection::NotDetected
            }
        };

        let fps = {
            let mut window = self.fps.lock().await;
            window.mark_frame(Instant::now());
            window.fps()
        };

        let Some(midpoint) = compute_midpoint(&detection) else {
            return FrameOutcome::NoFace;
        };

        match self
            .recorder
            .on_frame_with_ticket(ticket, Some(midpoint), &calibration, fps, &self.device_label)
            .await
        {
            Some(sample) => {
                log_debug!("gaze sample {:.3} at {} ({} fps)", sample.value, sample.timestamp_ms, fps);
                FrameOutcome::Sampled(sample)
            }
            None => FrameOutcome::Discarded,
        }
    }
}
