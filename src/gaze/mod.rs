pub mod detector;
pub mod device;
pub mod normalizer;
pub mod replay;

pub use detector::{Detection, DetectorOutput, FaceLandmarks, Landmark, LandmarkDetector};
pub use device::device_label;
pub use normalizer::{calibrate, compute_midpoint, estimate_fps, FpsEstimator};
pub use replay::ReplayDetector;

use log::warn;

use crate::calibration::{CalibrationStateMachine, CalibrationStep};

/// Runs one detection and submits its midpoint to the calibration machine.
///
/// Returns the step that was captured, or `None` when nothing was detected,
/// the detector failed, or calibration was already complete.
pub async fn capture_calibration_point<D: LandmarkDetector>(
    detector: &D,
    machine: &mut CalibrationStateMachine,
) -> Option<CalibrationStep> {
    let step = machine.current_step()?;
    let detection = match detector.detect().await {
        Ok(detection) => detection,
        Err(err) => {
            warn!("calibration detection failed: {err:?}");
            return None;
        }
    };

    let midpoint = compute_midpoint(&detection)?;
    machine.submit(midpoint).then_some(step)
}
