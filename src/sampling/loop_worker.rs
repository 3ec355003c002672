use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::gaze::LandmarkDetector;
use crate::store::MeasurementStore;

use super::tracker::{FrameOutcome, GazeTracker};

// The loop itself only logs lifecycle events; per-frame detail lives in the tracker.
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub async fn sampling_loop<D, S>(
    tracker: Arc<GazeTracker<D, S>>,
    period: Duration,
    cancel_token: CancellationToken,
) where
    D: LandmarkDetector,
    S: MeasurementStore,
{
    let mut ticker = tokio::time::interval(period);
    // A slow detector call must not trigger a burst of catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut sampled: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let FrameOutcome::Sampled(_) = tracker.process_frame().await {
                    sampled += 1;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop shutting down after {} samples", sampled);
                break;
            }
        }
    }
}
