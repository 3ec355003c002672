use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::store::MeasurementStore;

use super::connectivity::Connectivity;
use super::engine::{SyncEngine, SyncOutcome, Uploader};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub async fn sync_loop<S, U, C>(
    engine: Arc<SyncEngine<S, U, C>>,
    period: Duration,
    cancel_token: CancellationToken,
) where
    S: MeasurementStore,
    U: Uploader,
    C: Connectivity,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut was_offline = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.sync_once().await {
                    SyncOutcome::Offline => {
                        if !was_offline {
                            log_info!("backend unreachable, holding measurements locally");
                        }
                        was_offline = true;
                    }
                    outcome => {
                        if was_offline {
                            log_info!("backend reachable again");
                        }
                        was_offline = false;
                        log_debug!("sync tick: {:?}", outcome);
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("sync loop shutting down");
                break;
            }
        }
    }
}
