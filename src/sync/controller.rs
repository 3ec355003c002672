use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::MeasurementStore;

use super::connectivity::Connectivity;
use super::engine::{SyncEngine, SyncOutcome, Uploader};
use super::loop_worker::sync_loop;

pub struct SyncController<S, U, C> {
    engine: Arc<SyncEngine<S, U, C>>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl<S, U, C> SyncController<S, U, C>
where
    S: MeasurementStore + 'static,
    U: Uploader + 'static,
    C: Connectivity + 'static,
{
    pub fn new(engine: SyncEngine<S, U, C>) -> Self {
        Self {
            engine: Arc::new(engine),
            handle: None,
            cancel_token: None,
        }
    }

    pub fn engine(&self) -> &SyncEngine<S, U, C> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, period: Duration) -> Result<()> {
        if self.handle.is_some() {
            bail!("sync already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sync_loop(
            Arc::clone(&self.engine),
            period,
            cancel_token.clone(),
        ));
        info!("Sync loop started ({}ms period)", period.as_millis());

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Runs one reconciliation immediately. Reports `Busy` if the loop is
    /// mid-upload.
    pub async fn flush(&self) -> SyncOutcome {
        self.engine.sync_once().await
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sync loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
