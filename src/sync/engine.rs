use std::future::Future;

use anyhow::Result;

use crate::db::GazeSample;
use crate::store::MeasurementStore;
use crate::tasks::TickGuard;

use super::connectivity::Connectivity;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Sends one batch to the remote ingestion endpoint. `Ok` means accepted.
pub trait Uploader: Send + Sync {
    fn upload(&self, batch: &[GazeSample]) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Offline,
    /// The previous sync is still running.
    Busy,
    Empty,
    Uploaded { count: usize },
    /// Nothing was removed from the store; the next tick retries.
    Failed,
}

/// Batch reconciliation between the durable store and the backend.
///
/// Delivery is at-least-once: a batch is removed only after the backend
/// accepted it, and only rows that still hold the uploaded samples are removed.
pub struct SyncEngine<S, U, C> {
    store: S,
    uploader: U,
    connectivity: C,
    guard: TickGuard,
}

impl<S, U, C> SyncEngine<S, U, C>
where
    S: MeasurementStore,
    U: Uploader,
    C: Connectivity,
{
    pub fn new(store: S, uploader: U, connectivity: C) -> Self {
        Self {
            store,
            uploader,
            connectivity,
            guard: TickGuard::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn sync_once(&self) -> SyncOutcome {
        let Some(_permit) = self.guard.try_begin() else {
            return SyncOutcome::Busy;
        };

        if !self.connectivity.is_online().await {
            return SyncOutcome::Offline;
        }

        let batch = match self.store.get_all().await {
            Ok(batch) => batch,
            Err(err) => {
                log_error!("failed to read pending measurements: {err:?}");
                return SyncOutcome::Failed;
            }
        };
        if batch.is_empty() {
            return SyncOutcome::Empty;
        }

        if let Err(err) = self.uploader.upload(&batch).await {
            log_warn!("upload of {} measurements failed: {err:?}", batch.len());
            return SyncOutcome::Failed;
        }

        // Samples written while the upload was in flight, new keys or
        // rewrites of uploaded ones, no longer match the batch and stay queued.
        match self.store.delete_uploaded(&batch).await {
            Ok(removed) => {
                log_info!("uploaded {} measurements, removed {} locally", batch.len(), removed);
                SyncOutcome::Uploaded { count: batch.len() }
            }
            Err(err) => {
                log_error!("uploaded batch could not be removed, it will be sent again: {err:?}");
                SyncOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    struct Online(bool);

    impl Connectivity for Online {
        async fn is_online(&self) -> bool {
            self.0
        }
    }

    /// Accepts every batch and, while "in flight", writes `late` samples to the store.
    struct RecordingUploader {
        store: Database,
        late: Vec<GazeSample>,
        batches: Arc<AtomicUsize>,
    }

    impl Uploader for RecordingUploader {
        async fn upload(&self, _batch: &[GazeSample]) -> Result<()> {
            for sample in &self.late {
                self.store.put(sample).await?;
            }
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Holds the upload open until released.
    #[derive(Default)]
    struct GatedUploader {
        entered: Notify,
        release: Notify,
    }

    impl Uploader for GatedUploader {
        async fn upload(&self, _batch: &[GazeSample]) -> Result<()> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    struct RejectingUploader;

    impl Uploader for RejectingUploader {
        async fn upload(&self, _batch: &[GazeSample]) -> Result<()> {
            bail!("503 Service Unavailable")
        }
    }

    fn sample(ts: i64) -> GazeSample {
        GazeSample {
            session_id: "sync".into(),
            timestamp_ms: ts,
            value: 0.0,
            sampling_rate: 30.0,
            device_label: "test".into(),
            calibration_params: [0.4, 0.5, 0.6],
        }
    }

    async fn seeded(timestamps: &[i64]) -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("sync.sqlite3")).unwrap();
        for &ts in timestamps {
            db.put(&sample(ts)).await.unwrap();
        }
        (dir, db)
    }

    fn keys(samples: &[GazeSample]) -> Vec<i64> {
        samples.iter().map(|s| s.timestamp_ms).collect()
    }

    #[tokio::test]
    async fn sample_written_during_upload_survives_the_delete() {
        let (_dir, db) = seeded(&[100, 200, 300]).await;
        let batches = Arc::new(AtomicUsize::new(0));
        let engine = SyncEngine::new(
            db.clone(),
            RecordingUploader {
                store: db.clone(),
                late: vec![sample(250)],
                batches: Arc::clone(&batches),
            },
            Online(true),
        );

        assert_eq!(engine.sync_once().await, SyncOutcome::Uploaded { count: 3 });
        assert_eq!(keys(&db.get_all().await.unwrap()), vec![250]);
        assert_eq!(batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sample_rewritten_during_upload_is_not_deleted() {
        let (_dir, db) = seeded(&[100, 200, 300]).await;
        let rewritten = GazeSample {
            value: 0.99,
            ..sample(300)
        };
        let engine = SyncEngine::new(
            db.clone(),
            RecordingUploader {
                store: db.clone(),
                late: vec![rewritten.clone()],
                batches: Arc::new(AtomicUsize::new(0)),
            },
            Online(true),
        );

        assert_eq!(engine.sync_once().await, SyncOutcome::Uploaded { count: 3 });
        assert_eq!(db.get_all().await.unwrap(), vec![rewritten]);
    }

    #[tokio::test]
    async fn overlapping_sync_is_reported_busy() {
        let (_dir, db) = seeded(&[100]).await;
        let engine = SyncEngine::new(db.clone(), GatedUploader::default(), Online(true));

        let (first, second) = tokio::join!(engine.sync_once(), async {
            engine.uploader.entered.notified().await;
            let outcome = engine.sync_once().await;
            engine.uploader.release.notify_one();
            outcome
        });

        assert_eq!(first, SyncOutcome::Uploaded { count: 1 });
        assert_eq!(second, SyncOutcome::Busy);
        assert!(db.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_leaves_the_store_untouched() {
        let (_dir, db) = seeded(&[100, 200, 300]).await;
        let engine = SyncEngine::new(db.clone(), RejectingUploader, Online(true));

        assert_eq!(engine.sync_once().await, SyncOutcome::Failed);
        assert_eq!(keys(&db.get_all().await.unwrap()), vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn offline_and_empty_ticks_do_nothing() {
        let (_dir, db) = seeded(&[100]).await;
        let batches = Arc::new(AtomicUsize::new(0));
        let uploader = RecordingUploader {
            store: db.clone(),
            late: Vec::new(),
            batches: Arc::clone(&batches),
        };

        let offline = SyncEngine::new(db.clone(), uploader, Online(false));
        assert_eq!(offline.sync_once().await, SyncOutcome::Offline);
        assert_eq!(batches.load(Ordering::SeqCst), 0);
        assert_eq!(keys(&db.get_all().await.unwrap()), vec![100]);

        let (_empty_dir, empty) = seeded(&[]).await;
        let engine = SyncEngine::new(
            empty.clone(),
            RecordingUploader {
                store: empty.clone(),
                late: Vec::new(),
                batches: Arc::clone(&batches),
            },
            Online(true),
        );
        assert_eq!(engine.sync_once().await, SyncOutcome::Empty);
        assert_eq!(batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn range_delete_of_a_snapshot_removes_exactly_its_span() {
        let (_dir, db) = seeded(&[50, 100, 200, 300, 400]).await;
        assert_eq!(db.delete_range(100, 300).await.unwrap(), 3);
        assert_eq!(keys(&db.get_all().await.unwrap()), vec![50, 400]);
    }
}
