//! The durable local buffer as seen by the recorder and the sync engine.

use std::future::Future;

use anyhow::Result;

use crate::db::GazeSample;

/// Persistent key/value buffer of samples keyed by `timestamp_ms`.
///
/// `get_all` must return samples in ascending key order.
pub trait MeasurementStore: Send + Sync {
    /// Upsert; a sample with an existing key replaces the stored one.
    fn put(&self, sample: &GazeSample) -> impl Future<Output = Result<()>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<GazeSample>>> + Send;

    /// Deletes every key in `[start_key, end_key]`; returns the number removed.
    fn delete_range(
        &self,
        start_key: i64,
        end_key: i64,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Deletes exactly the listed keys; returns the number removed.
    fn delete_keys(&self, keys: &[i64]) -> impl Future<Output = Result<usize>> + Send;

    /// Deletes each sample's key only if the stored row still holds that
    /// sample, so a row rewritten after `samples` was read survives.
    fn delete_uploaded(
        &self,
        samples: &[GazeSample],
    ) -> impl Future<Output = Result<usize>> + Send;
}
