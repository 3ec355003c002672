use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, decode_calibration_params, encode_calibration_params},
    models::GazeSample,
};
use crate::store::MeasurementStore;

fn row_to_sample(row: &Row) -> rusqlite::Result<GazeSample> {
    let params: String = row.get("calibration_params")?;
    Ok(GazeSample {
        session_id: row.get("session_id")?,
        timestamp_ms: row.get("timestamp_ms")?,
        value: row.get("gaze_x")?,
        sampling_rate: row.get("sampling_rate")?,
        device_label: row.get("device_label")?,
        calibration_params: decode_calibration_params(&params).map_err(conversion_error)?,
    })
}

impl Database {
    pub async fn insert_measurement(&self, sample: &GazeSample) -> Result<()> {
        let record = sample.clone();
        self.execute(move |conn| {
            let params_json = encode_calibration_params(&record.calibration_params)?;
            conn.execute(
                "INSERT INTO measurements (timestamp_ms, session_id, gaze_x, sampling_rate, device_label, calibration_params)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(timestamp_ms) DO UPDATE SET
                     session_id = excluded.session_id,
                     gaze_x = excluded.gaze_x,
                     sampling_rate = excluded.sampling_rate,
                     device_label = excluded.device_label,
                     calibration_params = excluded.calibration_params",
                params![
                    record.timestamp_ms,
                    record.session_id,
                    record.value,
                    record.sampling_rate,
                    record.device_label,
                    params_json,
                ],
            )
            .with_context(|| "failed to insert measurement")?;
            Ok(())
        })
        .await
    }

    pub async fn get_all_measurements(&self) -> Result<Vec<GazeSample>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp_ms, session_id, gaze_x, sampling_rate, device_label, calibration_params
                 FROM measurements
                 ORDER BY timestamp_ms ASC",
            )?;

            let samples = stmt
                .query_map([], row_to_sample)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("failed to read measurements")?;
            Ok(samples)
        })
        .await
    }

    pub async fn delete_measurements_in_range(&self, start_ms: i64, end_ms: i64) -> Result<usize> {
        self.execute(move |conn| {
            let removed = conn
                .execute(
                    "DELETE FROM measurements WHERE timestamp_ms >= ?1 AND timestamp_ms <= ?2",
                    params![start_ms, end_ms],
                )
                .with_context(|| "failed to delete measurement range")?;
            Ok(removed)
        })
        .await
    }

    pub async fn delete_measurements(&self, keys: &[i64]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys = keys.to_vec();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open delete transaction")?;
            let mut removed = 0;
            {
                let mut stmt = tx.prepare("DELETE FROM measurements WHERE timestamp_ms = ?1")?;
                for key in &keys {
                    removed += stmt.execute(params![key])?;
                }
            }
            tx.commit().context("failed to commit measurement deletion")?;
            Ok(removed)
        })
        .await
    }

    pub async fn delete_unchanged_measurements(&self, samples: &[GazeSample]) -> Result<usize> {
        if samples.is_empty() {
            return Ok(0);
        }
        let samples = samples.to_vec();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open delete transaction")?;
            let mut removed = 0;
            {
                let mut stmt = tx.prepare(
                    "DELETE FROM measurements
                     WHERE timestamp_ms = ?1 AND session_id = ?2 AND gaze_x = ?3
                       AND sampling_rate = ?4 AND device_label = ?5",
                )?;
                for sample in &samples {
                    removed += stmt.execute(params![
                        sample.timestamp_ms,
                        sample.session_id,
                        sample.value,
                        sample.sampling_rate,
                        sample.device_label,
                    ])?;
                }
            }
            tx.commit().context("failed to commit measurement deletion")?;
            Ok(removed)
        })
        .await
    }

    pub async fn count_measurements(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}

impl MeasurementStore for Database {
    async fn put(&self, sample: &GazeSample) -> Result<()> {
        self.insert_measurement(sample).await
    }

    async fn get_all(&self) -> Result<Vec<GazeSample>> {
        self.get_all_measurements().await
    }

    async fn delete_range(&self, start_key: i64, end_key: i64) -> Result<usize> {
        self.delete_measurements_in_range(start_key, end_key).await
    }

    async fn delete_keys(&self, keys: &[i64]) -> Result<usize> {
        self.delete_measurements(keys).await
    }

    async fn delete_uploaded(&self, samples: &[GazeSample]) -> Result<usize> {
        self.delete_unchanged_measurements(samples).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("measurements.sqlite3")).unwrap();
        (dir, db)
    }

    fn sample(timestamp_ms: i64, value: f64) -> GazeSample {
        GazeSample {
            session_id: "session-a".into(),
            timestamp_ms,
            value,
            sampling_rate: 30.0,
            device_label: "Linux Device".into(),
            calibration_params: [0.4, 0.5, 0.6],
        }
    }

    #[tokio::test]
    async fn get_all_is_ordered_by_timestamp() {
        let (_dir, db) = open_store();
        for ts in [300, 100, 200] {
            db.put(&sample(ts, 0.1)).await.unwrap();
        }

        let stored = db.get_all().await.unwrap();
        let keys: Vec<i64> = stored.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(keys, vec![100, 200, 300]);
        assert_eq!(stored[0], sample(100, 0.1));
    }

    #[tokio::test]
    async fn duplicate_key_is_last_write_wins() {
        let (_dir, db) = open_store();
        db.put(&sample(100, 0.1)).await.unwrap();
        db.put(&sample(100, -0.7)).await.unwrap();

        let stored = db.get_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, -0.7);
    }

    #[tokio::test]
    async fn delete_range_is_inclusive() {
        let (_dir, db) = open_store();
        for ts in [50, 100, 200, 300, 400] {
            db.put(&sample(ts, 0.0)).await.unwrap();
        }

        let removed = db.delete_range(100, 300).await.unwrap();
        assert_eq!(removed, 3);

        let keys: Vec<i64> = db
            .get_all()
            .await
            .unwrap()
            .iter()
            .map(|s| s.timestamp_ms)
            .collect();
        assert_eq!(keys, vec![50, 400]);
    }

    #[tokio::test]
    async fn delete_keys_removes_only_listed_keys() {
        let (_dir, db) = open_store();
        for ts in [100, 200, 250, 300] {
            db.put(&sample(ts, 0.0)).await.unwrap();
        }

        let removed = db.delete_keys(&[100, 200, 300, 999]).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(db.count_measurements().await.unwrap(), 1);
        assert_eq!(db.get_all().await.unwrap()[0].timestamp_ms, 250);

        assert_eq!(db.delete_keys(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("measurements.sqlite3");
        {
            let db = Database::new(path.clone()).unwrap();
            db.put(&sample(10, 0.3)).await.unwrap();
        }

        let reopened = Database::new(path).unwrap();
        assert_eq!(reopened.get_all().await.unwrap(), vec![sample(10, 0.3)]);
    }
}
