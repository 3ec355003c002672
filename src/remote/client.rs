use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, Url};

use crate::analysis::TimeSeriesPoint;
use crate::db::GazeSample;
use crate::sync::Uploader;

use super::types::{to_time_series, DownloadResponse, RemoteMeasurement, SessionIdsResponse, UploadRequest};

/// HTTP client for the ingestion and query endpoints.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: Url,
}

impl RemoteClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid backend url {base_url}"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path {path}"))
    }

    /// `POST /api/upload`. Any 2xx status counts as accepted.
    pub async fn upload_batch(&self, samples: &[GazeSample]) -> Result<()> {
        let url = self.endpoint("/api/upload")?;
        let response = self
            .http
            .post(url)
            .json(&UploadRequest::from_samples(samples))
            .send()
            .await
            .context("upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("upload rejected with status {status}");
        }
        Ok(())
    }

    pub async fn get_session_ids(&self) -> Result<Vec<String>> {
        let url = self.endpoint("/api/get_session_ids")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("session id request failed")?
            .error_for_status()
            .context("session id request rejected")?;

        let body: SessionIdsResponse = response
            .json()
            .await
            .context("malformed session id response")?;
        Ok(body.session_ids)
    }

    pub async fn download_session(&self, session_id: &str) -> Result<Vec<RemoteMeasurement>> {
        let url = self.endpoint("/api/download")?;
        let response = self
            .http
            .get(url)
            .query(&[("session_id", session_id), ("as_json", "true")])
            .send()
            .await
            .with_context(|| format!("download of session {session_id} failed"))?
            .error_for_status()
            .with_context(|| format!("download of session {session_id} rejected"))?;

        let body: DownloadResponse = response
            .json()
            .await
            .with_context(|| format!("malformed download response for session {session_id}"))?;
        Ok(body.data)
    }

    pub async fn session_series(&self, session_id: &str) -> Result<Vec<TimeSeriesPoint>> {
        let rows = self.download_session(session_id).await?;
        Ok(to_time_series(&rows))
    }
}

impl Uploader for RemoteClient {
    async fn upload(&self, batch: &[GazeSample]) -> Result<()> {
        self.upload_batch(batch).await
    }
}
