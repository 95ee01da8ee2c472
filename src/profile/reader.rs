use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::profile::ProfileView;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

#[async_trait]
pub trait ProfileReader: Send + Sync {
    fn name(&self) -> &str;
    async fn read(&self, location: &str) -> Result<ProfileView>;
}

/// Reads JSON profiles from the local filesystem.
pub struct LocalReader;

#[async_trait]
impl ProfileReader for LocalReader {
    fn name(&self) -> &str {
        "local"
    }

    async fn read(&self, location: &str) -> Result<ProfileView> {
        let data = tokio::fs::read_to_string(location)
            .await
            .with_context(|| format!("failed reading profile: {location}"))?;
        serde_json::from_str(&data).with_context(|| format!("invalid profile JSON: {location}"))
    }
}

pub struct HttpReader {
    client: Client,
}

impl HttpReader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("profile-gate/0.1")
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProfileReader for HttpReader {
    fn name(&self) -> &str {
        "http"
    }

    async fn read(&self, location: &str) -> Result<ProfileView> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .with_context(|| format!("failed GET request: {location}"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body: {location}"))?;
        if !status.is_success() {
            let preview: String = body.chars().take(180).collect();
            return Err(anyhow!("GET {location} returned {status}: {preview}"));
        }
        serde_json::from_str(&body).with_context(|| format!("invalid profile JSON: {location}"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::constraints::ColumnMetric;

    #[tokio::test]
    async fn local_reader_parses_profile_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"dataset": "d", "columns": {{"a": {{"count": 2, "mean": 1.5}}}}}}"#
        )
        .expect("write profile");

        let path = file.path().to_string_lossy().to_string();
        let view = LocalReader.read(&path).await.expect("read profile");
        assert_eq!(view.dataset, "d");
        assert_eq!(view.metric("a", ColumnMetric::Mean), Some(1.5));
    }

    #[tokio::test]
    async fn local_reader_surfaces_io_error_for_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.json");
        let err = LocalReader
            .read(&path.to_string_lossy())
            .await
            .expect_err("missing file must fail");
        assert!(err.root_cause().downcast_ref::<std::io::Error>().is_some());
    }
}
