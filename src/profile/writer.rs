use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

#[async_trait]
pub trait ReportWriter: Send + Sync {
    fn name(&self) -> &str;
    async fn write(&self, dest: &str, content: &[u8]) -> Result<()>;
}

/// Writes rendered artifacts to the local filesystem, creating parent
/// directories as needed.
pub struct LocalWriter;

#[async_trait]
impl ReportWriter for LocalWriter {
    fn name(&self) -> &str {
        "local"
    }

    async fn write(&self, dest: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = Path::new(dest).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed creating report directory: {}", parent.display())
                })?;
            }
        }
        tokio::fs::write(dest, content)
            .await
            .with_context(|| format!("failed writing report: {dest}"))
    }
}
