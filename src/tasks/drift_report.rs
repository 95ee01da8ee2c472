use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::drift::{render_report, ReportFormat, SummaryDriftReport, DEFAULT_RELATIVE_THRESHOLD};
use crate::profile::IoRegistry;
use crate::tasks::{Task, DEFAULT_READER, DEFAULT_WRITER};

#[derive(Debug, Clone)]
pub struct DriftReportConfig {
    pub task_id: String,
    pub target_profile_path: String,
    pub reference_profile_path: String,
    pub write_report_path: String,
    pub reader: String,
    pub writer: String,
    pub relative_threshold: f64,
}

impl DriftReportConfig {
    pub fn new(
        task_id: impl Into<String>,
        target_profile_path: impl Into<String>,
        reference_profile_path: impl Into<String>,
        write_report_path: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            target_profile_path: target_profile_path.into(),
            reference_profile_path: reference_profile_path.into(),
            write_report_path: write_report_path.into(),
            reader: DEFAULT_READER.to_string(),
            writer: DEFAULT_WRITER.to_string(),
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
        }
    }

    pub fn with_reader(mut self, reader: impl Into<String>) -> Self {
        self.reader = reader.into();
        self
    }

    pub fn with_writer(mut self, writer: impl Into<String>) -> Self {
        self.writer = writer.into();
        self
    }

    pub fn with_threshold(mut self, relative_threshold: f64) -> Self {
        self.relative_threshold = relative_threshold;
        self
    }
}

pub struct DriftReportTask {
    config: DriftReportConfig,
    registry: Arc<IoRegistry>,
}

impl DriftReportTask {
    pub fn new(config: DriftReportConfig, registry: Arc<IoRegistry>) -> Self {
        Self { config, registry }
    }
}

#[async_trait]
impl Task for DriftReportTask {
    type Output = SummaryDriftReport;

    fn task_id(&self) -> &str {
        &self.config.task_id
    }

    async fn execute(&self) -> Result<SummaryDriftReport> {
        let cfg = &self.config;
        let reader = self.registry.reader(&cfg.reader)?;
        let writer = self.registry.writer(&cfg.writer)?;

        debug!(task_id = %cfg.task_id, reference = %cfg.reference_profile_path, target = %cfg.target_profile_path, "reading profiles");
        let reference = reader.read(&cfg.reference_profile_path).await?;
        let target = reader.read(&cfg.target_profile_path).await?;

        let report = SummaryDriftReport::build(&reference, &target, cfg.relative_threshold);
        let rendered = render_report(&report, ReportFormat::for_destination(&cfg.write_report_path))?;
        writer
            .write(&cfg.write_report_path, rendered.as_bytes())
            .await?;

        info!(
            task_id = %cfg.task_id,
            drifted_columns = report.drifted_columns().count(),
            "summary drift report successfully written to {} ({})",
            cfg.write_report_path,
            cfg.writer
        );
        Ok(report)
    }
}
