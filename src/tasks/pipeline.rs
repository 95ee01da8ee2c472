use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::ci_group::CiConsole;
use crate::config::{CheckDefinition, Config, DriftDefinition};
use crate::constraints::MetricConstraint;
use crate::profile::IoRegistry;
use crate::tasks::{
    ConstraintCheckConfig, ConstraintCheckTask, DriftReportConfig, DriftReportTask, Task,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Passed,
    Warned,
    ReportWritten { drifted_columns: usize },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub records: Vec<TaskRecord>,
}

impl PipelineSummary {
    pub fn warned(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == TaskStatus::Warned)
            .count()
    }
}

/// Runs every configured check, then every drift report, each inside its own
/// CI group. The first failing task stops the run.
pub async fn run_pipeline<W: Write>(
    config: &Config,
    registry: Arc<IoRegistry>,
    console: &CiConsole<W>,
) -> Result<PipelineSummary> {
    let mut summary = PipelineSummary::default();
    let message_type = config.ci.group_message_type;

    for check in &config.checks {
        let _group = console.group(&format!("Constraint check: {}", check.task_id), message_type);
        let task = build_check_task(config, check, Arc::clone(&registry)).await?;
        let outcome = match task.run().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(task_id = %check.task_id, "pipeline stopped");
                return Err(err.context(format!("task {} failed", check.task_id)));
            }
        };
        summary.records.push(TaskRecord {
            task_id: check.task_id.clone(),
            status: if outcome.passed {
                TaskStatus::Passed
            } else {
                TaskStatus::Warned
            },
        });
    }

    for definition in &config.drift_reports {
        let _group = console.group(&format!("Drift report: {}", definition.task_id), message_type);
        let task = DriftReportTask::new(drift_config(config, definition), Arc::clone(&registry));
        let report = task
            .execute()
            .await
            .with_context(|| format!("task {} failed", definition.task_id))?;
        summary.records.push(TaskRecord {
            task_id: definition.task_id.clone(),
            status: TaskStatus::ReportWritten {
                drifted_columns: report.drifted_columns().count(),
            },
        });
    }

    info!(
        tasks = summary.records.len(),
        warned = summary.warned(),
        "pipeline finished"
    );
    Ok(summary)
}

async fn build_check_task(
    config: &Config,
    check: &CheckDefinition,
    registry: Arc<IoRegistry>,
) -> Result<ConstraintCheckTask> {
    let reader = check
        .reader
        .clone()
        .unwrap_or_else(|| config.storage.reader.clone());
    let constraints: Vec<MetricConstraint> = check.constraints.iter().map(|c| c.build()).collect();
    let break_pipeline = check
        .break_pipeline
        .unwrap_or(config.constraints.break_pipeline);
    let task_config = ConstraintCheckConfig::for_profile(
        check.task_id.as_str(),
        check.profile_path.as_str(),
        reader,
        constraints,
        break_pipeline,
        &registry,
    )
    .await?;
    Ok(ConstraintCheckTask::from_config(task_config, registry)?)
}

fn drift_config(config: &Config, definition: &DriftDefinition) -> DriftReportConfig {
    DriftReportConfig::new(
        definition.task_id.as_str(),
        definition.target_profile_path.as_str(),
        definition.reference_profile_path.as_str(),
        definition.write_report_path.as_str(),
    )
    .with_reader(
        definition
            .reader
            .clone()
            .unwrap_or_else(|| config.storage.reader.clone()),
    )
    .with_writer(
        definition
            .writer
            .clone()
            .unwrap_or_else(|| config.storage.writer.clone()),
    )
    .with_threshold(
        definition
            .relative_threshold
            .unwrap_or(config.drift.relative_threshold),
    )
}
