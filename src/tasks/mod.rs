pub mod constraint_check;
pub mod drift_report;
pub mod pipeline;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub use constraint_check::{CheckOutcome, ConstraintCheckConfig, ConstraintCheckTask, ConstraintSource};
pub use drift_report::{DriftReportConfig, DriftReportTask};
pub use pipeline::{run_pipeline, PipelineSummary, TaskRecord, TaskStatus};

pub const DEFAULT_READER: &str = "local";
pub const DEFAULT_WRITER: &str = "local";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task {task_id}: constraints didn't meet the criteria")]
    ConstraintsNotMet { task_id: String },
    #[error("task {task_id}: either a constraint set or a profile path with a constraint is required")]
    MissingConstraints { task_id: String },
}

/// Unit of work executed once by an orchestrator. Inputs are fixed at
/// construction.
#[async_trait]
pub trait Task: Send + Sync {
    type Output: Send;

    fn task_id(&self) -> &str;
    async fn execute(&self) -> Result<Self::Output>;
}
