use anyhow::Result;

use crate::constraints::ConstraintOutcome;
use crate::drift::SummaryDriftReport;
use crate::tasks::{PipelineSummary, TaskStatus};

pub fn outcomes_to_csv(outcomes: &[ConstraintOutcome]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "constraint",
        "column",
        "metric",
        "observed",
        "required",
        "passed",
        "gap",
    ])?;
    for outcome in outcomes {
        writer.write_record([
            outcome.name.clone(),
            outcome.column.clone(),
            outcome.metric.to_string(),
            outcome.observed.map(|v| format!("{v:.6}")).unwrap_or_default(),
            outcome.required.to_string(),
            outcome.passed.to_string(),
            outcome.gap.map(|g| format!("{g:.6}")).unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn drift_to_csv(report: &SummaryDriftReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "column",
        "change",
        "metric",
        "reference",
        "target",
        "delta",
        "relative",
        "drifted",
    ])?;
    for column in &report.columns {
        for metric in &column.metrics {
            writer.write_record([
                column.column.clone(),
                format!("{:?}", column.change_type).to_lowercase(),
                metric.metric.to_string(),
                metric.reference.map(|v| format!("{v:.6}")).unwrap_or_default(),
                metric.target.map(|v| format!("{v:.6}")).unwrap_or_default(),
                metric.delta.map(|v| format!("{v:.6}")).unwrap_or_default(),
                metric.relative.map(|v| format!("{v:.6}")).unwrap_or_default(),
                metric.exceeds_threshold.to_string(),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn pipeline_to_csv(summary: &PipelineSummary) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["task_id", "status", "drifted_columns"])?;
    for record in &summary.records {
        let (status, drifted) = match record.status {
            TaskStatus::Passed => ("passed", String::new()),
            TaskStatus::Warned => ("warned", String::new()),
            TaskStatus::ReportWritten { drifted_columns } => {
                ("report_written", drifted_columns.to_string())
            }
        };
        writer.write_record([record.task_id.as_str(), status, drifted.as_str()])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{greater_than_number, ConstraintsBuilder};
    use crate::profile::{ColumnSummary, ProfileView};
    use crate::tasks::TaskRecord;

    #[test]
    fn outcome_rows_follow_header() {
        let mut builder = ConstraintsBuilder::new(
            ProfileView::new("d").with_column("a", ColumnSummary::numeric(2, 0, 1.0, 0.5, 1.5)),
        );
        builder.add_constraint(greater_than_number("a", 1.0));
        let csv = outcomes_to_csv(&builder.build().outcomes()).expect("csv");
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("constraint,column,metric"));
        assert_eq!(
            lines[1],
            "a greater than number 1,a,min,0.500000,> 1,false,0.500000"
        );
    }

    #[test]
    fn pipeline_rows_carry_status_and_drift_count() {
        let summary = PipelineSummary {
            records: vec![
                TaskRecord {
                    task_id: "greater_than_check_a".to_string(),
                    status: TaskStatus::Passed,
                },
                TaskRecord {
                    task_id: "b_checks".to_string(),
                    status: TaskStatus::Warned,
                },
                TaskRecord {
                    task_id: "drift_report".to_string(),
                    status: TaskStatus::ReportWritten { drifted_columns: 2 },
                },
            ],
        };
        let csv = pipeline_to_csv(&summary).expect("csv");
        assert_eq!(
            csv,
            "task_id,status,drifted_columns\n\
greater_than_check_a,passed,\n\
b_checks,warned,\n\
drift_report,report_written,2\n"
        );
    }
}
