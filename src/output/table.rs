use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::constraints::ConstraintOutcome;
use crate::drift::{ChangeType, SummaryDriftReport};
use crate::tasks::{PipelineSummary, TaskStatus};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_outcomes_table(outcomes: &[ConstraintOutcome]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Constraint",
        "Column",
        "Metric",
        "Observed",
        "Required",
        "Result",
    ]);

    for o in outcomes {
        let result_cell = if o.passed {
            Cell::new("PASS").fg(Color::Green)
        } else {
            Cell::new("FAIL").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&o.name),
            Cell::new(&o.column),
            Cell::new(o.metric.to_string()),
            Cell::new(
                o.observed
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(o.required.to_string()),
            result_cell,
        ]));
    }
    table.to_string()
}

pub fn render_drift_table(report: &SummaryDriftReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["Column", "Change", "Drifted metrics"]);
    for column in &report.columns {
        let drifted = column
            .metrics
            .iter()
            .filter(|m| m.exceeds_threshold)
            .map(|m| match (m.relative, m.delta, m.reference) {
                (Some(rel), _, _) => format!("{} {:+.1}%", m.metric, rel * 100.0),
                (None, Some(delta), _) => format!("{} {:+.4}", m.metric, delta),
                (None, None, Some(_)) => format!("{} disappeared", m.metric),
                (None, None, None) => format!("{} appeared", m.metric),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let change_cell = match column.change_type {
            ChangeType::Unchanged => Cell::new("unchanged"),
            ChangeType::Shifted => Cell::new("shifted").fg(Color::Red),
            ChangeType::Added => Cell::new("added").fg(Color::Yellow),
            ChangeType::Removed => Cell::new("removed").fg(Color::Yellow),
        };
        table.add_row(Row::from(vec![
            Cell::new(&column.column),
            change_cell,
            Cell::new(if drifted.is_empty() { "-".to_string() } else { drifted }),
        ]));
    }
    table.to_string()
}

pub fn render_pipeline_table(summary: &PipelineSummary) -> String {
    let mut table = new_table();
    table.set_header(vec!["Task", "Status"]);
    for record in &summary.records {
        let status = match record.status {
            TaskStatus::Passed => "passed".to_string(),
            TaskStatus::Warned => "warned".to_string(),
            TaskStatus::ReportWritten { drifted_columns } => {
                format!("report written ({drifted_columns} drifted columns)")
            }
        };
        table.add_row(vec![record.task_id.clone(), status]);
    }
    table.to_string()
}
