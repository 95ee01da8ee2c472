use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::drift::{ChangeType, MetricDelta, SummaryDriftReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Json,
}

impl ReportFormat {
    /// `.json` destinations get JSON, everything else HTML.
    pub fn for_destination(dest: &str) -> Self {
        let is_json = Path::new(dest)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::Json
        } else {
            Self::Html
        }
    }
}

pub fn render_report(report: &SummaryDriftReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ReportFormat::Html => Ok(render_html(report)),
    }
}

fn render_html(report: &SummaryDriftReport) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Summary drift report</title>\n");
    out.push_str(
        "<style>body{font-family:sans-serif}table{border-collapse:collapse}\
td,th{border:1px solid #ccc;padding:4px 8px}.shifted{background:#fde2e1}\
.added{background:#e1f5e1}.removed{background:#eee}</style>\n",
    );
    out.push_str("</head>\n<body>\n<h1>Summary drift report</h1>\n");
    let _ = writeln!(
        out,
        "<p>Reference: <b>{}</b> &middot; Target: <b>{}</b> &middot; Generated: {}</p>",
        escape_html(&report.reference_dataset),
        escape_html(&report.target_dataset),
        report.generated_at.to_rfc3339()
    );
    let drifted = report.drifted_columns().count();
    let _ = writeln!(
        out,
        "<p>{drifted} of {} columns drifted (relative threshold {}).{}</p>",
        report.columns.len(),
        report.relative_threshold,
        if report.identical_profiles() {
            " Profiles are identical."
        } else {
            ""
        }
    );

    out.push_str("<table>\n<tr><th>Column</th><th>Change</th><th>Metric</th>");
    out.push_str("<th>Reference</th><th>Target</th><th>Delta</th><th>Relative</th></tr>\n");
    for column in &report.columns {
        let class = change_class(column.change_type);
        let rows: Vec<&MetricDelta> = column
            .metrics
            .iter()
            .filter(|m| m.reference.is_some() || m.target.is_some())
            .collect();
        let span = rows.len().max(1);
        let _ = write!(
            out,
            "<tr class=\"{class}\"><td rowspan=\"{span}\">{}</td><td rowspan=\"{span}\">{class}</td>",
            escape_html(&column.column)
        );
        if rows.is_empty() {
            out.push_str("<td colspan=\"5\">no comparable metrics</td></tr>\n");
            continue;
        }
        for (idx, metric) in rows.iter().enumerate() {
            if idx > 0 {
                let _ = write!(out, "<tr class=\"{class}\">");
            }
            let _ = writeln!(
                out,
                "<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                metric.metric,
                format_value(metric.reference),
                format_value(metric.target),
                format_value(metric.delta),
                metric
                    .relative
                    .map(|r| format!("{:+.1}%", r * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn change_class(change: ChangeType) -> &'static str {
    match change {
        ChangeType::Added => "added",
        ChangeType::Removed => "removed",
        ChangeType::Shifted => "shifted",
        ChangeType::Unchanged => "unchanged",
    }
}

fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "-".to_string())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
