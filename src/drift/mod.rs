pub mod render;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constraints::ColumnMetric;
use crate::profile::{ColumnSummary, ProfileView};

pub use render::{render_report, ReportFormat};

pub const DEFAULT_RELATIVE_THRESHOLD: f64 = 0.1;

const COMPARED_METRICS: [ColumnMetric; 7] = [
    ColumnMetric::Count,
    ColumnMetric::NullRatio,
    ColumnMetric::Mean,
    ColumnMetric::Stddev,
    ColumnMetric::Min,
    ColumnMetric::Max,
    ColumnMetric::Distinct,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDriftReport {
    pub reference_dataset: String,
    pub target_dataset: String,
    pub generated_at: DateTime<Utc>,
    pub reference_fingerprint: String,
    pub target_fingerprint: String,
    pub relative_threshold: f64,
    pub columns: Vec<ColumnDrift>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column: String,
    pub change_type: ChangeType,
    pub metrics: Vec<MetricDelta>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Shifted,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDelta {
    pub metric: ColumnMetric,
    pub reference: Option<f64>,
    pub target: Option<f64>,
    pub delta: Option<f64>,
    pub relative: Option<f64>,
    pub exceeds_threshold: bool,
}

impl SummaryDriftReport {
    pub fn build(reference: &ProfileView, target: &ProfileView, relative_threshold: f64) -> Self {
        let mut names = BTreeSet::new();
        names.extend(reference.columns.keys().cloned());
        names.extend(target.columns.keys().cloned());

        let columns = names
            .into_iter()
            .map(|name| {
                compare_column(
                    name.clone(),
                    reference.column(&name),
                    target.column(&name),
                    relative_threshold,
                )
            })
            .collect();

        Self {
            reference_dataset: reference.dataset.clone(),
            target_dataset: target.dataset.clone(),
            generated_at: Utc::now(),
            reference_fingerprint: reference.fingerprint(),
            target_fingerprint: target.fingerprint(),
            relative_threshold,
            columns,
        }
    }

    pub fn identical_profiles(&self) -> bool {
        self.reference_fingerprint == self.target_fingerprint
    }

    pub fn drifted_columns(&self) -> impl Iterator<Item = &ColumnDrift> {
        self.columns
            .iter()
            .filter(|c| c.change_type != ChangeType::Unchanged)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDrift> {
        self.columns.iter().find(|c| c.column == name)
    }
}

pub fn compare_column(
    column: String,
    reference: Option<&ColumnSummary>,
    target: Option<&ColumnSummary>,
    relative_threshold: f64,
) -> ColumnDrift {
    let metrics: Vec<MetricDelta> = COMPARED_METRICS
        .iter()
        .map(|metric| {
            metric_delta(
                *metric,
                reference.and_then(|r| r.metric(*metric)),
                target.and_then(|t| t.metric(*metric)),
                relative_threshold,
            )
        })
        .collect();

    let change_type = match (reference, target) {
        (None, Some(_)) => ChangeType::Added,
        (Some(_), None) => ChangeType::Removed,
        (Some(r), Some(t)) if r.inferred_type != t.inferred_type => ChangeType::Shifted,
        _ if metrics.iter().any(|m| m.exceeds_threshold) => ChangeType::Shifted,
        _ => ChangeType::Unchanged,
    };

    ColumnDrift {
        column,
        change_type,
        metrics,
    }
}

/// Relative change is measured against the reference value; a zero reference
/// falls back to the absolute delta. A metric present on only one side always
/// counts as drift.
pub fn metric_delta(
    metric: ColumnMetric,
    reference: Option<f64>,
    target: Option<f64>,
    relative_threshold: f64,
) -> MetricDelta {
    let (delta, relative, exceeds_threshold) = match (reference, target) {
        (Some(r), Some(t)) => {
            let delta = t - r;
            if r == 0.0 {
                (Some(delta), None, delta.abs() > relative_threshold)
            } else {
                let relative = delta / r.abs();
                (Some(delta), Some(relative), relative.abs() > relative_threshold)
            }
        }
        (Some(_), None) | (None, Some(_)) => (None, None, true),
        (None, None) => (None, None, false),
    };

    MetricDelta {
        metric,
        reference,
        target,
        delta,
        relative,
        exceeds_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ProfileView {
        ProfileView::new("reference")
            .with_column("a", ColumnSummary::numeric(100, 0, 10.0, 0.0, 20.0))
            .with_column("b", ColumnSummary::numeric(100, 0, 5.0, 1.0, 9.0))
            .with_column("gone", ColumnSummary::numeric(100, 0, 1.0, 1.0, 1.0))
    }

    fn target() -> ProfileView {
        ProfileView::new("target")
            .with_column("a", ColumnSummary::numeric(100, 0, 10.5, 0.0, 20.0))
            .with_column("b", ColumnSummary::numeric(100, 0, 8.0, 1.0, 9.0))
            .with_column("new", ColumnSummary::numeric(100, 0, 1.0, 1.0, 1.0))
    }

    #[test]
    fn classifies_added_removed_and_shifted_columns() {
        let report = SummaryDriftReport::build(&reference(), &target(), 0.1);
        let kinds: Vec<_> = report
            .columns
            .iter()
            .map(|c| (c.column.as_str(), c.change_type))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("a", ChangeType::Unchanged),
                ("b", ChangeType::Shifted),
                ("gone", ChangeType::Removed),
                ("new", ChangeType::Added),
            ]
        );
        assert_eq!(report.drifted_columns().count(), 3);
        assert!(!report.identical_profiles());
    }

    #[test]
    fn identical_profiles_have_no_drift() {
        let report = SummaryDriftReport::build(&reference(), &reference(), 0.1);
        assert!(report.identical_profiles());
        assert_eq!(report.drifted_columns().count(), 0);
    }

    #[test]
    fn zero_reference_uses_absolute_delta() {
        let small = metric_delta(ColumnMetric::Mean, Some(0.0), Some(0.05), 0.1);
        assert!(small.relative.is_none());
        assert!(!small.exceeds_threshold);

        let large = metric_delta(ColumnMetric::Mean, Some(0.0), Some(0.5), 0.1);
        assert!(large.exceeds_threshold);

        let absent = metric_delta(ColumnMetric::Stddev, None, None, 0.1);
        assert!(absent.delta.is_none());
        assert!(!absent.exceeds_threshold);
    }

    #[test]
    fn metric_on_one_side_only_is_drift() {
        let appeared = metric_delta(ColumnMetric::Stddev, None, Some(1.0), 0.1);
        assert!(appeared.delta.is_none());
        assert!(appeared.exceeds_threshold);

        let reference = ProfileView::new("reference")
            .with_column("d", ColumnSummary::numeric(50, 0, 3.0, 1.0, 5.0));
        let target = ProfileView::new("target").with_column(
            "d",
            ColumnSummary::numeric(50, 0, 3.0, 1.0, 5.0).with_distinct(5.0),
        );
        let report = SummaryDriftReport::build(&reference, &target, 0.1);
        let column = report.column("d").expect("column d");
        assert_eq!(column.change_type, ChangeType::Shifted);
        let drifted: Vec<_> = column
            .metrics
            .iter()
            .filter(|m| m.exceeds_threshold)
            .map(|m| m.metric)
            .collect();
        assert_eq!(drifted, vec![ColumnMetric::Distinct]);
    }

    #[test]
    fn numeric_column_turning_into_strings_is_shifted() {
        let reference = ProfileView::new("reference")
            .with_column("x", ColumnSummary::numeric(10, 0, 5.0, 1.0, 9.0));
        let target = ProfileView::new("target").with_column(
            "x",
            ColumnSummary {
                count: 10,
                inferred_type: Some("string".to_string()),
                ..ColumnSummary::default()
            },
        );
        let report = SummaryDriftReport::build(&reference, &target, 0.1);
        let column = report.column("x").expect("column x");
        assert_eq!(column.change_type, ChangeType::Shifted);
        assert!(column
            .metrics
            .iter()
            .filter(|m| matches!(m.metric, ColumnMetric::Mean | ColumnMetric::Min | ColumnMetric::Max))
            .all(|m| m.exceeds_threshold));
        assert_eq!(report.drifted_columns().count(), 1);
    }

    #[test]
    fn type_change_alone_is_shifted() {
        let reference = ProfileView::new("reference").with_column(
            "id",
            ColumnSummary {
                count: 4,
                inferred_type: Some("integral".to_string()),
                ..ColumnSummary::default()
            },
        );
        let target = ProfileView::new("target").with_column(
            "id",
            ColumnSummary {
                count: 4,
                inferred_type: Some("string".to_string()),
                ..ColumnSummary::default()
            },
        );
        let report = SummaryDriftReport::build(&reference, &target, 0.1);
        assert_eq!(report.column("id").map(|c| c.change_type), Some(ChangeType::Shifted));
    }
}
