use serde::{Deserialize, Serialize};

use crate::constraints::schema::{Bound, ColumnMetric, MetricConstraint};

/// Column minimum strictly greater than `number`.
pub fn greater_than_number(column: &str, number: f64) -> MetricConstraint {
    MetricConstraint::new(column, ColumnMetric::Min, Bound::GreaterThan(number))
        .named(format!("{column} greater than number {number}"))
}

/// Column maximum strictly smaller than `number`.
pub fn smaller_than_number(column: &str, number: f64) -> MetricConstraint {
    MetricConstraint::new(column, ColumnMetric::Max, Bound::LessThan(number))
        .named(format!("{column} smaller than number {number}"))
}

pub fn mean_between_range(column: &str, lower: f64, upper: f64) -> MetricConstraint {
    MetricConstraint::new(
        column,
        ColumnMetric::Mean,
        Bound::Range {
            min: lower,
            max: upper,
        },
    )
    .named(format!(
        "{column} mean between {lower} and {upper} (inclusive)"
    ))
}

/// Null ratio (0..=1) at or below `number`.
pub fn null_percentage_below_number(column: &str, number: f64) -> MetricConstraint {
    MetricConstraint::new(column, ColumnMetric::NullRatio, Bound::Max(number))
        .named(format!("{column} null percentage below {number}"))
}

pub fn no_missing_values(column: &str) -> MetricConstraint {
    MetricConstraint::new(column, ColumnMetric::NullCount, Bound::Max(0.0))
        .named(format!("{column} has no missing values"))
}

/// Declarative form of a constraint as it appears in pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintSpec {
    GreaterThanNumber {
        column: String,
        number: f64,
    },
    SmallerThanNumber {
        column: String,
        number: f64,
    },
    MeanBetweenRange {
        column: String,
        lower: f64,
        upper: f64,
    },
    NullPercentageBelowNumber {
        column: String,
        number: f64,
    },
    NoMissingValues {
        column: String,
    },
    Metric {
        #[serde(default)]
        name: Option<String>,
        column: String,
        metric: ColumnMetric,
        bound: Bound,
    },
}

impl ConstraintSpec {
    pub fn build(&self) -> MetricConstraint {
        match self {
            Self::GreaterThanNumber { column, number } => greater_than_number(column, *number),
            Self::SmallerThanNumber { column, number } => smaller_than_number(column, *number),
            Self::MeanBetweenRange {
                column,
                lower,
                upper,
            } => mean_between_range(column, *lower, *upper),
            Self::NullPercentageBelowNumber { column, number } => {
                null_percentage_below_number(column, *number)
            }
            Self::NoMissingValues { column } => no_missing_values(column),
            Self::Metric {
                name,
                column,
                metric,
                bound,
            } => {
                let constraint = MetricConstraint::new(column.as_str(), *metric, *bound);
                match name {
                    Some(name) => constraint.named(name.as_str()),
                    None => constraint,
                }
            }
        }
    }
}
