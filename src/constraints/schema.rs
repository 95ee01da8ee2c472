use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMetric {
    Count,
    NullCount,
    NullRatio,
    Mean,
    Stddev,
    Min,
    Max,
    Distinct,
}

impl ColumnMetric {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::NullCount => "null_count",
            Self::NullRatio => "null_ratio",
            Self::Mean => "mean",
            Self::Stddev => "stddev",
            Self::Min => "min",
            Self::Max => "max",
            Self::Distinct => "distinct",
        }
    }
}

impl Display for ColumnMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown column metric: {0}")]
pub struct MetricParseError(pub String);

impl FromStr for ColumnMetric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "count" | "n" => Ok(Self::Count),
            "null_count" | "nulls" => Ok(Self::NullCount),
            "null_ratio" | "null_percentage" | "null_pct" => Ok(Self::NullRatio),
            "mean" | "avg" | "average" => Ok(Self::Mean),
            "stddev" | "std" | "stdev" => Ok(Self::Stddev),
            "min" | "minimum" => Ok(Self::Min),
            "max" | "maximum" => Ok(Self::Max),
            "distinct" | "cardinality" | "unique" => Ok(Self::Distinct),
            _ => Err(MetricParseError(s.to_string())),
        }
    }
}

/// Accepted region for a metric value. `Min`, `Max` and `Range` are
/// inclusive; `GreaterThan` and `LessThan` are strict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Min(f64),
    Max(f64),
    Range { min: f64, max: f64 },
    GreaterThan(f64),
    LessThan(f64),
}

impl Bound {
    pub fn holds(&self, value: f64) -> bool {
        match *self {
            Bound::Min(min) => value >= min,
            Bound::Max(max) => value <= max,
            Bound::Range { min, max } => (min..=max).contains(&value),
            Bound::GreaterThan(lower) => value > lower,
            Bound::LessThan(upper) => value < upper,
        }
    }

    /// Distance from `value` to the nearest accepted edge, `None` when it holds.
    pub fn gap(&self, value: f64) -> Option<f64> {
        if self.holds(value) {
            return None;
        }
        let gap = match *self {
            Bound::Min(edge) | Bound::GreaterThan(edge) => edge - value,
            Bound::Max(edge) | Bound::LessThan(edge) => value - edge,
            Bound::Range { min, max } => {
                if value < min {
                    min - value
                } else {
                    value - max
                }
            }
        };
        Some(gap.abs())
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Min(v) => write!(f, ">= {v}"),
            Bound::Max(v) => write!(f, "<= {v}"),
            Bound::Range { min, max } => write!(f, "[{min}, {max}]"),
            Bound::GreaterThan(v) => write!(f, "> {v}"),
            Bound::LessThan(v) => write!(f, "< {v}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricConstraint {
    pub name: String,
    pub column: String,
    pub metric: ColumnMetric,
    pub bound: Bound,
}

impl MetricConstraint {
    pub fn new(column: impl Into<String>, metric: ColumnMetric, bound: Bound) -> Self {
        let column = column.into();
        Self {
            name: format!("{column} {metric} {bound}"),
            column,
            metric,
            bound,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintParseError {
    #[error("constraint expression is missing a comparison operator: {0}")]
    MissingOperator(String),
    #[error("constraint expression must look like <column>.<metric>: {0}")]
    MissingMetric(String),
    #[error("unknown column metric in constraint expression: {0}")]
    UnknownMetric(String),
    #[error("invalid number in constraint expression: {0}")]
    InvalidNumber(String),
}

/// Parses compact expressions such as `a.min>0`, `b.null_ratio<=0.05` or
/// `s3.mean=-1.5..1.5` (inclusive range).
impl FromStr for MetricConstraint {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (lhs, op, rhs) = split_operator(raw)
            .ok_or_else(|| ConstraintParseError::MissingOperator(raw.to_string()))?;
        let (column, metric_raw) = lhs
            .trim()
            .rsplit_once('.')
            .filter(|(column, _)| !column.is_empty())
            .ok_or_else(|| ConstraintParseError::MissingMetric(raw.to_string()))?;
        let metric = ColumnMetric::from_str(metric_raw)
            .map_err(|_| ConstraintParseError::UnknownMetric(metric_raw.trim().to_string()))?;
        let rhs = rhs.trim();
        let bound = match op {
            ">=" => Bound::Min(parse_number(rhs)?),
            "<=" => Bound::Max(parse_number(rhs)?),
            ">" => Bound::GreaterThan(parse_number(rhs)?),
            "<" => Bound::LessThan(parse_number(rhs)?),
            _ => match rhs.split_once("..") {
                Some((lo, hi)) => Bound::Range {
                    min: parse_number(lo)?,
                    max: parse_number(hi)?,
                },
                None => {
                    let exact = parse_number(rhs)?;
                    Bound::Range {
                        min: exact,
                        max: exact,
                    }
                }
            },
        };
        Ok(MetricConstraint::new(column.trim(), metric, bound))
    }
}

fn split_operator(raw: &str) -> Option<(&str, &'static str, &str)> {
    for op in [">=", "<=", ">", "<", "="] {
        if let Some((lhs, rhs)) = raw.split_once(op) {
            return Some((lhs, op, rhs));
        }
    }
    None
}

fn parse_number(raw: &str) -> Result<f64, ConstraintParseError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConstraintParseError::InvalidNumber(raw.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metric_aliases() {
        assert_eq!("AVG".parse::<ColumnMetric>().ok(), Some(ColumnMetric::Mean));
        assert_eq!(
            "null-percentage".parse::<ColumnMetric>().ok(),
            Some(ColumnMetric::NullRatio)
        );
        assert!("median".parse::<ColumnMetric>().is_err());
    }

    #[test]
    fn parses_compact_constraint_expressions() {
        let min: MetricConstraint = "a.min>0".parse().expect("parse min");
        assert_eq!(min.column, "a");
        assert_eq!(min.metric, ColumnMetric::Min);
        assert_eq!(min.bound, Bound::GreaterThan(0.0));

        let range: MetricConstraint = "s3.mean=-1.5..1.5".parse().expect("parse range");
        assert_eq!(range.bound, Bound::Range { min: -1.5, max: 1.5 });

        let dotted: MetricConstraint = "user.age.max<=120".parse().expect("parse dotted");
        assert_eq!(dotted.column, "user.age");
        assert_eq!(dotted.bound, Bound::Max(120.0));
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(matches!(
            "a.mean".parse::<MetricConstraint>(),
            Err(ConstraintParseError::MissingOperator(_))
        ));
        assert!(matches!(
            "mean>1".parse::<MetricConstraint>(),
            Err(ConstraintParseError::MissingMetric(_))
        ));
        assert!(matches!(
            "a.median>1".parse::<MetricConstraint>(),
            Err(ConstraintParseError::UnknownMetric(_))
        ));
        assert!(matches!(
            "a.mean>one".parse::<MetricConstraint>(),
            Err(ConstraintParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn gap_measures_distance_to_nearest_edge() {
        let range = Bound::Range { min: 0.0, max: 10.0 };
        assert_eq!(range.gap(5.0), None);
        assert_eq!(range.gap(-2.0), Some(2.0));
        assert_eq!(range.gap(13.0), Some(3.0));
        assert_eq!(Bound::GreaterThan(0.0).gap(0.0), Some(0.0));
        assert_eq!(Bound::LessThan(1.0).gap(4.0), Some(3.0));
    }
}
