pub mod reader;
pub mod registry;
pub mod writer;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constraints::ColumnMetric;

pub use reader::{HttpReader, LocalReader, ProfileReader};
pub use registry::{IoRegistry, RegistryError};
pub use writer::{LocalWriter, ReportWriter};

/// Statistical summary of a dataset, produced elsewhere and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileView {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub columns: BTreeMap<String, ColumnSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnSummary {
    pub count: u64,
    #[serde(default)]
    pub null_count: u64,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub stddev: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub distinct_estimate: Option<f64>,
    #[serde(default)]
    pub inferred_type: Option<String>,
}

impl ProfileView {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            created_at: None,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, summary: ColumnSummary) -> Self {
        self.columns.insert(name.into(), summary);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.get(name)
    }

    pub fn metric(&self, column: &str, metric: ColumnMetric) -> Option<f64> {
        self.column(column)?.metric(metric)
    }

    /// Hex SHA-256 of the canonical JSON encoding of the column summaries.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(&self.columns).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl ColumnSummary {
    pub fn numeric(count: u64, null_count: u64, mean: f64, min: f64, max: f64) -> Self {
        Self {
            count,
            null_count,
            mean: Some(mean),
            min: Some(min),
            max: Some(max),
            inferred_type: Some("fractional".to_string()),
            ..Self::default()
        }
    }

    pub fn with_stddev(mut self, stddev: f64) -> Self {
        self.stddev = Some(stddev);
        self
    }

    pub fn with_distinct(mut self, distinct: f64) -> Self {
        self.distinct_estimate = Some(distinct);
        self
    }

    pub fn null_ratio(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.null_count as f64 / self.count as f64)
    }

    pub fn metric(&self, metric: ColumnMetric) -> Option<f64> {
        match metric {
            ColumnMetric::Count => Some(self.count as f64),
            ColumnMetric::NullCount => Some(self.null_count as f64),
            ColumnMetric::NullRatio => self.null_ratio(),
            ColumnMetric::Mean => self.mean,
            ColumnMetric::Stddev => self.stddev,
            ColumnMetric::Min => self.min,
            ColumnMetric::Max => self.max,
            ColumnMetric::Distinct => self.distinct_estimate,
        }
    }
}
