pub mod builder;
pub mod evaluator;
pub mod factories;
pub mod schema;

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::profile::ProfileView;

pub use builder::ConstraintsBuilder;
pub use factories::{
    greater_than_number, mean_between_range, no_missing_values, null_percentage_below_number,
    smaller_than_number, ConstraintSpec,
};
pub use schema::{Bound, ColumnMetric, ConstraintParseError, MetricConstraint};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintOutcome {
    pub name: String,
    pub column: String,
    pub metric: ColumnMetric,
    pub observed: Option<f64>,
    pub required: Bound,
    pub passed: bool,
    pub gap: Option<f64>,
    pub note: Option<String>,
}

/// Ordered constraints bound to a single profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    profile: ProfileView,
    constraints: Vec<MetricConstraint>,
}

impl ConstraintSet {
    pub fn new(profile: ProfileView, constraints: Vec<MetricConstraint>) -> Self {
        Self {
            profile,
            constraints,
        }
    }

    pub fn profile(&self) -> &ProfileView {
        &self.profile
    }

    pub fn constraints(&self) -> &[MetricConstraint] {
        &self.constraints
    }

    pub fn outcomes(&self) -> Vec<ConstraintOutcome> {
        evaluator::evaluate_constraints(&self.profile, &self.constraints)
    }

    pub fn validate(&self) -> bool {
        self.outcomes().iter().all(|o| o.passed)
    }

    pub fn report(&self) -> String {
        render_report(&self.profile.dataset, &self.outcomes())
    }
}

pub fn render_report(dataset: &str, outcomes: &[ConstraintOutcome]) -> String {
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let label = if dataset.is_empty() { "<unnamed>" } else { dataset };
    let mut out = format!(
        "Constraints report for dataset '{label}': {passed}/{} passed",
        outcomes.len()
    );
    for outcome in outcomes {
        let status = if outcome.passed { "PASS" } else { "FAIL" };
        let detail = match (&outcome.note, outcome.observed) {
            (Some(note), _) => note.clone(),
            (None, Some(value)) => match outcome.gap {
                Some(gap) => format!(
                    "{} = {value}, required {}, off by {gap}",
                    outcome.metric, outcome.required
                ),
                None => format!("{} = {value}, required {}", outcome.metric, outcome.required),
            },
            (None, None) => format!("{} unavailable", outcome.metric),
        };
        let _ = write!(out, "\n  [{status}] {} ({detail})", outcome.name);
    }
    out
}
