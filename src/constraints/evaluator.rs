use crate::constraints::schema::MetricConstraint;
use crate::constraints::ConstraintOutcome;
use crate::profile::ProfileView;

pub fn evaluate_constraints(
    profile: &ProfileView,
    constraints: &[MetricConstraint],
) -> Vec<ConstraintOutcome> {
    constraints
        .iter()
        .map(|constraint| evaluate_constraint(profile, constraint))
        .collect()
}

pub fn evaluate_constraint(profile: &ProfileView, constraint: &MetricConstraint) -> ConstraintOutcome {
    let Some(column) = profile.column(&constraint.column) else {
        return ConstraintOutcome {
            name: constraint.name.clone(),
            column: constraint.column.clone(),
            metric: constraint.metric,
            observed: None,
            required: constraint.bound,
            passed: false,
            gap: None,
            note: Some(format!("column {} not present in profile", constraint.column)),
        };
    };

    match column.metric(constraint.metric) {
        Some(value) => {
            let gap = constraint.bound.gap(value);
            ConstraintOutcome {
                name: constraint.name.clone(),
                column: constraint.column.clone(),
                metric: constraint.metric,
                observed: Some(value),
                required: constraint.bound,
                passed: gap.is_none(),
                gap,
                note: None,
            }
        }
        None => ConstraintOutcome {
            name: constraint.name.clone(),
            column: constraint.column.clone(),
            metric: constraint.metric,
            observed: None,
            required: constraint.bound,
            passed: false,
            gap: None,
            note: Some(format!(
                "metric {} unavailable for column {}",
                constraint.metric, constraint.column
            )),
        },
    }
}
