use crate::constraints::schema::MetricConstraint;
use crate::constraints::ConstraintSet;
use crate::profile::ProfileView;

pub struct ConstraintsBuilder {
    profile: ProfileView,
    constraints: Vec<MetricConstraint>,
}

impl ConstraintsBuilder {
    pub fn new(profile: ProfileView) -> Self {
        Self {
            profile,
            constraints: Vec::new(),
        }
    }

    pub fn add_constraint(&mut self, constraint: MetricConstraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn add_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = MetricConstraint>,
    ) -> &mut Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn build(self) -> ConstraintSet {
        ConstraintSet::new(self.profile, self.constraints)
    }
}
