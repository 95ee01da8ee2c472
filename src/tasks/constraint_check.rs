use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::constraints::{render_report, ConstraintOutcome, ConstraintSet, ConstraintsBuilder, MetricConstraint};
use crate::profile::IoRegistry;
use crate::tasks::{Task, TaskError, DEFAULT_READER};

/// Where the constraint set comes from. Exactly one mode per task.
#[derive(Debug, Clone)]
pub enum ConstraintSource {
    Resolved(ConstraintSet),
    Profile {
        location: String,
        reader: String,
        constraint: MetricConstraint,
    },
}

/// Loose, optional-field form of a check definition, validated by
/// [`ConstraintCheckTask::from_config`].
#[derive(Debug, Clone, Default)]
pub struct ConstraintCheckConfig {
    pub task_id: String,
    pub profile_path: Option<String>,
    pub reader: Option<String>,
    pub constraint: Option<MetricConstraint>,
    pub constraints: Option<ConstraintSet>,
    pub break_pipeline: bool,
}

impl ConstraintCheckConfig {
    /// Check definition for a profile at `location`. A single constraint is
    /// checked in profile mode; several are resolved against one read of the
    /// profile.
    pub async fn for_profile(
        task_id: impl Into<String>,
        location: impl Into<String>,
        reader: impl Into<String>,
        constraints: Vec<MetricConstraint>,
        break_pipeline: bool,
        registry: &IoRegistry,
    ) -> Result<Self> {
        let location = location.into();
        let reader = reader.into();
        let mut config = Self {
            task_id: task_id.into(),
            profile_path: Some(location.clone()),
            reader: Some(reader.clone()),
            break_pipeline,
            ..Self::default()
        };

        if constraints.len() > 1 {
            let profile = registry.reader(&reader)?.read(&location).await?;
            let mut builder = ConstraintsBuilder::new(profile);
            builder.add_constraints(constraints);
            config.constraints = Some(builder.build());
        } else {
            config.constraint = constraints.into_iter().next();
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub task_id: String,
    pub passed: bool,
    pub outcomes: Vec<ConstraintOutcome>,
    pub report: String,
}

pub struct ConstraintCheckTask {
    task_id: String,
    source: ConstraintSource,
    break_pipeline: bool,
    registry: Arc<IoRegistry>,
}

impl ConstraintCheckTask {
    pub fn new(
        task_id: impl Into<String>,
        source: ConstraintSource,
        break_pipeline: bool,
        registry: Arc<IoRegistry>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            source,
            break_pipeline,
            registry,
        }
    }

    /// A pre-built set takes precedence over a profile path and constraint.
    pub fn from_config(
        config: ConstraintCheckConfig,
        registry: Arc<IoRegistry>,
    ) -> Result<Self, TaskError> {
        let source = match (config.constraints, config.profile_path, config.constraint) {
            (Some(set), _, _) => ConstraintSource::Resolved(set),
            (None, Some(location), Some(constraint)) => ConstraintSource::Profile {
                location,
                reader: config.reader.unwrap_or_else(|| DEFAULT_READER.to_string()),
                constraint,
            },
            _ => {
                return Err(TaskError::MissingConstraints {
                    task_id: config.task_id,
                })
            }
        };
        Ok(Self::new(
            config.task_id,
            source,
            config.break_pipeline,
            registry,
        ))
    }

    pub fn source(&self) -> &ConstraintSource {
        &self.source
    }

    async fn resolve_constraints(&self) -> Result<Cow<'_, ConstraintSet>> {
        match &self.source {
            ConstraintSource::Resolved(set) => Ok(Cow::Borrowed(set)),
            ConstraintSource::Profile {
                location,
                reader,
                constraint,
            } => {
                debug!(task_id = %self.task_id, %location, %reader, "reading profile");
                let profile = self.registry.reader(reader)?.read(location).await?;
                let mut builder = ConstraintsBuilder::new(profile);
                builder.add_constraint(constraint.clone());
                Ok(Cow::Owned(builder.build()))
            }
        }
    }

    /// Evaluates the set once and logs the report at a level matching the
    /// result. Escalated failures return [`TaskError::ConstraintsNotMet`].
    pub async fn run(&self) -> Result<CheckOutcome> {
        let set = self.resolve_constraints().await?;
        let outcomes = set.outcomes();
        let passed = outcomes.iter().all(|o| o.passed);
        let report = render_report(&set.profile().dataset, &outcomes);

        if !passed && self.break_pipeline {
            error!(task_id = %self.task_id, "{report}");
            return Err(TaskError::ConstraintsNotMet {
                task_id: self.task_id.clone(),
            }
            .into());
        }
        if passed {
            info!(task_id = %self.task_id, "{report}");
        } else {
            warn!(task_id = %self.task_id, "{report}");
        }

        Ok(CheckOutcome {
            task_id: self.task_id.clone(),
            passed,
            outcomes,
            report,
        })
    }
}

#[async_trait]
impl Task for ConstraintCheckTask {
    type Output = bool;

    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn execute(&self) -> Result<bool> {
        Ok(self.run().await?.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{greater_than_number, smaller_than_number};
    use crate::profile::{ColumnSummary, ProfileView};

    fn resolved_set() -> ConstraintSet {
        let mut builder = ConstraintsBuilder::new(
            ProfileView::new("d").with_column("a", ColumnSummary::numeric(3, 0, 2.0, 1.0, 3.0)),
        );
        builder.add_constraint(greater_than_number("a", 0.0));
        builder.build()
    }

    #[test]
    fn rejects_config_without_any_input_mode() {
        let config = ConstraintCheckConfig {
            task_id: "empty".to_string(),
            profile_path: Some("data/profile.json".to_string()),
            ..ConstraintCheckConfig::default()
        };
        let err = ConstraintCheckTask::from_config(config, Arc::new(IoRegistry::local_only()))
            .err()
            .expect("missing constraint must be rejected");
        assert_eq!(
            err,
            TaskError::MissingConstraints {
                task_id: "empty".to_string()
            }
        );
    }

    #[test]
    fn prefers_resolved_set_and_defaults_reader() {
        let registry = Arc::new(IoRegistry::local_only());
        let both = ConstraintCheckConfig {
            task_id: "both".to_string(),
            profile_path: Some("data/profile.json".to_string()),
            constraint: Some(greater_than_number("a", 0.0)),
            constraints: Some(resolved_set()),
            ..ConstraintCheckConfig::default()
        };
        let task = ConstraintCheckTask::from_config(both, Arc::clone(&registry)).expect("valid");
        assert!(matches!(task.source(), ConstraintSource::Resolved(_)));

        let profile_only = ConstraintCheckConfig {
            task_id: "profile".to_string(),
            profile_path: Some("data/profile.json".to_string()),
            constraint: Some(greater_than_number("a", 0.0)),
            ..ConstraintCheckConfig::default()
        };
        let task = ConstraintCheckTask::from_config(profile_only, registry).expect("valid");
        match task.source() {
            ConstraintSource::Profile { reader, .. } => assert_eq!(reader, "local"),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_profile_constraint_is_not_read_up_front() {
        let registry = IoRegistry::local_only();
        let config = ConstraintCheckConfig::for_profile(
            "one",
            "does/not/exist.json",
            "local",
            vec![greater_than_number("a", 0.0)],
            true,
            &registry,
        )
        .await
        .expect("profile mode defers the read");
        assert!(config.constraints.is_none());
        assert_eq!(config.constraint, Some(greater_than_number("a", 0.0)));
        assert!(config.break_pipeline);

        let empty = ConstraintCheckConfig::for_profile("none", "p.json", "local", Vec::new(), false, &registry)
            .await
            .expect("no read needed");
        let err = ConstraintCheckTask::from_config(empty, Arc::new(registry))
            .err()
            .expect("nothing to check");
        assert_eq!(err, TaskError::MissingConstraints { task_id: "none".to_string() });
    }

    #[tokio::test]
    async fn several_constraints_resolve_against_one_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profile.json");
        let profile = ProfileView::new("d").with_column("a", ColumnSummary::numeric(3, 0, 2.0, 1.0, 3.0));
        std::fs::write(&path, serde_json::to_vec(&profile).expect("encode")).expect("write profile");

        let registry = IoRegistry::local_only();
        let config = ConstraintCheckConfig::for_profile(
            "many",
            path.to_string_lossy(),
            "local",
            vec![greater_than_number("a", 0.0), smaller_than_number("a", 10.0)],
            false,
            &registry,
        )
        .await
        .expect("profile is readable");
        let set = config.constraints.as_ref().expect("resolved set");
        assert_eq!(set.constraints().len(), 2);
        assert!(set.validate());

        let task = ConstraintCheckTask::from_config(config, Arc::new(registry)).expect("valid");
        assert!(matches!(task.source(), ConstraintSource::Resolved(_)));
    }

    #[tokio::test]
    async fn unknown_reader_fails_before_evaluation() {
        let task = ConstraintCheckTask::new(
            "remote",
            ConstraintSource::Profile {
                location: "s3://bucket/profile.json".to_string(),
                reader: "s3".to_string(),
                constraint: greater_than_number("a", 0.0),
            },
            false,
            Arc::new(IoRegistry::local_only()),
        );
        let err = task.execute().await.expect_err("s3 is not registered");
        assert!(err.to_string().contains("unknown profile reader: s3"));
    }
}
