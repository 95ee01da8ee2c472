use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ci_group::{CiEnvironment, MessageType, CI_INDICATOR_VAR, SKIP_GROUP_OUTPUT_VAR};
use crate::constraints::ConstraintSpec;
use crate::drift::DEFAULT_RELATIVE_THRESHOLD;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub constraints: ConstraintsConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub ci: CiConfig,
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
    #[serde(default)]
    pub drift_reports: Vec<DriftDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_reader")]
    pub reader: String,
    #[serde(default = "default_writer")]
    pub writer: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintsConfig {
    #[serde(default)]
    pub break_pipeline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_relative_threshold")]
    pub relative_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    #[serde(default = "default_indicator_var")]
    pub indicator_var: String,
    #[serde(default = "default_skip_var")]
    pub skip_var: String,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default)]
    pub group_message_type: MessageType,
}

/// One constraint-check task. A single constraint is checked against the
/// profile directly; several are bundled into one set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub task_id: String,
    pub profile_path: String,
    #[serde(default)]
    pub reader: Option<String>,
    #[serde(default)]
    pub break_pipeline: Option<bool>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftDefinition {
    pub task_id: String,
    pub target_profile_path: String,
    pub reference_profile_path: String,
    pub write_report_path: String,
    #[serde(default)]
    pub reader: Option<String>,
    #[serde(default)]
    pub writer: Option<String>,
    #[serde(default)]
    pub relative_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub reader: Option<String>,
    pub writer: Option<String>,
    pub break_pipeline: Option<bool>,
    pub relative_threshold: Option<f64>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("profile-gate/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        let mut parsed: Self = toml::from_str(data)?;
        parsed.expand_paths();
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(reader) = overrides.reader {
            self.storage.reader = reader;
        }
        if let Some(writer) = overrides.writer {
            self.storage.writer = writer;
        }
        if let Some(break_pipeline) = overrides.break_pipeline {
            self.constraints.break_pipeline = break_pipeline;
        }
        if let Some(threshold) = overrides.relative_threshold {
            self.drift.relative_threshold = threshold;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.http_timeout_secs)
    }

    pub fn ci_environment(&self) -> CiEnvironment {
        CiEnvironment::from_vars(&self.ci.indicator_var, &self.ci.skip_var)
    }

    fn expand_paths(&mut self) {
        for check in &mut self.checks {
            check.profile_path = expand_tilde_str(&check.profile_path);
        }
        for report in &mut self.drift_reports {
            report.target_profile_path = expand_tilde_str(&report.target_profile_path);
            report.reference_profile_path = expand_tilde_str(&report.reference_profile_path);
            report.write_report_path = expand_tilde_str(&report.write_report_path);
        }
    }

    pub fn default_template() -> String {
        let template = r#"[storage]
reader = "local"
writer = "local"
http_timeout_secs = 12

[constraints]
break_pipeline = false

[drift]
relative_threshold = 0.1

[ci]
indicator_var = "GITHUB_ACTIONS"
skip_var = "SKIP_GROUP_OUTPUT"
color = true
group_message_type = "info"

[[checks]]
task_id = "greater_than_check_a"
profile_path = "data/profile.json"
constraints = [
    { kind = "greater_than_number", column = "a", number = 0.0 },
]

[[checks]]
task_id = "avg_between_b"
profile_path = "data/profile.json"
break_pipeline = false
constraints = [
    { kind = "mean_between_range", column = "b", lower = 0.0, upper = 125.1261236210 },
]

[[drift_reports]]
task_id = "drift_report"
target_profile_path = "data/profile.json"
reference_profile_path = "data/reference_profile.json"
write_report_path = "data/Profile.html"
"#;
        template.to_string()
    }
}

/// Only `~/` prefixes and only for local paths; URIs pass through.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn expand_tilde_str(path: &str) -> String {
    if path.starts_with("~/") {
        expand_tilde(path).to_string_lossy().to_string()
    } else {
        path.to_string()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reader: default_reader(),
            writer: default_writer(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            relative_threshold: default_relative_threshold(),
        }
    }
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            indicator_var: default_indicator_var(),
            skip_var: default_skip_var(),
            color: true,
            group_message_type: MessageType::Info,
        }
    }
}

fn default_reader() -> String {
    "local".to_string()
}

fn default_writer() -> String {
    "local".to_string()
}

fn default_http_timeout_secs() -> u64 {
    12
}

fn default_relative_threshold() -> f64 {
    DEFAULT_RELATIVE_THRESHOLD
}

fn default_indicator_var() -> String {
    CI_INDICATOR_VAR.to_string()
}

fn default_skip_var() -> String {
    SKIP_GROUP_OUTPUT_VAR.to_string()
}

fn default_true() -> bool {
    true
}
