#![forbid(unsafe_code)]

//! Study configuration.
//!
//! One [`StudyConfig`] loaded from TOML or JSON at startup. Every section and
//! field has a default, so partial files are fine.
//!
//! ```toml
//! [form]
//! task_index = 1
//!
//! [sink]
//! enabled = true
//! file = "telemetry.log"
//! format = "delimited"
//!
//! [plan]
//! user_id = 17
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sink::{SinkConfig, SinkDestination, SinkFormat};
use crate::study_plan::StudyPlan;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Form parameters.
    pub form: FormConfig,
    /// Local telemetry capture.
    pub sink: SinkPolicyConfig,
    /// Session plan.
    pub plan: PlanConfig,
}

impl StudyConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validation messages; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.form.task_index < -1 {
            errors.push(format!(
                "form.task_index must be >= -1, got {}",
                self.form.task_index
            ));
        }
        if self.sink.file.as_deref().is_some_and(|f| f.trim().is_empty()) {
            errors.push("sink.file must not be blank".to_owned());
        }

        errors
    }

    /// Parse and validate in one step.
    pub fn from_toml_str_validated(s: &str) -> Result<Self, ConfigError> {
        let config = Self::from_toml_str(s)?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Build a [`SinkConfig`].
    #[must_use]
    pub fn to_sink_config(&self) -> SinkConfig {
        SinkConfig {
            enabled: self.sink.enabled,
            destination: match &self.sink.file {
                Some(path) => SinkDestination::File(path.into()),
                None => SinkDestination::Stdout,
            },
            format: self.sink.format,
            flush_on_write: self.sink.flush_on_write,
        }
    }

    /// Session plan for the configured subject, if one is set.
    #[must_use]
    pub fn to_study_plan(&self) -> Option<StudyPlan> {
        self.plan.user_id.map(StudyPlan::new)
    }
}

/// Form parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Task index reported on task completion. Default: 0.
    pub task_index: i32,
}

/// Telemetry sink parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkPolicyConfig {
    /// Default: false.
    pub enabled: bool,
    /// File path; None → stdout. Default: None.
    pub file: Option<String>,
    /// Default: jsonl.
    pub format: SinkFormat,
    /// Default: true.
    pub flush_on_write: bool,
}

impl Default for SinkPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file: None,
            format: SinkFormat::Jsonl,
            flush_on_write: true,
        }
    }
}

/// Session plan parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Subject identifier; selects the counterbalancing row.
    pub user_id: Option<u32>,
}

/// Errors loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_validates_clean() {
        let errors = StudyConfig::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StudyConfig::from_toml_str("[form]\ntask_index = 1\n").unwrap();
        assert_eq!(config.form.task_index, 1);
        assert_eq!(config.sink, SinkPolicyConfig::default());
        assert_eq!(config.plan.user_id, None);
    }

    #[test]
    fn full_toml() {
        let config = StudyConfig::from_toml_str(
            r#"
            [form]
            task_index = -1

            [sink]
            enabled = true
            file = "out.log"
            format = "delimited"
            flush_on_write = false

            [plan]
            user_id = 17
            "#,
        )
        .unwrap();
        assert!(config.validate().is_empty());

        let sink = config.to_sink_config();
        assert!(sink.enabled);
        assert_eq!(sink.destination, SinkDestination::File(PathBuf::from("out.log")));
        assert_eq!(sink.format, SinkFormat::Delimited);
        assert!(!sink.flush_on_write);

        let plan = config.to_study_plan().unwrap();
        assert_eq!(plan.user_id(), 17);
        assert_eq!(plan.counterbalancing_index(), 1);
    }

    #[test]
    fn json_is_accepted() {
        let config =
            StudyConfig::from_json_str(r#"{"sink":{"enabled":true},"plan":{"user_id":2}}"#)
                .unwrap();
        assert!(config.sink.enabled);
        assert_eq!(config.to_sink_config().destination, SinkDestination::Stdout);
        assert_eq!(config.plan.user_id, Some(2));
    }

    #[test]
    fn validate_catches_bad_values() {
        let mut config = StudyConfig::default();
        config.form.task_index = -5;
        config.sink.file = Some("  ".into());
        let errors = config.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn validated_loader_reports_messages() {
        let err = StudyConfig::from_toml_str_validated("[form]\ntask_index = -3\n").unwrap_err();
        match err {
            ConfigError::Validation(msgs) => assert!(msgs[0].contains("task_index")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = StudyConfig::from_toml_str("[form\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(err.to_string().starts_with("TOML parse error"));
    }

    #[test]
    fn files_load() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("study.toml");
        std::fs::write(&toml_path, "[plan]\nuser_id = 3\n").unwrap();
        assert_eq!(
            StudyConfig::from_toml_file(&toml_path).unwrap().plan.user_id,
            Some(3)
        );

        let json_path = dir.path().join("study.json");
        std::fs::write(&json_path, r#"{"form":{"task_index":2}}"#).unwrap();
        assert_eq!(
            StudyConfig::from_json_file(&json_path).unwrap().form.task_index,
            2
        );

        let missing = StudyConfig::from_toml_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
