//! Sweep configuration
//!
//! Loaded from an optional YAML file and then overridden by command line
//! flags. Every field has a default so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::adapters::restart_annotation::AnnotationPolicy;
use crate::{Error, Result};

/// Pod name substring that marks a pod for remediation
pub const DEFAULT_MATCH_SIGNATURE: &str = "database";

/// Label key used for the deployment existence check
pub const DEFAULT_SELECTOR_LABEL: &str = "app";

/// Pod template annotation carrying the restart trigger
pub const DEFAULT_ANNOTATION_KEY: &str = "restart-timestamp";

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(Error::Config(format!(
                "logFormat must be one of: json, text (got {})",
                other
            ))),
        }
    }
}

/// Configuration for a single sweep run
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SweepConfig {
    /// Case-sensitive substring matched against pod names
    pub match_signature: String,

    /// Label key of the `key=<token>` selector used for the existence check
    pub selector_label: String,

    /// Annotation written on the pod template to trigger the rollout
    pub annotation_key: String,

    /// Whether the restart annotation replaces or merges into existing ones
    pub annotation_policy: AnnotationPolicy,

    /// Maximum matched pods remediated at once inside a namespace
    pub concurrency: usize,

    /// Resolve deployments but skip the update call
    pub dry_run: bool,

    /// Explicit kubeconfig path, defaults to ~/.kube/config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Write the Prometheus text exposition here after the sweep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_file: Option<PathBuf>,

    /// Log output format
    pub log_format: LogFormat,
}

/// Values set on the command line or through the environment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    pub kubeconfig: Option<PathBuf>,
    pub match_signature: Option<String>,
    pub selector_label: Option<String>,
    pub annotation_key: Option<String>,
    pub annotation_policy: Option<AnnotationPolicy>,
    pub concurrency: Option<usize>,
    pub dry_run: Option<bool>,
    pub metrics_file: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            match_signature: DEFAULT_MATCH_SIGNATURE.to_string(),
            selector_label: DEFAULT_SELECTOR_LABEL.to_string(),
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            annotation_policy: AnnotationPolicy::default(),
            concurrency: 1,
            dry_run: false,
            kubeconfig: None,
            metrics_file: None,
            log_format: LogFormat::default(),
        }
    }
}

impl SweepConfig {
    /// Load a config from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse a config from YAML text; an empty document yields the defaults
    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Layer command line and environment overrides on top of this config.
    ///
    /// Only the fields set in `overrides` change; both booleans can be
    /// forced either way.
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.kubeconfig {
            self.kubeconfig = Some(path);
        }
        if let Some(signature) = overrides.match_signature {
            self.match_signature = signature;
        }
        if let Some(label) = overrides.selector_label {
            self.selector_label = label;
        }
        if let Some(key) = overrides.annotation_key {
            self.annotation_key = key;
        }
        if let Some(policy) = overrides.annotation_policy {
            self.annotation_policy = policy;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(dry_run) = overrides.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(path) = overrides.metrics_file {
            self.metrics_file = Some(path);
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        self
    }

    /// Check the invariants the sweep relies on
    pub fn validate(&self) -> Result<()> {
        if self.match_signature.is_empty() {
            return Err(Error::Config("matchSignature cannot be empty".to_string()));
        }

        if self.selector_label.is_empty() {
            return Err(Error::Config("selectorLabel cannot be empty".to_string()));
        }

        if self.annotation_key.is_empty() {
            return Err(Error::Config("annotationKey cannot be empty".to_string()));
        }

        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be >= 1".to_string()));
        }

        Ok(())
    }
}
