//! Command line interface
//!
//! Flags and environment variables take precedence over the YAML file,
//! which takes precedence over the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::adapters::restart_annotation::AnnotationPolicy;
use crate::config::{ConfigOverrides, LogFormat, SweepConfig};
use crate::Result;

/// Restart deployments whose pods match a name signature
#[derive(Debug, Parser)]
#[command(name = "database-restart-sweeper", version, about)]
pub struct Cli {
    /// YAML config file
    #[arg(short, long, env = "SWEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Kubeconfig path, defaults to ~/.kube/config
    #[arg(long, env = "KUBECONFIG_PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Pod name substring selecting pods for remediation
    #[arg(long, env = "SWEEPER_MATCH_SIGNATURE")]
    pub match_signature: Option<String>,

    /// Label key of the deployment existence check
    #[arg(long, env = "SWEEPER_SELECTOR_LABEL")]
    pub selector_label: Option<String>,

    /// Pod template annotation carrying the restart timestamp
    #[arg(long, env = "SWEEPER_ANNOTATION_KEY")]
    pub annotation_key: Option<String>,

    /// How the restart annotation is applied: replace or merge
    #[arg(long, env = "SWEEPER_ANNOTATION_POLICY")]
    pub annotation_policy: Option<AnnotationPolicy>,

    /// Matched pods remediated at once inside a namespace
    #[arg(long, env = "SWEEPER_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Resolve deployments without updating them (`--dry-run=false` to force off)
    #[arg(
        long,
        env = "SWEEPER_DRY_RUN",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub dry_run: Option<bool>,

    /// Write Prometheus metrics to this file after the sweep
    #[arg(long, env = "SWEEPER_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,

    /// Log format: json or text
    #[arg(long, env = "SWEEPER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Overrides carried by the flags and environment
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            kubeconfig: self.kubeconfig.clone(),
            match_signature: self.match_signature.clone(),
            selector_label: self.selector_label.clone(),
            annotation_key: self.annotation_key.clone(),
            annotation_policy: self.annotation_policy,
            concurrency: self.concurrency,
            dry_run: self.dry_run,
            metrics_file: self.metrics_file.clone(),
            log_format: self.log_format,
        }
    }

    /// Load the YAML file if any, apply the overrides and validate
    pub fn into_config(self) -> Result<SweepConfig> {
        let base = match &self.config {
            Some(path) => SweepConfig::from_file(path)?,
            None => SweepConfig::default(),
        };

        let config = base.apply_overrides(self.overrides());
        config.validate()?;
        Ok(config)
    }
}
