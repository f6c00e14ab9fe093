//! Tests for sweep configuration loading and validation

use chrono::{TimeZone, Utc};
use clap::Parser;
use database_restart_sweeper::adapters::restart_annotation::{
    apply_restart_annotation, format_timestamp, AnnotationPolicy,
};
use database_restart_sweeper::bootstrap::resolve_kubeconfig_path;
use database_restart_sweeper::cli::Cli;
use database_restart_sweeper::cluster::new_deployment;
use database_restart_sweeper::config::{ConfigOverrides, LogFormat, SweepConfig};
use database_restart_sweeper::metrics;
use database_restart_sweeper::Error;
use std::io::Write;
use std::path::Path;

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn empty_document_yields_defaults() {
    let config = SweepConfig::from_yaml("").unwrap();

    assert_eq!(config, SweepConfig::default());
    assert_eq!(config.match_signature, "database");
    assert_eq!(config.selector_label, "app");
    assert_eq!(config.annotation_key, "restart-timestamp");
    assert_eq!(config.annotation_policy, AnnotationPolicy::Replace);
    assert_eq!(config.concurrency, 1);
    assert!(!config.dry_run);
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
fn partial_document_overrides_only_given_fields() {
    let config = SweepConfig::from_yaml(
        r#"
matchSignature: redis
annotationPolicy: merge
concurrency: 4
logFormat: text
"#,
    )
    .unwrap();

    assert_eq!(config.match_signature, "redis");
    assert_eq!(config.annotation_policy, AnnotationPolicy::Merge);
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.log_format, LogFormat::Text);
    assert_eq!(config.selector_label, "app");
}

#[test]
fn config_file_is_read_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "dryRun: true").unwrap();
    writeln!(file, "kubeconfig: /etc/sweeper/kubeconfig").unwrap();

    let config = SweepConfig::from_file(file.path()).unwrap();

    assert!(config.dry_run);
    assert_eq!(
        config.kubeconfig.as_deref(),
        Some(Path::new("/etc/sweeper/kubeconfig"))
    );
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SweepConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();

    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[test]
fn malformed_document_is_config_error() {
    let err = SweepConfig::from_yaml("concurrency: many").unwrap_err();

    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn default_config_is_valid() {
    assert!(SweepConfig::default().validate().is_ok());
}

#[test]
fn empty_signature_fails_validation() {
    let config = SweepConfig {
        match_signature: String::new(),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("matchSignature"));
}

#[test]
fn zero_concurrency_fails_validation() {
    let config = SweepConfig {
        concurrency: 0,
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("concurrency"));
}

#[test]
fn log_format_parses_case_insensitively() {
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert!("xml".parse::<LogFormat>().is_err());
}

// ============================================================================
// Restart Annotation Tests
// ============================================================================

#[test]
fn timestamp_is_rfc3339_in_utc() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    assert_eq!(format_timestamp(at), "2024-03-09T14:05:07Z");
}

#[test]
fn annotation_is_created_when_template_has_no_metadata() {
    let mut deployment = new_deployment("database", &[("app", "database")]);
    deployment.spec.as_mut().unwrap().template.metadata = None;
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    let value = apply_restart_annotation(
        &mut deployment,
        "restart-timestamp",
        at,
        AnnotationPolicy::Merge,
    );

    let annotations = deployment
        .spec
        .unwrap()
        .template
        .metadata
        .unwrap()
        .annotations
        .unwrap();
    assert_eq!(value, "2024-03-09T14:05:07Z");
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations["restart-timestamp"], value);
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
fn overrides_take_precedence_over_file_values() {
    let file = SweepConfig::from_yaml(
        r#"
matchSignature: redis
concurrency: 4
dryRun: true
annotationPolicy: merge
"#,
    )
    .unwrap();

    let config = file.apply_overrides(ConfigOverrides {
        match_signature: Some("mysql".to_string()),
        dry_run: Some(false),
        annotation_policy: Some(AnnotationPolicy::Replace),
        ..Default::default()
    });

    assert_eq!(config.match_signature, "mysql");
    assert!(!config.dry_run);
    assert_eq!(config.annotation_policy, AnnotationPolicy::Replace);
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.selector_label, "app");
}

#[test]
fn empty_overrides_leave_config_unchanged() {
    let file = SweepConfig::from_yaml("concurrency: 2\nlogFormat: text").unwrap();

    let config = file.clone().apply_overrides(ConfigOverrides::default());

    assert_eq!(config, file);
}

#[test]
fn cli_flags_override_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "dryRun: true").unwrap();
    writeln!(file, "annotationPolicy: merge").unwrap();
    writeln!(file, "matchSignature: redis").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let cli = Cli::try_parse_from([
        "database-restart-sweeper",
        "--config",
        path.as_str(),
        "--dry-run=false",
        "--annotation-policy",
        "replace",
        "--kubeconfig",
        "/tmp/cluster-b.yaml",
    ])
    .unwrap();
    let config = cli.into_config().unwrap();

    assert!(!config.dry_run);
    assert_eq!(config.annotation_policy, AnnotationPolicy::Replace);
    assert_eq!(config.match_signature, "redis");
    assert_eq!(
        config.kubeconfig.as_deref(),
        Some(Path::new("/tmp/cluster-b.yaml"))
    );
}

#[test]
fn bare_dry_run_flag_turns_dry_run_on() {
    let cli = Cli::try_parse_from(["database-restart-sweeper", "--dry-run"])
        .unwrap();

    assert_eq!(cli.dry_run, Some(true));
    assert!(cli.into_config().unwrap().dry_run);
}

#[test]
fn invalid_override_fails_validation() {
    let cli = Cli::try_parse_from(["database-restart-sweeper", "--concurrency", "0"])
        .unwrap();

    let err = cli.into_config().unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[test]
fn kubeconfig_flag_reads_kubeconfig_path_env() {
    use clap::CommandFactory;

    let command = Cli::command();
    let kubeconfig = command
        .get_arguments()
        .find(|arg| arg.get_id() == "kubeconfig")
        .unwrap();

    assert_eq!(
        kubeconfig.get_env(),
        Some(std::ffi::OsStr::new("KUBECONFIG_PATH"))
    );
}

#[test]
fn annotation_policy_parses_case_insensitively() {
    assert_eq!(
        "Merge".parse::<AnnotationPolicy>().unwrap(),
        AnnotationPolicy::Merge
    );
    assert_eq!(
        "replace".parse::<AnnotationPolicy>().unwrap(),
        AnnotationPolicy::Replace
    );
    assert!("append".parse::<AnnotationPolicy>().is_err());
}

// ============================================================================
// Kubeconfig Resolution Tests
// ============================================================================

#[test]
fn explicit_kubeconfig_wins_over_default() {
    let path = resolve_kubeconfig_path(Some(Path::new("/etc/sweeper/kubeconfig")))
        .unwrap();

    assert_eq!(path, Path::new("/etc/sweeper/kubeconfig"));
}

#[test]
fn default_kubeconfig_is_under_home() {
    let path = resolve_kubeconfig_path(None).unwrap();

    assert!(path.ends_with(".kube/config"), "got {}", path.display());
}

// ============================================================================
// Metrics Export Tests
// ============================================================================

#[test]
fn metrics_textfile_is_written_atomically() {
    metrics::RESTARTS.with_label_values(&["restarted"]).inc();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweeper.prom");

    metrics::write_textfile(&path).unwrap();

    let body = std::fs::read_to_string(&path).unwrap();
    assert!(body.contains("database_restart_sweeper_restarts_total"));

    let entries: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["sweeper.prom"]);
}
