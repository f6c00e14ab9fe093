//! Prometheus metrics definitions and textfile export

use std::path::Path;

use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use tracing::info;

lazy_static::lazy_static! {
    /// Namespaces whose pods were listed
    pub static ref NAMESPACES_SCANNED: Counter = register_counter!(
        "database_restart_sweeper_namespaces_scanned_total",
        "Total number of namespaces whose pods were listed"
    ).unwrap();

    /// Namespaces skipped because listing their pods failed
    pub static ref NAMESPACE_ERRORS: Counter = register_counter!(
        "database_restart_sweeper_namespace_errors_total",
        "Total number of namespaces skipped after a pod listing failure"
    ).unwrap();

    /// Pods whose name matched the signature
    pub static ref PODS_MATCHED: Counter = register_counter!(
        "database_restart_sweeper_pods_matched_total",
        "Total number of pods matching the signature"
    ).unwrap();

    /// Restart triggers by outcome (restarted, dry_run)
    pub static ref RESTARTS: CounterVec = register_counter_vec!(
        "database_restart_sweeper_restarts_total",
        "Total number of restart triggers by outcome",
        &["outcome"]
    ).unwrap();

    /// Failed remediations by error kind
    pub static ref REMEDIATION_ERRORS: CounterVec = register_counter_vec!(
        "database_restart_sweeper_remediation_errors_total",
        "Total number of failed remediations by error kind",
        &["kind"]
    ).unwrap();

    /// Sweep duration histogram
    pub static ref SWEEP_DURATION: Histogram = register_histogram!(
        "database_restart_sweeper_sweep_duration_seconds",
        "Duration of a full sweep in seconds",
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    ).unwrap();
}

/// Render all registered metrics in the Prometheus text format
pub fn render() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Write the metrics to a file for a node exporter textfile collector.
///
/// The file is written next to its final path and renamed so a collector
/// never reads a partial exposition.
pub fn write_textfile(path: &Path) -> anyhow::Result<()> {
    let body = render()?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    info!("Wrote metrics to {}", path.display());
    Ok(())
}
