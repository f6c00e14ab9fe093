//! Database restart sweeper
//!
//! Main entry point. Loads the configuration, connects to the cluster from
//! the kubeconfig and runs a single sweep. Exits non-zero only when setup
//! or the initial namespace listing fails.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use database_restart_sweeper::{
    bootstrap,
    cli::Cli,
    cluster::KubeCluster,
    controllers::{sweep_controller, Context},
    metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    bootstrap::init_tracing(config.log_format);

    info!(
        signature = %config.match_signature,
        dry_run = config.dry_run,
        concurrency = config.concurrency,
        "Starting database restart sweep"
    );

    let kubeconfig = bootstrap::resolve_kubeconfig_path(config.kubeconfig.as_deref())?;
    let client = bootstrap::connect(&kubeconfig).await?;

    let metrics_file = config.metrics_file.clone();
    let context = Context::new(Arc::new(KubeCluster::new(client)), config);

    let report = sweep_controller::run(context).await.map_err(|e| {
        error!("Sweep aborted: {}", e);
        e
    })?;

    match serde_json::to_string(&report) {
        Ok(summary) => info!(report = %summary, "Sweep report"),
        Err(e) => error!("Failed to serialize sweep report: {}", e),
    }

    if let Some(path) = metrics_file {
        if let Err(e) = metrics::write_textfile(&path) {
            error!("Failed to write metrics to {}: {}", path.display(), e);
        }
    }

    info!("Database restart sweep stopped");
    Ok(())
}
