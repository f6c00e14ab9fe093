//! One-time setup before a sweep: kubeconfig discovery, client construction
//! and tracing initialisation

use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::{Error, Result};

const DEFAULT_LOG_FILTER: &str = "info,database_restart_sweeper=debug,kube=warn,hyper=warn";

/// `~/.kube/config`
pub fn default_kubeconfig_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Bootstrap("Failed to determine user home directory".to_string()))?;
    Ok(home.join(".kube").join("config"))
}

/// Pick the explicit kubeconfig path if given, the default one otherwise
pub fn resolve_kubeconfig_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_kubeconfig_path(),
    }
}

/// Build an authenticated client from a kubeconfig file
pub async fn connect(kubeconfig_path: &Path) -> Result<Client> {
    info!("Using kubeconfig: {}", kubeconfig_path.display());

    let kubeconfig = Kubeconfig::read_from(kubeconfig_path).map_err(|e| {
        Error::Bootstrap(format!(
            "Failed to read kubeconfig {}: {}",
            kubeconfig_path.display(),
            e
        ))
    })?;

    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::Bootstrap(format!("Failed to load Kubernetes config: {}", e)))?;

    let client = Client::try_from(config)
        .map_err(|e| Error::Bootstrap(format!("Failed to create Kubernetes client: {}", e)))?;

    info!("Connected to Kubernetes API server");
    Ok(client)
}

/// Initialize tracing subscriber on stderr
pub fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
