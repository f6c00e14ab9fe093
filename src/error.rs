//! Error types for the database restart sweeper

use thiserror::Error;

/// Result type for the sweeper
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status the API server returns when a resource version is stale
const CONFLICT_CODE: u16 = 409;

/// Error type for the sweeper
#[derive(Debug, Error)]
pub enum Error {
    /// Credential discovery or client construction failed
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    /// Invalid sweep configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listing, fetch or update call failed and was not otherwise classified
    #[error("Cluster query error: {0}")]
    ClusterQuery(String),

    /// The label-selector existence check returned no deployments
    #[error("No deployment found with selector {selector} in namespace {namespace}")]
    NoDeploymentFound { namespace: String, selector: String },

    /// Fetching the candidate deployment by name failed
    #[error("Failed to get deployment {namespace}/{name}: {message}")]
    DeploymentLookup {
        namespace: String,
        name: String,
        message: String,
    },

    /// The update was rejected because the deployment changed underneath us
    #[error("Update conflict on deployment {namespace}/{name}: {message}")]
    UpdateConflict {
        namespace: String,
        name: String,
        message: String,
    },
}

impl Error {
    /// Stable label for metrics and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Bootstrap(_) => "bootstrap",
            Error::Config(_) => "config",
            Error::ClusterQuery(_) => "cluster_query",
            Error::NoDeploymentFound { .. } => "no_deployment_found",
            Error::DeploymentLookup { .. } => "deployment_lookup",
            Error::UpdateConflict { .. } => "update_conflict",
        }
    }

    /// Classify a failed deployment update
    pub fn from_update(namespace: &str, name: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref resp) if resp.code == CONFLICT_CODE => Error::UpdateConflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: resp.message.clone(),
            },
            other => Error::ClusterQuery(format!(
                "Failed to update deployment {}/{}: {}",
                namespace, name, other
            )),
        }
    }
}

/// True when the API server answered 404
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}
