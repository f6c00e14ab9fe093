//! Namespace enumeration

use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::{Error, Result};

/// List every namespace visible to the cluster credentials, in API order
pub async fn list_namespaces(cluster: &dyn Cluster) -> Result<Vec<String>> {
    info!("Listing namespaces");

    let namespaces = cluster
        .list_namespaces()
        .await
        .map_err(|e| Error::ClusterQuery(format!("Failed to list namespaces: {}", e)))?;

    debug!(count = namespaces.len(), "Listed namespaces");
    Ok(namespaces)
}
