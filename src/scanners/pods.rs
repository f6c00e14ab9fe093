//! Pod scanning and signature matching

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::{Error, Result};

/// Selects pods whose name contains a signature
#[derive(Clone, Debug)]
pub struct PodMatcher {
    signature: String,
}

impl PodMatcher {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Case-sensitive substring match on the pod name
    pub fn matches(&self, pod_name: &str) -> bool {
        pod_name.contains(self.signature.as_str())
    }

    /// Names of the pods selected for remediation, in listing order
    pub fn select(&self, pods: &[Pod]) -> Vec<String> {
        pods.iter()
            .map(|pod| pod.name_any())
            .filter(|name| self.matches(name))
            .collect()
    }
}

/// List the pods of a namespace
pub async fn list_pods(cluster: &dyn Cluster, namespace: &str) -> Result<Vec<Pod>> {
    info!(namespace, "Listing pods");

    let pods = cluster.list_pods(namespace).await.map_err(|e| {
        Error::ClusterQuery(format!(
            "Failed to list pods in namespace {}: {}",
            namespace, e
        ))
    })?;

    debug!(namespace, count = pods.len(), "Listed pods");
    Ok(pods)
}

/// List the pods of a namespace and keep the names matching the signature
pub async fn scan_namespace(
    cluster: &dyn Cluster,
    namespace: &str,
    matcher: &PodMatcher,
) -> Result<Vec<String>> {
    let pods = list_pods(cluster, namespace).await?;
    let matched = matcher.select(&pods);

    for pod in &matched {
        info!(
            namespace,
            pod = %pod,
            signature = matcher.signature(),
            "Pod matched signature"
        );
    }

    Ok(matched)
}
