//! Cluster access used by the sweep
//!
//! The sweep only ever needs four reads and one write. They are collected in
//! [`Cluster`] so the pipeline can run against a live API server or, with
//! the `testing` feature, against an in-memory cluster.

mod live;
#[cfg(any(test, feature = "testing"))]
mod memory;

pub use live::KubeCluster;
#[cfg(any(test, feature = "testing"))]
pub use memory::{new_deployment, MemoryCluster, Operation};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

/// Result of a single cluster call
pub type ClusterResult<T> = std::result::Result<T, kube::Error>;

/// Read and write operations the sweep performs against a cluster
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Names of all namespaces visible to the caller
    async fn list_namespaces(&self) -> ClusterResult<Vec<String>>;

    /// Pods in a namespace
    async fn list_pods(&self, namespace: &str) -> ClusterResult<Vec<Pod>>;

    /// Deployments in a namespace matching a label selector
    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> ClusterResult<Vec<Deployment>>;

    /// Deployment by namespace and name
    async fn get_deployment(&self, namespace: &str, name: &str) -> ClusterResult<Deployment>;

    /// Full-object replace of a deployment, guarded by its resource version
    async fn replace_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> ClusterResult<Deployment>;
}
