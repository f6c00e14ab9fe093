//! In-memory cluster
//!
//! Keeps namespaces, pods and deployments in insertion order, evaluates
//! equality label selectors, enforces resource versions on replace the way
//! the API server does and records every submitted update. Individual
//! operations can be made to fail with a given HTTP status.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::core::ErrorResponse;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Cluster, ClusterResult};

/// Cluster call that can be made to fail
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    ListNamespaces,
    ListPods { namespace: String },
    ListDeployments { namespace: String },
    GetDeployment { namespace: String, name: String },
    ReplaceDeployment { namespace: String, name: String },
}

#[derive(Default)]
struct State {
    namespaces: Vec<String>,
    pods: BTreeMap<String, Vec<Pod>>,
    deployments: BTreeMap<String, Vec<Deployment>>,
    failures: HashMap<Operation, ErrorResponse>,
    replaced: Vec<Deployment>,
    calls: Vec<Operation>,
}

/// Cluster held entirely in memory
#[derive(Default)]
pub struct MemoryCluster {
    state: Mutex<State>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a namespace
    pub fn add_namespace(&self, namespace: &str) {
        let mut state = self.state();
        if !state.namespaces.iter().any(|ns| ns == namespace) {
            state.namespaces.push(namespace.to_string());
        }
    }

    /// Add a pod, registering its namespace if needed
    pub fn add_pod(&self, namespace: &str, name: &str) {
        self.add_namespace(namespace);
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        self.state()
            .pods
            .entry(namespace.to_string())
            .or_default()
            .push(pod);
    }

    /// Add a deployment object as-is; a missing resource version is set to "1"
    pub fn add_deployment(&self, namespace: &str, mut deployment: Deployment) {
        self.add_namespace(namespace);
        deployment.metadata.namespace = Some(namespace.to_string());
        if deployment.metadata.resource_version.is_none() {
            deployment.metadata.resource_version = Some("1".to_string());
        }
        self.state()
            .deployments
            .entry(namespace.to_string())
            .or_default()
            .push(deployment);
    }

    /// Make every future call of `operation` fail with the given status
    pub fn fail(&self, operation: Operation, code: u16, message: &str) {
        let response = ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason_for(code).to_string(),
            code,
        };
        self.state().failures.insert(operation, response);
    }

    /// Deployments submitted through a successful replace, in call order
    pub fn replaced(&self) -> Vec<Deployment> {
        self.state().replaced.clone()
    }

    /// Every operation attempted, in call order
    pub fn calls(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    /// Stored deployment by namespace and name
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state()
            .deployments
            .get(namespace)
            .and_then(|list| list.iter().find(|d| d.name_any() == name))
            .cloned()
    }

    fn record(&self, operation: Operation) -> ClusterResult<()> {
        let mut state = self.state();
        state.calls.push(operation.clone());
        match state.failures.get(&operation) {
            Some(response) => Err(kube::Error::Api(response.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Cluster for MemoryCluster {
    async fn list_namespaces(&self) -> ClusterResult<Vec<String>> {
        self.record(Operation::ListNamespaces)?;
        Ok(self.state().namespaces.clone())
    }

    async fn list_pods(&self, namespace: &str) -> ClusterResult<Vec<Pod>> {
        self.record(Operation::ListPods {
            namespace: namespace.to_string(),
        })?;
        Ok(self.state().pods.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> ClusterResult<Vec<Deployment>> {
        self.record(Operation::ListDeployments {
            namespace: namespace.to_string(),
        })?;
        let state = self.state();
        let matched = state
            .deployments
            .get(namespace)
            .map(|list| {
                list.iter()
                    .filter(|d| selector_matches(label_selector, d.labels()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matched)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> ClusterResult<Deployment> {
        self.record(Operation::GetDeployment {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;
        self.deployment(namespace, name).ok_or_else(|| not_found(name))
    }

    async fn replace_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> ClusterResult<Deployment> {
        let name = deployment.name_any();
        self.record(Operation::ReplaceDeployment {
            namespace: namespace.to_string(),
            name: name.clone(),
        })?;

        let mut state = self.state();
        let stored = state
            .deployments
            .get_mut(namespace)
            .and_then(|list| list.iter_mut().find(|d| d.name_any() == name))
            .ok_or_else(|| not_found(&name))?;

        let current = stored.metadata.resource_version.clone();
        if deployment.metadata.resource_version.is_some()
            && deployment.metadata.resource_version != current
        {
            return Err(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: format!(
                    "Operation cannot be fulfilled on deployments.apps \"{}\": \
                     the object has been modified",
                    name
                ),
                reason: reason_for(409).to_string(),
                code: 409,
            }));
        }

        let next_version = current
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let mut updated = deployment.clone();
        updated.metadata.namespace = Some(namespace.to_string());
        updated.metadata.resource_version = Some(next_version.to_string());
        *stored = updated.clone();

        state.replaced.push(deployment.clone());
        Ok(updated)
    }
}

/// Deployment with the given labels and a pod template carrying them
pub fn new_deployment(name: &str, labels: &[(&str, &str)]) -> Deployment {
    let labels: BTreeMap<String, String> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: None,
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn not_found(name: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("deployments.apps \"{}\" not found", name),
        reason: reason_for(404).to_string(),
        code: 404,
    })
}

fn reason_for(code: u16) -> &'static str {
    match code {
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "NotFound",
        409 => "Conflict",
        422 => "Invalid",
        500 => "InternalError",
        503 => "ServiceUnavailable",
        _ => "Unknown",
    }
}

/// Evaluate an equality-based label selector (`a=b,c!=d,e`)
fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if let Some((key, value)) = term.split_once("!=") {
                labels.get(key.trim()).map(String::as_str) != Some(value.trim())
            } else if let Some((key, value)) =
                term.split_once("==").or_else(|| term.split_once('='))
            {
                labels.get(key.trim()).map(String::as_str) == Some(value.trim())
            } else {
                labels.contains_key(term)
            }
        })
}
