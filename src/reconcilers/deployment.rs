//! Restart of the deployment owning a matched pod
//!
//! Resolution runs in a fixed order and stops at the first failure:
//! 1. derive the owner candidate from the pod name
//! 2. list deployments carrying `<label>=<token>` and require at least one
//! 3. fetch the deployment named `<token>`
//! 4. write the restart annotation on its pod template
//! 5. submit the whole object back with a replace
//!
//! Steps 2 and 3 are not reconciled with each other. A deployment labelled
//! `app=<token>` under another name passes step 2 and then fails step 3.
//! Nothing is retried.

use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::adapters::owner::{FirstSegmentResolver, OwnerResolver};
use crate::adapters::restart_annotation::{apply_restart_annotation, AnnotationPolicy};
use crate::cluster::Cluster;
use crate::config::SweepConfig;
use crate::error::is_not_found;
use crate::{Error, Result};

/// What happened to a matched pod's deployment
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum RemediationOutcome {
    /// The update was accepted by the API server
    Restarted { deployment: String, timestamp: String },
    /// Resolution succeeded but the update was skipped
    DryRun { deployment: String, timestamp: String },
}

/// Resolves and restarts the deployment behind a pod
#[derive(Clone)]
pub struct DeploymentRemediator {
    resolver: Arc<dyn OwnerResolver>,
    selector_label: String,
    annotation_key: String,
    annotation_policy: AnnotationPolicy,
    dry_run: bool,
}

impl DeploymentRemediator {
    /// Remediator using the first-segment ownership heuristic
    pub fn new(config: &SweepConfig) -> Self {
        Self::with_resolver(config, Arc::new(FirstSegmentResolver))
    }

    /// Remediator using a custom ownership policy
    pub fn with_resolver(config: &SweepConfig, resolver: Arc<dyn OwnerResolver>) -> Self {
        Self {
            resolver,
            selector_label: config.selector_label.clone(),
            annotation_key: config.annotation_key.clone(),
            annotation_policy: config.annotation_policy,
            dry_run: config.dry_run,
        }
    }

    /// Resolve the owning deployment of `pod_name` and trigger its restart
    #[instrument(skip(self, cluster))]
    pub async fn remediate(
        &self,
        cluster: &dyn Cluster,
        namespace: &str,
        pod_name: &str,
    ) -> Result<RemediationOutcome> {
        let candidate = self.resolver.resolve(pod_name);
        let selector = candidate.selector(&self.selector_label);

        let existing = cluster
            .list_deployments(namespace, &selector)
            .await
            .map_err(|e| {
                Error::ClusterQuery(format!(
                    "Failed to list deployments in namespace {} with selector {}: {}",
                    namespace, selector, e
                ))
            })?;

        if existing.is_empty() {
            return Err(Error::NoDeploymentFound {
                namespace: namespace.to_string(),
                selector,
            });
        }
        debug!(
            selector = %selector,
            count = existing.len(),
            "Deployments found for selector"
        );

        let name = candidate.deployment_name;
        info!(deployment = %name, "Restarting deployment");

        let mut deployment = cluster
            .get_deployment(namespace, &name)
            .await
            .map_err(|e| Error::DeploymentLookup {
                namespace: namespace.to_string(),
                name: name.clone(),
                message: if is_not_found(&e) {
                    "not found".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let timestamp = self.trigger(&mut deployment);

        if self.dry_run {
            info!(deployment = %name, "Dry run, skipping deployment update");
            return Ok(RemediationOutcome::DryRun {
                deployment: name,
                timestamp,
            });
        }

        cluster
            .replace_deployment(namespace, &deployment)
            .await
            .map_err(|e| Error::from_update(namespace, &name, e))?;

        info!(deployment = %name, timestamp = %timestamp, "Restarted deployment");
        Ok(RemediationOutcome::Restarted {
            deployment: name,
            timestamp,
        })
    }

    fn trigger(&self, deployment: &mut Deployment) -> String {
        apply_restart_annotation(
            deployment,
            &self.annotation_key,
            Utc::now(),
            self.annotation_policy,
        )
    }
}
