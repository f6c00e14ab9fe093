//! Sweep over every namespace, restarting deployments of matched pods
//!
//! Namespaces are walked one at a time. Inside a namespace the matched pods
//! are remediated through a bounded stream, `concurrency` at a time. A
//! failure to list pods skips only that namespace and a failed remediation
//! skips only that pod. Only the initial namespace listing aborts the sweep.

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::cluster::Cluster;
use crate::controllers::Context;
use crate::metrics::prometheus::{
    NAMESPACES_SCANNED, NAMESPACE_ERRORS, PODS_MATCHED, REMEDIATION_ERRORS, RESTARTS,
    SWEEP_DURATION,
};
use crate::reconcilers::deployment::{DeploymentRemediator, RemediationOutcome};
use crate::scanners::namespaces;
use crate::scanners::pods::{self, PodMatcher};
use crate::Result;

/// Namespace skipped because its pods could not be listed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceFailure {
    pub namespace: String,
    pub message: String,
}

/// Restart trigger issued for a matched pod
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRestart {
    pub namespace: String,
    pub pod: String,
    #[serde(flatten)]
    pub outcome: RemediationOutcome,
}

/// Matched pod whose remediation failed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodFailure {
    pub namespace: String,
    pub pod: String,
    /// Error kind, see [`crate::Error::kind`]
    pub kind: String,
    pub message: String,
}

/// Summary of a sweep
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Namespaces whose pods were listed, in processing order
    pub namespaces_scanned: Vec<String>,
    pub namespace_failures: Vec<NamespaceFailure>,
    pub pods_matched: usize,
    pub restarts: Vec<PodRestart>,
    pub pod_failures: Vec<PodFailure>,
}

impl SweepReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            namespaces_scanned: Vec::new(),
            namespace_failures: Vec::new(),
            pods_matched: 0,
            restarts: Vec::new(),
            pod_failures: Vec::new(),
        }
    }

    /// Restarts accepted by the API server, excluding dry runs
    pub fn restarted_count(&self) -> usize {
        self.restarts
            .iter()
            .filter(|r| matches!(r.outcome, RemediationOutcome::Restarted { .. }))
            .count()
    }

    /// Whether any namespace or pod failed during the sweep
    pub fn has_failures(&self) -> bool {
        !self.namespace_failures.is_empty() || !self.pod_failures.is_empty()
    }
}

/// Run a full sweep.
///
/// Fails only when the namespace listing fails; everything after that is
/// recorded in the returned report.
pub async fn run(ctx: Arc<Context>) -> Result<SweepReport> {
    let start = std::time::Instant::now();
    let mut report = SweepReport::new();

    let cluster = ctx.cluster.as_ref();
    let matcher = PodMatcher::new(ctx.config.match_signature.clone());
    let remediator = DeploymentRemediator::new(&ctx.config);

    let namespace_names = namespaces::list_namespaces(cluster).await?;

    for namespace in &namespace_names {
        sweep_namespace(
            cluster,
            namespace,
            &matcher,
            &remediator,
            ctx.config.concurrency,
            &mut report,
        )
        .await;
    }

    report.finished_at = Some(Utc::now());
    let duration = start.elapsed().as_secs_f64();
    SWEEP_DURATION.observe(duration);

    info!(
        "Sweep finished in {:.2}s: {} namespaces, {} pods matched, {} restarted, {} failed",
        duration,
        report.namespaces_scanned.len(),
        report.pods_matched,
        report.restarted_count(),
        report.pod_failures.len() + report.namespace_failures.len()
    );

    Ok(report)
}

#[instrument(skip(cluster, matcher, remediator, report))]
async fn sweep_namespace(
    cluster: &dyn Cluster,
    namespace: &str,
    matcher: &PodMatcher,
    remediator: &DeploymentRemediator,
    concurrency: usize,
    report: &mut SweepReport,
) {
    info!("Processing namespace {}", namespace);

    let matched = match pods::scan_namespace(cluster, namespace, matcher).await {
        Ok(matched) => matched,
        Err(e) => {
            NAMESPACE_ERRORS.inc();
            error!("Error listing pods in namespace {}: {}", namespace, e);
            report.namespace_failures.push(NamespaceFailure {
                namespace: namespace.to_string(),
                message: e.to_string(),
            });
            return;
        }
    };

    NAMESPACES_SCANNED.inc();
    PODS_MATCHED.inc_by(matched.len() as f64);
    report.namespaces_scanned.push(namespace.to_string());
    report.pods_matched += matched.len();

    let results: Vec<_> = stream::iter(matched)
        .map(|pod| async move {
            let result = remediator.remediate(cluster, namespace, &pod).await;
            (pod, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for (pod, result) in results {
        match result {
            Ok(outcome) => {
                let label = match outcome {
                    RemediationOutcome::Restarted { .. } => "restarted",
                    RemediationOutcome::DryRun { .. } => "dry_run",
                };
                RESTARTS.with_label_values(&[label]).inc();
                report.restarts.push(PodRestart {
                    namespace: namespace.to_string(),
                    pod,
                    outcome,
                });
            }
            Err(e) => {
                REMEDIATION_ERRORS.with_label_values(&[e.kind()]).inc();
                error!(
                    namespace,
                    pod = %pod,
                    kind = e.kind(),
                    "Error restarting deployment for pod {}/{}: {}",
                    namespace,
                    pod,
                    e
                );
                report.pod_failures.push(PodFailure {
                    namespace: namespace.to_string(),
                    pod,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
}
