//! Restart trigger annotation
//!
//! A rollout is triggered by changing the pod template annotations of a
//! Deployment. The controller notices the template hash change and rolls
//! every replica.

use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// How the restart annotation is applied to the pod template
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationPolicy {
    /// Overwrite the whole annotation map with the restart annotation.
    ///
    /// Known defect: every other pod template annotation is dropped.
    #[default]
    Replace,
    /// Insert the restart annotation next to the existing ones
    Merge,
}

impl std::str::FromStr for AnnotationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(AnnotationPolicy::Replace),
            "merge" => Ok(AnnotationPolicy::Merge),
            other => Err(Error::Config(format!(
                "annotationPolicy must be one of: replace, merge (got {})",
                other
            ))),
        }
    }
}

/// Format a restart timestamp as RFC 3339 with second precision
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write the restart annotation onto the deployment's pod template.
///
/// Returns the timestamp value that was written.
pub fn apply_restart_annotation(
    deployment: &mut Deployment,
    key: &str,
    at: DateTime<Utc>,
    policy: AnnotationPolicy,
) -> String {
    let timestamp = format_timestamp(at);

    let spec = deployment.spec.get_or_insert_with(Default::default);
    let metadata = spec.template.metadata.get_or_insert_with(Default::default);

    match policy {
        AnnotationPolicy::Replace => {
            let mut annotations = BTreeMap::new();
            annotations.insert(key.to_string(), timestamp.clone());
            metadata.annotations = Some(annotations);
        }
        AnnotationPolicy::Merge => {
            metadata
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(key.to_string(), timestamp.clone());
        }
    }

    timestamp
}
