//! Resolution of the deployment that owns a pod
//!
//! Pods are not traced through their owner references. Ownership is guessed
//! from the pod name alone, which keeps the sweep to the four read calls it
//! is allowed. The policy sits behind [`OwnerResolver`] so a resolver that
//! follows real controller metadata can replace it without touching the
//! rest of the pipeline.

/// Candidate deployment for a pod
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerCandidate {
    /// Value looked up under the selector label for the existence check
    pub selector_value: String,
    /// Name of the deployment fetched and updated
    pub deployment_name: String,
}

impl OwnerCandidate {
    /// `key=value` label selector for the existence check
    pub fn selector(&self, label: &str) -> String {
        format!("{}={}", label, self.selector_value)
    }
}

/// Maps a pod name to the deployment believed to own it
pub trait OwnerResolver: Send + Sync {
    /// Derive the owner candidate from a pod name
    fn resolve(&self, pod_name: &str) -> OwnerCandidate;
}

/// Takes the segment before the first `-` as both the `app` label value and
/// the deployment name.
///
/// The two lookups are independent: a deployment can carry the label under a
/// different name, in which case the existence check passes and the fetch by
/// name still fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstSegmentResolver;

impl OwnerResolver for FirstSegmentResolver {
    fn resolve(&self, pod_name: &str) -> OwnerCandidate {
        let token = candidate_token(pod_name);
        OwnerCandidate {
            selector_value: token.to_string(),
            deployment_name: token.to_string(),
        }
    }
}

/// First `-`-separated segment of a pod name
pub fn candidate_token(pod_name: &str) -> &str {
    pod_name.split('-').next().unwrap_or(pod_name)
}
