//! Orchestration of a sweep over the cluster

pub mod sweep_controller;

use std::sync::Arc;

use crate::cluster::Cluster;
use crate::config::SweepConfig;

/// Shared context for a sweep
pub struct Context {
    /// Cluster the sweep reads from and writes to
    pub cluster: Arc<dyn Cluster>,
    /// Sweep configuration
    pub config: SweepConfig,
}

impl Context {
    /// Create a new context
    pub fn new(cluster: Arc<dyn Cluster>, config: SweepConfig) -> Arc<Self> {
        Arc::new(Self { cluster, config })
    }
}
