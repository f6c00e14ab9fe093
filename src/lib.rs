//! Database restart sweeper
//!
//! Scans every namespace of a cluster for pods whose name carries a
//! signature and restarts the deployment believed to own each of them by
//! rewriting its pod template annotations.

pub mod adapters;
pub mod bootstrap;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod controllers;
pub mod error;
pub mod metrics;
pub mod reconcilers;
pub mod scanners;

pub use error::{Error, Result};
