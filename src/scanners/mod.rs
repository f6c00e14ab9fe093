//! Read-only passes over the cluster: namespace enumeration and pod scanning

pub mod namespaces;
pub mod pods;
