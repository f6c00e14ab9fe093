//! Remediation logic applied to matched pods

pub mod deployment;
