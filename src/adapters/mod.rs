//! Adapters for ownership resolution and restart trigger building

pub mod owner;
pub mod restart_annotation;
