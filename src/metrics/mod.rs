//! Prometheus metrics for the database restart sweeper
//!
//! A sweep is a one-shot job, so metrics are exported as a textfile after
//! the run instead of being served.

pub mod prometheus;

pub use self::prometheus::*;
