//! Kubeconfig path taken from the environment
//!
//! Kept in its own test binary since it mutates the process environment.

use clap::Parser;
use database_restart_sweeper::cli::Cli;
use std::path::Path;

#[test]
fn kubeconfig_path_env_selects_kubeconfig() {
    std::env::set_var("KUBECONFIG_PATH", "/tmp/explicit-kubeconfig");

    let config = Cli::try_parse_from(["database-restart-sweeper"])
        .unwrap()
        .into_config()
        .unwrap();

    assert_eq!(
        config.kubeconfig.as_deref(),
        Some(Path::new("/tmp/explicit-kubeconfig"))
    );
}
