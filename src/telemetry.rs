//! Diagnostic tracing. Off unless CI_TRIGGER_LOG is set (EnvFilter syntax, e.g. `debug`).

use std::env;

use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;

static INIT: OnceCell<()> = OnceCell::new();

fn tracing_filter_env() -> Option<String> {
    env::var("CI_TRIGGER_LOG")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Install the stderr fmt subscriber once. Returns false when disabled or already installed.
pub fn telemetry_init() -> bool {
    if INIT.get().is_some() {
        return false;
    }
    let Some(filter) = tracing_filter_env() else {
        return false;
    };

    let env_filter = tracing_subscriber::EnvFilter::new(filter);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    if registry.try_init().is_err() {
        eprintln!("ci-trigger: tracing init skipped (global subscriber already set)");
        return false;
    }
    let _ = INIT.set(());
    true
}
