use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber for a run. An explicit RUST_LOG
/// overrides `default_filter`, which names the per-crate levels a normal
/// run should log at.
pub fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).init();
}
