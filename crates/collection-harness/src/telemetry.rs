//! Tracing initialization

use crate::config::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber; later calls are no-ops
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init(format: LogFormat) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Compact => tracing::subscriber::set_global_default(
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact()
                .finish(),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .json()
                .finish(),
        ),
    };
    if installed.is_ok() {
        tracing::debug!(?format, "tracing initialized");
    }
}
