//! Logger setup shared by the relay binaries.

use tracing_subscriber::{
    EnvFilter,
    fmt::{format::Writer, time::FormatTime},
};

use crate::time::now_jst;

/// Timer that prints RFC 3339 timestamps in JST.
#[derive(Debug, Clone, Copy, Default)]
pub struct JstTimer;

impl FormatTime for JstTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", now_jst().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Build the filter directive used when `RUST_LOG` is not set.
pub fn default_directive(app_name: &str, default_level: &str) -> String {
    let crate_name = app_name.replace('-', "_");
    format!("{default_level},{crate_name}={default_level},tower_http={default_level}")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this more than
/// once keeps the first subscriber.
pub fn setup_logger(app_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(app_name, default_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(JstTimer)
        .with_target(true)
        .try_init();

    if result.is_ok() {
        tracing::debug!(app_name, default_level, "logger initialized");
    }
}
