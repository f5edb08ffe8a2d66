//! `tracing` subscriber setup. `RUST_LOG`, when set, overrides every default
//! filter built here.

use crate::config::ClientConfig;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    prelude::*,
    EnvFilter,
};

const CRATES: [&str; 3] = ["spquery_core", "spquery_transport", "spquery_client"];

/// Filter directives putting the spquery crates at `level`, reqwest at
/// `info` and everything else at `warn`.
pub fn filter_directives(level: &str) -> String {
    let mut directives: Vec<String> = CRATES
        .iter()
        .map(|name| format!("{}={}", name, level))
        .collect();
    directives.push("reqwest=info".to_string());
    directives.push("warn".to_string());
    directives.join(",")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)))
}

/// Compact stderr output plus a daily-rotated file under `log_dir`, both at
/// `config.log_level`.
pub fn init_logging(
    config: &ClientConfig,
    log_dir: impl AsRef<Path>,
    log_prefix: &str,
) -> anyhow::Result<()> {
    let log_dir_path = log_dir.as_ref();
    std::fs::create_dir_all(log_dir_path)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_prefix)
        .build(log_dir_path)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Files carry targets and thread ids.
    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(console_layer())
        .with(file_layer)
        .try_init()?;

    // The writer stops flushing once the guard drops.
    std::mem::forget(guard);

    tracing::info!("Logging to {:?} for {}", log_dir_path, config.site_url);
    Ok(())
}

/// Stderr-only variant of [`init_logging`].
pub fn init_console_logging(config: &ClientConfig) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(console_layer())
        .try_init()?;
    Ok(())
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(ChronoUtc::new("%H:%M:%S%.3f".to_string()))
        .with_writer(std::io::stderr)
}

/// Console logging captured by the test harness, spquery crates at `trace`.
/// Safe to call more than once.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("trace"))
        .with_test_writer()
        .try_init();
}
