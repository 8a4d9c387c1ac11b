//! Subscriber setup. Logs go to a daily file so they never interleave with
//! the chat prompt.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter directives, e.g. `ZIAHR_LOG=ziahr_application=debug`.
pub const LOG_ENV: &str = "ZIAHR_LOG";

const DEFAULT_FILTER: &str = "warn";

fn build_filter() -> Result<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid {} filter", LOG_ENV)),
        _ => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Installs the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, "ziahr.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(build_filter()?);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
