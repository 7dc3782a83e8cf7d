//! Tracing subscriber setup for binaries and tests embedding the store.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::UploadRecordsError;

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Installs a global `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`) and forwards `log` records into it.
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<(), UploadRecordsError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match format {
        LogFormat::Plain => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer).with(filter);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| UploadRecordsError::Logging(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| UploadRecordsError::Logging(e.to_string()))?;

    Ok(())
}
