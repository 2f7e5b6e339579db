use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

/// Output format for the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    Json,
    /// Human readable, for local development.
    Pretty,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `log_level` when set. Calling this twice returns a
/// `ConfigError` instead of panicking, so tests can call it freely.
pub fn init_tracing(service_name: &str, log_level: &str, format: LogFormat) -> Result<(), AppError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    result.map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Failed to install tracing subscriber for '{}': {}",
            service_name,
            e
        ))
    })?;

    tracing::info!(service = %service_name, level = %log_level, "Tracing initialized");
    Ok(())
}
