use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};
use crate::types::SourceId;

/// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| Error::ConfigError(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    installed.map_err(|e| Error::ConfigError(format!("tracing init failed: {}", e)))
}

pub fn trace_collection_cycle(cycle: u64) -> Span {
    tracing::info_span!(
        "collection_cycle",
        cycle = cycle,
    )
}

pub fn trace_source_fetch(source_id: SourceId) -> Span {
    tracing::debug_span!(
        "source_fetch",
        source = %source_id,
    )
}
