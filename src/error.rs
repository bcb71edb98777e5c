use thiserror::Error;
use crate::types::source::SourceId;

#[derive(Error, Debug)]
pub enum Error {
    // Exchange Adapter Errors
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("HTTP status {status} from {source_id}")]
    HttpStatus {
        source_id: SourceId,
        status: u16,
    },

    #[error("Response deserialization failed: {0}")]
    DeserializationError(String),

    #[error("Invalid quote rate: {0}")]
    InvalidQuoteRate(f64),

    #[error("Quote rate unavailable for {0} and no fallback configured")]
    QuoteRateUnavailable(SourceId),

    // Parsing Errors
    #[error("Invalid asset symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown look-back window: {0}")]
    UnknownWindow(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::HttpError(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::MetricsError(err.to_string())
    }
}
