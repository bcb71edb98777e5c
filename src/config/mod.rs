use std::time::Duration;
use serde::{Deserialize, Serialize};

pub mod logging;
pub mod loader;

pub use loader::AppConfig;
pub use logging::{LogFormat, LoggingConfig};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub period_secs: u64,
}

impl CollectorConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            period_secs: 15,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Observations kept per asset. Derived from the longest trailing
    /// window plus `retention_slack` when unset.
    pub retention: Option<usize>,
    pub retention_slack: usize,
    pub debounce_secs: u64,
}

impl HistoryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            retention: None,
            retention_slack: 10,
            debounce_secs: 14,
        }
    }
}
