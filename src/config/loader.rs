use std::collections::HashSet;
use crate::config::{CollectorConfig, HistoryConfig, LoggingConfig};
use crate::error::{Error, Result};
use crate::history::LookbackWindow;
use crate::price_infra::SourceConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
    /// Polled exchanges. Order is priority when several report the same asset.
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            collector: CollectorConfig::default(),
            history: HistoryConfig::default(),
            logging: LoggingConfig::default(),
            sources: SourceConfig::defaults(),
        }
    }
}

impl AppConfig {
    /// Layers `{dir}/default`, `{dir}/{env}` and `PRICEWATCH__*` variables.
    pub fn load(dir: &str, env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", dir, env)).required(false))
            .add_source(
                Environment::with_prefix("PRICEWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Retention cap `R` in effect for the configured period.
    pub fn retention(&self) -> usize {
        self.history.retention.unwrap_or_else(|| {
            LookbackWindow::longest_trailing(self.collector.period()) + self.history.retention_slack
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.collector.period_secs == 0 {
            return Err(Error::ConfigError("collector.period_secs must be positive".into()));
        }

        if self.history.debounce() >= self.collector.period() {
            return Err(Error::ConfigError(format!(
                "history.debounce_secs {} must be shorter than collector.period_secs {}",
                self.history.debounce_secs, self.collector.period_secs
            )));
        }

        let longest = LookbackWindow::longest_trailing(self.collector.period());
        match self.history.retention {
            Some(0) => {
                return Err(Error::ConfigError("history.retention must be positive".into()));
            }
            Some(retention) if retention < longest => {
                return Err(Error::ConfigError(format!(
                    "history.retention {} is shorter than the longest window ({} samples)",
                    retention, longest
                )));
            }
            _ => {}
        }

        if self.sources.is_empty() {
            return Err(Error::ConfigError("at least one source must be configured".into()));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.source_id) {
                return Err(Error::ConfigError(format!(
                    "source {} configured twice",
                    source.source_id
                )));
            }
            if source.timeout_ms == 0 {
                return Err(Error::ConfigError(format!(
                    "source {} has a zero timeout",
                    source.source_id
                )));
            }
            if let Some(rate) = source.fallback_quote_rate {
                if !(rate.is_finite() && rate > 0.0) {
                    return Err(Error::ConfigError(format!(
                        "source {} has an invalid fallback quote rate {}",
                        source.source_id, rate
                    )));
                }
            }
        }

        Ok(())
    }
}
