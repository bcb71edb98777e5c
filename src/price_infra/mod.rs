pub mod board;
pub mod collector;
pub mod connectors;
pub mod toggles;

use std::collections::HashMap;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::{AssetSymbol, SourceId};

pub use board::SnapshotBoard;
pub use collector::{Collector, CycleReport};
pub use toggles::SourceToggles;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SourceConfig {
    pub source_id: SourceId,
    pub base_url: String,
    pub timeout_ms: u64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Build this exchange's board from the other sources' listings.
    #[serde(default)]
    pub listing_from_peers: bool,
    /// Conversion rate used when the live quote-rate request fails.
    #[serde(default)]
    pub fallback_quote_rate: Option<f64>,
}

fn enabled_by_default() -> bool {
    true
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn defaults() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                source_id: SourceId::Paribu,
                base_url: "https://www.paribu.com".to_string(),
                timeout_ms: 2_000,
                enabled: true,
                listing_from_peers: false,
                fallback_quote_rate: None,
            },
            SourceConfig {
                source_id: SourceId::BtcTurk,
                base_url: "https://api.btcturk.com".to_string(),
                timeout_ms: 2_000,
                enabled: true,
                listing_from_peers: false,
                fallback_quote_rate: None,
            },
            SourceConfig {
                source_id: SourceId::Binance,
                base_url: "https://data-api.binance.vision".to_string(),
                timeout_ms: 3_000,
                enabled: true,
                listing_from_peers: true,
                fallback_quote_rate: Some(34.50),
            },
        ]
    }
}

/// Last price and exchange-reported 24h change for one asset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub price: f64,
    pub change_24h: f64,
}

/// Everything one source reported in one collection cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub source_id: SourceId,
    pub fetched_at: DateTime<Utc>,
    pub quotes: HashMap<AssetSymbol, TickerQuote>,
}

impl ExchangeSnapshot {
    pub fn new(source_id: SourceId) -> Self {
        ExchangeSnapshot {
            source_id,
            fetched_at: Utc::now(),
            quotes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, asset: AssetSymbol, quote: TickerQuote) {
        self.quotes.insert(asset, quote);
    }

    pub fn get(&self, asset: &AssetSymbol) -> Option<&TickerQuote> {
        self.quotes.get(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetSymbol> {
        self.quotes.keys()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
