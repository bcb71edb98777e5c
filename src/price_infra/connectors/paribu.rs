use std::collections::HashMap;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use crate::error::Result;
use crate::price_infra::connectors::http::{self, numeric};
use crate::price_infra::connectors::{snapshot_or_empty, TickerSource};
use crate::price_infra::{ExchangeSnapshot, SourceConfig, TickerQuote};
use crate::types::{AssetSymbol, SourceId};

const QUOTE_SUFFIX: &str = "_TL";

pub struct ParibuConnector {
    source_id: SourceId,
    ticker_url: String,
    client: Client,
}

impl ParibuConnector {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(ParibuConnector {
            source_id: config.source_id,
            ticker_url: http::endpoint(&config.base_url, "/ticker"),
            client: http::client(config.timeout())?,
        })
    }

    async fn try_fetch(&self) -> Result<ExchangeSnapshot> {
        let markets: HashMap<String, ParibuTicker> =
            http::get_json(&self.client, &self.ticker_url, self.source_id).await?;

        let mut snapshot = ExchangeSnapshot::new(self.source_id);
        for (market, ticker) in markets {
            let Some(coin) = market.strip_suffix(QUOTE_SUFFIX) else {
                continue;
            };
            let (Ok(asset), Some(price), Some(change_24h)) = (
                AssetSymbol::new(coin),
                numeric(&ticker.last),
                numeric(&ticker.percent_change),
            ) else {
                tracing::debug!("Skipping malformed Paribu market {}", market);
                continue;
            };

            snapshot.insert(asset, TickerQuote { price, change_24h });
        }

        tracing::debug!("Paribu snapshot: {} TL markets", snapshot.len());
        Ok(snapshot)
    }
}

#[async_trait]
impl TickerSource for ParibuConnector {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    async fn fetch_snapshot(&self) -> ExchangeSnapshot {
        snapshot_or_empty(self.source_id, self.try_fetch().await)
    }
}

#[derive(Deserialize)]
struct ParibuTicker {
    #[serde(default)]
    last: Value,
    #[serde(default, rename = "percentChange")]
    percent_change: Value,
}
