use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use crate::error::Result;
use crate::price_infra::connectors::http::{self, numeric};
use crate::price_infra::connectors::{snapshot_or_empty, TickerSource};
use crate::price_infra::{ExchangeSnapshot, SourceConfig, TickerQuote};
use crate::types::{AssetSymbol, SourceId};

const QUOTE_SUFFIX: &str = "TRY";

pub struct BtcTurkConnector {
    source_id: SourceId,
    ticker_url: String,
    client: Client,
}

impl BtcTurkConnector {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(BtcTurkConnector {
            source_id: config.source_id,
            ticker_url: http::endpoint(&config.base_url, "/api/v2/ticker"),
            client: http::client(config.timeout())?,
        })
    }

    async fn try_fetch(&self) -> Result<ExchangeSnapshot> {
        let response: BtcTurkResponse =
            http::get_json(&self.client, &self.ticker_url, self.source_id).await?;

        let mut snapshot = ExchangeSnapshot::new(self.source_id);
        for ticker in response.data {
            let Some(coin) = ticker.pair.strip_suffix(QUOTE_SUFFIX) else {
                continue;
            };
            let (Ok(asset), Some(price), Some(change_24h)) = (
                AssetSymbol::new(coin),
                numeric(&ticker.last),
                numeric(&ticker.daily_percent),
            ) else {
                tracing::debug!("Skipping malformed BtcTurk pair {}", ticker.pair);
                continue;
            };

            snapshot.insert(asset, TickerQuote { price, change_24h });
        }

        tracing::debug!("BtcTurk snapshot: {} TRY pairs", snapshot.len());
        Ok(snapshot)
    }
}

#[async_trait]
impl TickerSource for BtcTurkConnector {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    async fn fetch_snapshot(&self) -> ExchangeSnapshot {
        snapshot_or_empty(self.source_id, self.try_fetch().await)
    }
}

#[derive(Deserialize)]
struct BtcTurkResponse {
    data: Vec<BtcTurkTicker>,
}

#[derive(Deserialize)]
struct BtcTurkTicker {
    pair: String,
    #[serde(default)]
    last: Value,
    #[serde(default, rename = "dailyPercent")]
    daily_percent: Value,
}
