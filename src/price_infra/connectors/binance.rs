use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use crate::error::{Error, Result};
use crate::price_infra::connectors::http::{self, numeric};
use crate::price_infra::connectors::{snapshot_or_empty, TickerSource};
use crate::price_infra::{ExchangeSnapshot, SourceConfig, TickerQuote};
use crate::types::{AssetSymbol, SourceId};

const QUOTE_SUFFIX: &str = "USDT";
const CONVERSION_SYMBOL: &str = "USDTTRY";

/// Binance spot tickers, converted from USDT to TRY.
pub struct BinanceConnector {
    source_id: SourceId,
    ticker_url: String,
    rate_url: String,
    fallback_quote_rate: Option<f64>,
    client: Client,
}

impl BinanceConnector {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(BinanceConnector {
            source_id: config.source_id,
            ticker_url: http::endpoint(&config.base_url, "/api/v3/ticker/24hr"),
            rate_url: http::endpoint(
                &config.base_url,
                &format!("/api/v3/ticker/price?symbol={}", CONVERSION_SYMBOL),
            ),
            fallback_quote_rate: config.fallback_quote_rate,
            client: http::client(config.timeout())?,
        })
    }

    async fn try_fetch(&self) -> Result<ExchangeSnapshot> {
        let (rate, tickers) = tokio::join!(
            self.quote_rate(),
            http::get_json::<Vec<BinanceTicker>>(&self.client, &self.ticker_url, self.source_id),
        );
        let rate = rate?;
        let tickers = tickers?;

        let mut snapshot = ExchangeSnapshot::new(self.source_id);
        for ticker in tickers {
            let Some(coin) = ticker.symbol.strip_suffix(QUOTE_SUFFIX) else {
                continue;
            };
            let (Ok(asset), Some(last_price), Some(change_24h)) = (
                AssetSymbol::new(coin),
                numeric(&ticker.last_price),
                numeric(&ticker.price_change_percent),
            ) else {
                continue;
            };

            snapshot.insert(asset, TickerQuote { price: last_price * rate, change_24h });
        }

        tracing::debug!(
            "Binance snapshot: {} USDT pairs at {:.4} TRY/USDT",
            snapshot.len(),
            rate
        );
        Ok(snapshot)
    }

    async fn quote_rate(&self) -> Result<f64> {
        match self.fetch_quote_rate().await {
            Ok(rate) => Ok(rate),
            Err(e) => match self.fallback_quote_rate {
                Some(fallback) => {
                    tracing::warn!(
                        "{} rate unavailable ({}), using fallback {}",
                        CONVERSION_SYMBOL,
                        e,
                        fallback
                    );
                    Ok(fallback)
                }
                None => Err(Error::QuoteRateUnavailable(self.source_id)),
            },
        }
    }

    async fn fetch_quote_rate(&self) -> Result<f64> {
        let ticker: BinancePrice =
            http::get_json(&self.client, &self.rate_url, self.source_id).await?;

        let rate = numeric(&ticker.price).ok_or_else(|| {
            Error::DeserializationError(format!("{} price is not numeric", CONVERSION_SYMBOL))
        })?;
        if rate <= 0.0 {
            return Err(Error::InvalidQuoteRate(rate));
        }

        Ok(rate)
    }
}

#[async_trait]
impl TickerSource for BinanceConnector {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    async fn fetch_snapshot(&self) -> ExchangeSnapshot {
        snapshot_or_empty(self.source_id, self.try_fetch().await)
    }
}

#[derive(Deserialize)]
struct BinanceTicker {
    symbol: String,
    #[serde(default, rename = "lastPrice")]
    last_price: Value,
    #[serde(default, rename = "priceChangePercent")]
    price_change_percent: Value,
}

#[derive(Deserialize)]
struct BinancePrice {
    #[serde(default)]
    price: Value,
}
