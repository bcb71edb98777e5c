pub mod binance;
pub mod btcturk;
pub mod http;
pub mod paribu;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use crate::error::Result;
use crate::price_infra::{ExchangeSnapshot, SourceConfig};
use crate::types::SourceId;

pub use binance::BinanceConnector;
pub use btcturk::BtcTurkConnector;
pub use paribu::ParibuConnector;

/// Boundary to one exchange's ticker endpoint.
///
/// `fetch_snapshot` never fails: transport and parsing errors are logged
/// inside the adapter and surface as an empty snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TickerSource: Send + Sync {
    fn source_id(&self) -> SourceId;
    async fn fetch_snapshot(&self) -> ExchangeSnapshot;
}

/// A source together with the collector-side deadline for its fetch.
#[derive(Clone)]
pub struct SourceHandle {
    pub source: Arc<dyn TickerSource>,
    pub timeout: Duration,
}

impl SourceHandle {
    pub fn new(source: Arc<dyn TickerSource>, timeout: Duration) -> Self {
        SourceHandle { source, timeout }
    }

    pub fn source_id(&self) -> SourceId {
        self.source.source_id()
    }
}

/// Builds one adapter per configured source, keeping configuration order.
pub fn build_sources(configs: &[SourceConfig]) -> Result<Vec<SourceHandle>> {
    configs
        .iter()
        .map(|config| -> Result<SourceHandle> {
            let source: Arc<dyn TickerSource> = match config.source_id {
                SourceId::Paribu => Arc::new(ParibuConnector::new(config)?),
                SourceId::BtcTurk => Arc::new(BtcTurkConnector::new(config)?),
                SourceId::Binance => Arc::new(BinanceConnector::new(config)?),
            };
            tracing::info!("Configured source {} at {}", config.source_id, config.base_url);
            Ok(SourceHandle::new(source, config.timeout()))
        })
        .collect()
}

/// Collapses an adapter failure into "no data this cycle".
pub(crate) fn snapshot_or_empty(source_id: SourceId, result: Result<ExchangeSnapshot>) -> ExchangeSnapshot {
    match result {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(source = %source_id, error = %e, "ticker fetch failed");
            ExchangeSnapshot::new(source_id)
        }
    }
}
