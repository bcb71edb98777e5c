use std::sync::Arc;
use std::time::Duration;
use crate::config::AppConfig;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::market::MarketView;
use crate::price_infra::connectors::{build_sources, SourceHandle};
use crate::price_infra::{Collector, SnapshotBoard, SourceToggles};
use crate::utils::TaskSupervisor;

const COLLECTOR_TASK: &str = "collector";

/// Owns the history store, snapshot board and collector task.
///
/// Constructed once at startup; consumers get the shared pieces through
/// the accessors. Collection starts in [`PriceService::start`] and stops in
/// [`PriceService::shutdown`].
pub struct PriceService {
    store: Arc<HistoryStore>,
    board: Arc<SnapshotBoard>,
    toggles: Arc<SourceToggles>,
    view: Arc<MarketView>,
    collector: Arc<Collector>,
    supervisor: TaskSupervisor,
}

impl PriceService {
    /// Builds HTTP adapters for every configured source and starts collecting.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sources = build_sources(&config.sources)?;
        Self::start(config, sources)
    }

    /// Must be called from within a Tokio runtime.
    pub fn start(config: &AppConfig, sources: Vec<SourceHandle>) -> Result<Self> {
        config.validate()?;

        let period = config.collector.period();
        let store = Arc::new(HistoryStore::from_config(config));
        let board = Arc::new(SnapshotBoard::new());
        let toggles = Arc::new(SourceToggles::from_configs(&config.sources));
        let view = Arc::new(MarketView::new(store.clone(), board.clone(), period, &config.sources));
        let collector = Arc::new(Collector::new(
            sources,
            store.clone(),
            board.clone(),
            toggles.clone(),
            period,
        ));

        let mut supervisor = TaskSupervisor::new();
        let task = collector.clone();
        supervisor.spawn(COLLECTOR_TASK, async move { task.run().await });

        tracing::info!(
            "Price service started: retention={} debounce={:?} period={:?}",
            store.retention(),
            store.debounce(),
            period
        );

        Ok(PriceService {
            store,
            board,
            toggles,
            view,
            collector,
            supervisor,
        })
    }

    pub fn store(&self) -> Arc<HistoryStore> {
        self.store.clone()
    }

    pub fn board(&self) -> Arc<SnapshotBoard> {
        self.board.clone()
    }

    pub fn toggles(&self) -> Arc<SourceToggles> {
        self.toggles.clone()
    }

    pub fn view(&self) -> Arc<MarketView> {
        self.view.clone()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.collector.cycles_completed()
    }

    pub fn uptime(&self) -> Duration {
        self.store.uptime()
    }

    pub fn is_collecting(&self) -> bool {
        self.supervisor.is_running(COLLECTOR_TASK)
    }

    pub fn check_health(&mut self) -> Result<()> {
        self.supervisor.check_health()
    }

    pub async fn shutdown(&mut self) {
        self.supervisor.shutdown_all().await;
        tracing::info!(
            "Price service stopped after {} cycles, uptime {:?}",
            self.collector.cycles_completed(),
            self.store.uptime()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::connectors::MockTickerSource;
    use crate::price_infra::{ExchangeSnapshot, TickerQuote};
    use crate::types::{AssetSymbol, SourceId};

    fn paribu() -> SourceHandle {
        let mut mock = MockTickerSource::new();
        mock.expect_source_id().return_const(SourceId::Paribu);
        mock.expect_fetch_snapshot().returning(|| {
            let mut snapshot = ExchangeSnapshot::new(SourceId::Paribu);
            snapshot.insert(
                AssetSymbol::new("BTC").unwrap(),
                TickerQuote { price: 100.0, change_24h: 1.0 },
            );
            snapshot
        });
        SourceHandle::new(Arc::new(mock), Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn collects_until_shutdown() {
        let config = AppConfig::default();
        let mut service = PriceService::start(&config, vec![paribu()]).unwrap();
        let btc = AssetSymbol::new("BTC").unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(service.is_collecting());
        assert!(service.check_health().is_ok());
        assert_eq!(service.store().observations(&btc), 3);
        assert_eq!(service.board().price(SourceId::Paribu, &btc), Some(100.0));

        service.shutdown().await;
        assert!(!service.is_collecting());

        let cycles = service.cycles_completed();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.cycles_completed(), cycles);
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.collector.period_secs = 0;
        assert!(PriceService::start(&config, vec![]).is_err());
    }
}
