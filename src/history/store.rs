use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::Instant;
use crate::config::AppConfig;
use crate::history::is_valid_price;
use crate::types::{AssetSymbol, SourceId};

/// Result of a single [`HistoryStore::append`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Recorded,
    /// Price was zero, negative or not finite.
    Rejected,
    /// Asset was written less than one debounce interval ago.
    Debounced,
    /// Asset's history is fed by a different source.
    OtherSource,
}

struct PriceHistory {
    prices: VecDeque<f64>,
    last_write: Instant,
    source: Option<SourceId>,
}

/// Process-wide rolling price history, keyed by asset.
///
/// ## Invariants
/// - every stored price is finite and strictly positive
/// - no asset holds more than `retention` observations; the oldest are
///   evicted first
/// - an asset is absent until its first accepted observation
/// - once a source feeds an asset, only that source's prices are appended
///   to it until the next `reset`
///
/// One `RwLock` guards the whole map. Appends (including the debounce
/// check and eviction) run under the write lock, so readers never see a
/// half-applied write.
pub struct HistoryStore {
    histories: RwLock<HashMap<AssetSymbol, PriceHistory>>,
    retention: usize,
    debounce: Duration,
    created_at: Instant,
}

impl HistoryStore {
    pub fn new(retention: usize, debounce: Duration) -> Self {
        HistoryStore {
            histories: RwLock::new(HashMap::new()),
            retention: retention.max(1),
            debounce,
            created_at: Instant::now(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.retention(), config.history.debounce())
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn append(&self, asset: &AssetSymbol, price: f64) -> AppendOutcome {
        self.insert(asset, None, price, Instant::now())
    }

    /// Appends a price observed by `source` during the cycle that started
    /// at `at`. Debounce compares cycle start instants, so fetch latency
    /// does not shift the spacing between samples.
    pub fn append_from(
        &self,
        source: SourceId,
        asset: &AssetSymbol,
        price: f64,
        at: Instant,
    ) -> AppendOutcome {
        self.insert(asset, Some(source), price, at)
    }

    /// Source feeding `asset`, if any.
    pub fn source_of(&self, asset: &AssetSymbol) -> Option<SourceId> {
        self.read().get(asset).and_then(|h| h.source)
    }

    fn insert(
        &self,
        asset: &AssetSymbol,
        source: Option<SourceId>,
        price: f64,
        at: Instant,
    ) -> AppendOutcome {
        if !is_valid_price(price) {
            tracing::trace!(%asset, price, "dropping invalid observation");
            return AppendOutcome::Rejected;
        }

        let mut histories = self.write();

        match histories.get_mut(asset) {
            Some(history) => {
                if let (Some(owner), Some(source)) = (history.source, source) {
                    if owner != source {
                        return AppendOutcome::OtherSource;
                    }
                }
                if at.saturating_duration_since(history.last_write) < self.debounce {
                    return AppendOutcome::Debounced;
                }

                history.prices.push_back(price);
                history.last_write = at;
                history.source = history.source.or(source);
                while history.prices.len() > self.retention {
                    history.prices.pop_front();
                }
            }
            None => {
                let mut prices = VecDeque::with_capacity(self.retention.min(1024));
                prices.push_back(price);
                histories.insert(
                    asset.clone(),
                    PriceHistory {
                        prices,
                        last_write: at,
                        source,
                    },
                );
            }
        }

        AppendOutcome::Recorded
    }

    /// Copy of the asset's observations, oldest first. Empty if unseen.
    pub fn get_history(&self, asset: &AssetSymbol) -> Vec<f64> {
        self.read()
            .get(asset)
            .map(|h| h.prices.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Percentage change from the observation `samples` back to the latest.
    ///
    /// With fewer than `samples` observations the oldest one is the
    /// baseline. Unknown assets and non-positive baselines yield `0.0`.
    pub fn trailing_change(&self, asset: &AssetSymbol, samples: usize) -> f64 {
        let histories = self.read();
        let Some(history) = histories.get(asset) else {
            return 0.0;
        };

        let prices = &history.prices;
        let Some(&latest) = prices.back() else {
            return 0.0;
        };

        let idx = prices.len().saturating_sub(samples.max(1));
        let base = prices[idx];
        if base <= 0.0 {
            return 0.0;
        }

        (latest - base) / base * 100.0
    }

    pub fn latest(&self, asset: &AssetSymbol) -> Option<f64> {
        self.read().get(asset).and_then(|h| h.prices.back().copied())
    }

    pub fn observations(&self, asset: &AssetSymbol) -> usize {
        self.read().get(asset).map_or(0, |h| h.prices.len())
    }

    /// Tracked assets, sorted.
    pub fn assets(&self) -> Vec<AssetSymbol> {
        let mut assets: Vec<_> = self.read().keys().cloned().collect();
        assets.sort();
        assets
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn reset(&self) {
        let mut histories = self.write();
        let cleared = histories.len();
        histories.clear();
        tracing::info!("Price history reset: {} assets cleared", cleared);
    }

    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<AssetSymbol, PriceHistory>> {
        self.histories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<AssetSymbol, PriceHistory>> {
        self.histories.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> AssetSymbol {
        AssetSymbol::new(s).unwrap()
    }

    fn undebounced(retention: usize) -> HistoryStore {
        HistoryStore::new(retention, Duration::ZERO)
    }

    #[test]
    fn non_positive_prices_are_dropped() {
        let store = undebounced(10);
        let btc = sym("BTC");

        assert_eq!(store.append(&btc, 0.0), AppendOutcome::Rejected);
        assert_eq!(store.append(&btc, -5.0), AppendOutcome::Rejected);
        assert_eq!(store.append(&btc, f64::NAN), AppendOutcome::Rejected);
        assert!(store.get_history(&btc).is_empty());
        assert!(store.is_empty());

        store.append(&btc, 1.5);
        store.append(&btc, 0.0);
        store.append(&btc, -5.0);
        assert_eq!(store.get_history(&btc), vec![1.5]);
    }

    #[test]
    fn evicts_oldest_beyond_retention() {
        let store = undebounced(3);
        let eth = sym("ETH");

        for p in 1..=5 {
            store.append(&eth, p as f64);
        }

        assert_eq!(store.get_history(&eth), vec![3.0, 4.0, 5.0]);
        assert_eq!(store.observations(&eth), 3);
    }

    #[test]
    fn trailing_change_over_full_window() {
        let store = undebounced(10);
        let btc = sym("BTC");
        for p in [100.0, 100.0, 100.0, 110.0] {
            store.append(&btc, p);
        }

        assert!((store.trailing_change(&btc, 4) - 10.0).abs() < 1e-9);
        // window of 2 compares the last two samples
        assert!((store.trailing_change(&btc, 2) - 10.0).abs() < 1e-9);
        assert_eq!(store.trailing_change(&btc, 1), 0.0);
    }

    #[test]
    fn short_history_uses_oldest_sample() {
        let store = undebounced(10);
        let sol = sym("SOL");
        store.append(&sol, 50.0);
        assert_eq!(store.trailing_change(&sol, 10), 0.0);

        store.append(&sol, 55.0);
        assert!((store.trailing_change(&sol, 10) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_asset_has_no_change() {
        let store = undebounced(10);
        assert_eq!(store.trailing_change(&sym("DOGE"), 240), 0.0);
        assert_eq!(store.trailing_change(&sym("DOGE"), 0), 0.0);
        assert!(store.latest(&sym("DOGE")).is_none());
    }

    #[test]
    fn reset_clears_every_asset() {
        let store = undebounced(10);
        store.append(&sym("BTC"), 1.0);
        store.append(&sym("ETH"), 2.0);
        assert_eq!(store.assets(), vec![sym("BTC"), sym("ETH")]);

        store.reset();

        assert!(store.get_history(&sym("BTC")).is_empty());
        assert!(store.get_history(&sym("ETH")).is_empty());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_drops_writes_inside_interval() {
        let store = HistoryStore::new(10, Duration::from_secs(14));
        let btc = sym("BTC");

        assert_eq!(store.append(&btc, 100.0), AppendOutcome::Recorded);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.append(&btc, 101.0), AppendOutcome::Debounced);
        assert_eq!(store.get_history(&btc), vec![100.0]);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.append(&btc, 102.0), AppendOutcome::Recorded);
        assert_eq!(store.get_history(&btc), vec![100.0, 102.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_is_per_asset() {
        let store = HistoryStore::new(10, Duration::from_secs(14));

        assert_eq!(store.append(&sym("BTC"), 1.0), AppendOutcome::Recorded);
        assert_eq!(store.append(&sym("ETH"), 2.0), AppendOutcome::Recorded);
        assert_eq!(store.append(&sym("BTC"), 3.0), AppendOutcome::Debounced);
    }

    #[test]
    fn history_stays_with_its_first_source() {
        let store = undebounced(10);
        let btc = sym("BTC");
        let at = Instant::now();

        assert_eq!(store.append_from(SourceId::Paribu, &btc, 100.0, at), AppendOutcome::Recorded);
        assert_eq!(store.append_from(SourceId::BtcTurk, &btc, 103.0, at), AppendOutcome::OtherSource);
        assert_eq!(store.append_from(SourceId::Paribu, &btc, 101.0, at), AppendOutcome::Recorded);
        assert_eq!(store.get_history(&btc), vec![100.0, 101.0]);
        assert_eq!(store.source_of(&btc), Some(SourceId::Paribu));

        store.reset();
        assert_eq!(store.append_from(SourceId::BtcTurk, &btc, 103.0, at), AppendOutcome::Recorded);
        assert_eq!(store.source_of(&btc), Some(SourceId::BtcTurk));
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_compares_given_instants() {
        let store = HistoryStore::new(10, Duration::from_secs(14));
        let btc = sym("BTC");
        let first = Instant::now();

        // written late in its cycle, the next cycle still lands 15s after
        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(store.append_from(SourceId::Paribu, &btc, 100.0, first), AppendOutcome::Recorded);

        tokio::time::advance(Duration::from_millis(12_500)).await;
        let second = first + Duration::from_secs(15);
        assert_eq!(store.append_from(SourceId::Paribu, &btc, 101.0, second), AppendOutcome::Recorded);
        assert_eq!(
            store.append_from(SourceId::Paribu, &btc, 102.0, second + Duration::from_secs(5)),
            AppendOutcome::Debounced
        );
        assert_eq!(store.get_history(&btc), vec![100.0, 101.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn uptime_tracks_elapsed_time() {
        let store = undebounced(1);
        tokio::time::advance(Duration::from_secs(90)).await;
        assert!(store.uptime() >= Duration::from_secs(90));
    }
}
