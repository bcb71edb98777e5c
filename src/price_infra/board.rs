use chrono::{DateTime, Utc};
use dashmap::DashMap;
use crate::price_infra::{ExchangeSnapshot, TickerQuote};
use crate::types::{AssetSymbol, SourceId};

/// Latest snapshot per source, replaced wholesale every cycle.
#[derive(Default)]
pub struct SnapshotBoard {
    snapshots: DashMap<SourceId, ExchangeSnapshot>,
}

impl SnapshotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: ExchangeSnapshot) {
        self.snapshots.insert(snapshot.source_id, snapshot);
    }

    pub fn clear(&self, source_id: SourceId) {
        self.snapshots.remove(&source_id);
    }

    pub fn snapshot(&self, source_id: SourceId) -> Option<ExchangeSnapshot> {
        self.snapshots.get(&source_id).map(|s| s.value().clone())
    }

    pub fn quote(&self, source_id: SourceId, asset: &AssetSymbol) -> Option<TickerQuote> {
        self.snapshots
            .get(&source_id)
            .and_then(|s| s.get(asset).copied())
    }

    pub fn price(&self, source_id: SourceId, asset: &AssetSymbol) -> Option<f64> {
        self.quote(source_id, asset).map(|q| q.price)
    }

    /// When `source_id`'s latest snapshot was fetched.
    pub fn fetched_at(&self, source_id: SourceId) -> Option<DateTime<Utc>> {
        self.snapshots.get(&source_id).map(|s| s.fetched_at)
    }

    /// Assets listed by `source_id` in its latest snapshot.
    pub fn listing(&self, source_id: SourceId) -> Vec<AssetSymbol> {
        self.snapshots
            .get(&source_id)
            .map(|s| s.assets().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sources(&self) -> Vec<SourceId> {
        let mut sources: Vec<_> = self.snapshots.iter().map(|e| *e.key()).collect();
        sources.sort();
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(source_id: SourceId, quotes: &[(&str, f64)]) -> ExchangeSnapshot {
        let mut snapshot = ExchangeSnapshot::new(source_id);
        for (coin, price) in quotes {
            snapshot.insert(
                AssetSymbol::new(coin).unwrap(),
                TickerQuote { price: *price, change_24h: 1.0 },
            );
        }
        snapshot
    }

    #[test]
    fn publish_replaces_previous_snapshot() {
        let board = SnapshotBoard::new();
        let btc = AssetSymbol::new("BTC").unwrap();
        let eth = AssetSymbol::new("ETH").unwrap();

        board.publish(snapshot(SourceId::Paribu, &[("BTC", 10.0), ("ETH", 2.0)]));
        board.publish(snapshot(SourceId::Paribu, &[("BTC", 11.0)]));

        assert_eq!(board.price(SourceId::Paribu, &btc), Some(11.0));
        assert_eq!(board.price(SourceId::Paribu, &eth), None);
        assert_eq!(board.listing(SourceId::Paribu), vec![btc]);
    }

    #[test]
    fn clear_removes_source() {
        let board = SnapshotBoard::new();
        board.publish(snapshot(SourceId::Binance, &[("BTC", 10.0)]));
        board.publish(snapshot(SourceId::BtcTurk, &[("BTC", 10.0)]));
        assert_eq!(board.sources(), vec![SourceId::BtcTurk, SourceId::Binance]);

        board.clear(SourceId::Binance);
        assert!(board.snapshot(SourceId::Binance).is_none());
        assert!(board.listing(SourceId::Binance).is_empty());
        assert!(board.fetched_at(SourceId::Binance).is_none());
    }

    #[test]
    fn fetched_at_follows_latest_publish() {
        let board = SnapshotBoard::new();
        let mut older = snapshot(SourceId::Paribu, &[("BTC", 10.0)]);
        older.fetched_at = older.fetched_at - chrono::Duration::seconds(30);
        let stamp = older.fetched_at;

        board.publish(older);
        assert_eq!(board.fetched_at(SourceId::Paribu), Some(stamp));

        let newer = snapshot(SourceId::Paribu, &[("BTC", 11.0)]);
        let stamp = newer.fetched_at;
        board.publish(newer);
        assert_eq!(board.fetched_at(SourceId::Paribu), Some(stamp));
    }
}
