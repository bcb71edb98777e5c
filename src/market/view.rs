use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::history::{is_valid_price, HistoryStore, LookbackWindow, WindowSpan};
use crate::price_infra::{SnapshotBoard, SourceConfig};
use crate::types::{AssetSymbol, SourceId};

/// One line of a market board.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoardRow {
    pub asset: AssetSymbol,
    /// Primary exchange price, `None` when it does not list the asset.
    pub price: Option<f64>,
    /// Percentage change over the requested window, unrounded.
    pub change: f64,
    pub prices: BTreeMap<SourceId, f64>,
    /// Fetch time of the primary snapshot the row was read from.
    pub as_of: Option<DateTime<Utc>>,
}

/// Answers "how much did X move over window W on exchange E".
pub struct MarketView {
    store: Arc<HistoryStore>,
    board: Arc<SnapshotBoard>,
    period: Duration,
    sources: Vec<SourceId>,
    peer_listed: HashSet<SourceId>,
}

impl MarketView {
    pub fn new(
        store: Arc<HistoryStore>,
        board: Arc<SnapshotBoard>,
        period: Duration,
        configs: &[SourceConfig],
    ) -> Self {
        MarketView {
            store,
            board,
            period,
            sources: configs.iter().map(|c| c.source_id).collect(),
            peer_listed: configs
                .iter()
                .filter(|c| c.listing_from_peers)
                .map(|c| c.source_id)
                .collect(),
        }
    }

    /// Trailing windows come from stored history; the 24h window is the
    /// primary exchange's own figure. Missing data reads as `0.0`.
    pub fn change(&self, asset: &AssetSymbol, window: LookbackWindow, primary: SourceId) -> f64 {
        match window.span(self.period) {
            WindowSpan::Trailing(samples) => self.store.trailing_change(asset, samples),
            WindowSpan::ExchangeReported => self
                .board
                .quote(primary, asset)
                .map(|q| q.change_24h)
                .unwrap_or(0.0),
        }
    }

    /// Rows for every asset `primary` lists, biggest gainers first.
    pub fn board(&self, primary: SourceId, window: LookbackWindow) -> Vec<BoardRow> {
        let as_of = self.board.fetched_at(primary);
        let mut rows: Vec<BoardRow> = self
            .universe(primary)
            .into_iter()
            .map(|asset| self.row(asset, primary, window, as_of))
            .collect();

        rows.sort_by(|a, b| {
            b.change
                .partial_cmp(&a.change)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.asset.cmp(&b.asset))
        });
        rows
    }

    pub fn top_movers(&self, primary: SourceId, window: LookbackWindow, n: usize) -> Vec<BoardRow> {
        let mut rows = self.board(primary, window);
        rows.truncate(n);
        rows
    }

    fn universe(&self, primary: SourceId) -> BTreeSet<AssetSymbol> {
        if self.peer_listed.contains(&primary) {
            self.sources
                .iter()
                .filter(|s| **s != primary)
                .flat_map(|s| self.board.listing(*s))
                .collect()
        } else {
            self.board.listing(primary).into_iter().collect()
        }
    }

    fn row(
        &self,
        asset: AssetSymbol,
        primary: SourceId,
        window: LookbackWindow,
        as_of: Option<DateTime<Utc>>,
    ) -> BoardRow {
        let prices: BTreeMap<SourceId, f64> = self
            .sources
            .iter()
            .filter_map(|s| {
                self.board
                    .price(*s, &asset)
                    .filter(|p| is_valid_price(*p))
                    .map(|p| (*s, p))
            })
            .collect();

        BoardRow {
            price: prices.get(&primary).copied(),
            change: self.change(&asset, window, primary),
            prices,
            asset,
            as_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::{ExchangeSnapshot, TickerQuote};

    fn sym(s: &str) -> AssetSymbol {
        AssetSymbol::new(s).unwrap()
    }

    fn publish(board: &SnapshotBoard, source_id: SourceId, quotes: &[(&str, f64, f64)]) {
        let mut snapshot = ExchangeSnapshot::new(source_id);
        for (coin, price, change_24h) in quotes {
            snapshot.insert(sym(coin), TickerQuote { price: *price, change_24h: *change_24h });
        }
        board.publish(snapshot);
    }

    fn view() -> (Arc<HistoryStore>, Arc<SnapshotBoard>, MarketView) {
        let store = Arc::new(HistoryStore::new(1000, Duration::ZERO));
        let board = Arc::new(SnapshotBoard::new());
        let view = MarketView::new(
            store.clone(),
            board.clone(),
            Duration::from_secs(15),
            &SourceConfig::defaults(),
        );
        (store, board, view)
    }

    #[test]
    fn trailing_window_reads_history() {
        let (store, _, view) = view();
        let btc = sym("BTC");
        for p in [100.0, 105.0, 110.0] {
            store.append(&btc, p);
        }

        let change = view.change(&btc, LookbackWindow::OneHour, SourceId::Paribu);
        assert!((change - 10.0).abs() < 1e-9);
    }

    #[test]
    fn day_window_passes_exchange_figure_through() {
        let (store, board, view) = view();
        let btc = sym("BTC");
        store.append(&btc, 100.0);
        store.append(&btc, 200.0);
        publish(&board, SourceId::BtcTurk, &[("BTC", 200.0, -3.25)]);

        assert_eq!(view.change(&btc, LookbackWindow::TwentyFourHours, SourceId::BtcTurk), -3.25);
        assert_eq!(view.change(&btc, LookbackWindow::TwentyFourHours, SourceId::Paribu), 0.0);
    }

    #[test]
    fn board_is_sorted_by_change_descending() {
        let (_, board, view) = view();
        publish(
            &board,
            SourceId::Paribu,
            &[("BTC", 100.0, 1.0), ("ETH", 10.0, 5.0), ("AVAX", 1.0, -2.0), ("SOL", 2.0, 5.0)],
        );

        let rows = view.board(SourceId::Paribu, LookbackWindow::TwentyFourHours);
        let order: Vec<_> = rows.iter().map(|r| r.asset.to_string()).collect();

        assert_eq!(order, vec!["ETH", "SOL", "BTC", "AVAX"]);
        assert_eq!(rows[0].price, Some(10.0));
        assert_eq!(rows[0].as_of, board.fetched_at(SourceId::Paribu));
        assert!(rows[0].as_of.is_some());
    }

    #[test]
    fn peer_listed_primary_uses_other_listings() {
        let (_, board, view) = view();
        publish(&board, SourceId::Paribu, &[("BTC", 100.0, 0.0)]);
        publish(&board, SourceId::BtcTurk, &[("ETH", 10.0, 0.0)]);
        publish(&board, SourceId::Binance, &[("BTC", 101.0, 0.0), ("PEPE", 0.001, 0.0)]);

        let rows = view.board(SourceId::Binance, LookbackWindow::OneHour);
        let assets: BTreeSet<_> = rows.iter().map(|r| r.asset.to_string()).collect();

        assert_eq!(assets, BTreeSet::from(["BTC".to_string(), "ETH".to_string()]));
        let eth = rows.iter().find(|r| r.asset == sym("ETH")).unwrap();
        assert_eq!(eth.price, None);
        assert_eq!(eth.prices.get(&SourceId::BtcTurk), Some(&10.0));

        let btc = rows.iter().find(|r| r.asset == sym("BTC")).unwrap();
        assert_eq!(btc.price, Some(101.0));
        assert_eq!(btc.prices.len(), 2);
        assert_eq!(btc.as_of, board.fetched_at(SourceId::Binance));
    }

    #[test]
    fn top_movers_truncates() {
        let (_, board, view) = view();
        publish(&board, SourceId::Paribu, &[("A", 1.0, 1.0), ("B", 1.0, 2.0), ("C", 1.0, 3.0)]);

        let rows = view.top_movers(SourceId::Paribu, LookbackWindow::TwentyFourHours, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].asset, sym("C"));
    }
}
