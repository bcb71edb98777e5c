use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use futures::future::join_all;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::Instrument;
use crate::history::{is_valid_price, AppendOutcome, HistoryStore};
use crate::observability::metrics::{
    COLLECTION_CYCLES, COLLECTION_CYCLE_DURATION, OBSERVATIONS_DEBOUNCED, OBSERVATIONS_RECORDED,
    OBSERVATIONS_OTHER_SOURCE, OBSERVATIONS_REJECTED, SOURCE_FETCH_FAILURES, SOURCE_FETCH_LATENCY,
    TRACKED_ASSETS,
};
use crate::observability::tracing::{trace_collection_cycle, trace_source_fetch};
use crate::price_infra::connectors::SourceHandle;
use crate::price_infra::{ExchangeSnapshot, SnapshotBoard, SourceToggles};
use crate::types::{AssetSymbol, SourceId};

/// Outcome of one collection cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub sources_skipped: usize,
    pub recorded: usize,
    pub rejected: usize,
    pub debounced: usize,
    /// Assets whose own source reported nothing this cycle.
    pub other_source: usize,
}

/// Polls every enabled source on a fixed period and feeds the history.
///
/// ## Cycle
/// 1. fetch all enabled sources concurrently, each under its own timeout
/// 2. publish each snapshot to the board (empty on failure)
/// 3. append one price per asset to the history store, stamped with the
///    cycle start. An asset keeps the source that first fed it; new assets
///    take the first source in priority order.
///
/// Debounce compares cycle start instants, never append times.
///
/// A failing or slow source only costs its own data for that cycle.
pub struct Collector {
    sources: Vec<SourceHandle>,
    store: Arc<HistoryStore>,
    board: Arc<SnapshotBoard>,
    toggles: Arc<SourceToggles>,
    period: Duration,
    cycles: AtomicU64,
}

impl Collector {
    pub fn new(
        sources: Vec<SourceHandle>,
        store: Arc<HistoryStore>,
        board: Arc<SnapshotBoard>,
        toggles: Arc<SourceToggles>,
        period: Duration,
    ) -> Self {
        Collector {
            sources,
            store,
            board,
            toggles,
            period,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Runs until the task is aborted. The first cycle starts immediately;
    /// an overrunning cycle pushes the schedule back instead of bursting.
    pub async fn run(&self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Collector started: {} sources, period {:?}",
            self.sources.len(),
            self.period
        );

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let span = trace_collection_cycle(cycle);

        async move {
            let started = Instant::now();
            let mut report = CycleReport {
                cycle,
                ..CycleReport::default()
            };

            let (active, skipped): (Vec<_>, Vec<_>) = self
                .sources
                .iter()
                .partition(|h| self.toggles.is_enabled(h.source_id()));

            for handle in &skipped {
                self.board.clear(handle.source_id());
            }
            report.sources_skipped = skipped.len();

            let snapshots = join_all(active.iter().map(|h| self.fetch(h))).await;

            let mut candidates: HashMap<AssetSymbol, Vec<(SourceId, f64)>> = HashMap::new();
            for snapshot in snapshots {
                if snapshot.is_empty() {
                    report.sources_failed += 1;
                    SOURCE_FETCH_FAILURES
                        .with_label_values(&[snapshot.source_id.as_str()])
                        .inc();
                } else {
                    report.sources_ok += 1;
                }

                // `active` keeps configuration order, so candidates are ranked.
                for (asset, quote) in &snapshot.quotes {
                    if is_valid_price(quote.price) {
                        candidates
                            .entry(asset.clone())
                            .or_default()
                            .push((snapshot.source_id, quote.price));
                    }
                }

                self.board.publish(snapshot);
            }

            for (asset, ranked) in &candidates {
                let outcome = ranked
                    .iter()
                    .map(|(source, price)| self.store.append_from(*source, asset, *price, started))
                    .find(|outcome| *outcome != AppendOutcome::OtherSource)
                    .unwrap_or(AppendOutcome::OtherSource);

                match outcome {
                    AppendOutcome::Recorded => report.recorded += 1,
                    AppendOutcome::Rejected => report.rejected += 1,
                    AppendOutcome::Debounced => report.debounced += 1,
                    AppendOutcome::OtherSource => report.other_source += 1,
                }
            }

            COLLECTION_CYCLES.inc();
            COLLECTION_CYCLE_DURATION.observe(started.elapsed().as_secs_f64());
            OBSERVATIONS_RECORDED.inc_by(report.recorded as u64);
            OBSERVATIONS_REJECTED.inc_by(report.rejected as u64);
            OBSERVATIONS_DEBOUNCED.inc_by(report.debounced as u64);
            OBSERVATIONS_OTHER_SOURCE.inc_by(report.other_source as u64);
            TRACKED_ASSETS.set(self.store.len() as i64);

            tracing::info!(
                ok = report.sources_ok,
                failed = report.sources_failed,
                skipped = report.sources_skipped,
                recorded = report.recorded,
                debounced = report.debounced,
                other_source = report.other_source,
                "Collection cycle {} complete in {:?}",
                cycle,
                started.elapsed()
            );

            report
        }
        .instrument(span)
        .await
    }

    async fn fetch(&self, handle: &SourceHandle) -> ExchangeSnapshot {
        let source_id = handle.source_id();
        let started = Instant::now();

        let result = tokio::time::timeout(handle.timeout, handle.source.fetch_snapshot())
            .instrument(trace_source_fetch(source_id))
            .await;

        SOURCE_FETCH_LATENCY
            .with_label_values(&[source_id.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(snapshot) => snapshot,
            Err(_) => {
                tracing::warn!("Source {} timed out after {:?}", source_id, handle.timeout);
                ExchangeSnapshot::new(source_id)
            }
        }
    }
}
