use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use crate::error::Result;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Collection metrics
    pub static ref COLLECTION_CYCLES: IntCounter = IntCounter::new(
        "collection_cycles_total",
        "Total number of collection cycles run"
    ).unwrap();

    pub static ref COLLECTION_CYCLE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "collection_cycle_duration_seconds",
            "Wall time of one collection cycle"
        ).buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0])
    ).unwrap();

    // Source metrics
    pub static ref SOURCE_FETCH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "source_fetch_failures_total",
            "Fetches that timed out or returned no data"
        ),
        &["source"]
    ).unwrap();

    pub static ref SOURCE_FETCH_LATENCY: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "source_fetch_latency_seconds",
            "Ticker fetch latency per source"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0]),
        &["source"]
    ).unwrap();

    // History metrics
    pub static ref OBSERVATIONS_RECORDED: IntCounter = IntCounter::new(
        "observations_recorded_total",
        "Price observations appended to history"
    ).unwrap();

    pub static ref OBSERVATIONS_REJECTED: IntCounter = IntCounter::new(
        "observations_rejected_total",
        "Non-positive or non-finite prices dropped"
    ).unwrap();

    pub static ref OBSERVATIONS_DEBOUNCED: IntCounter = IntCounter::new(
        "observations_debounced_total",
        "Observations dropped by the per-asset debounce"
    ).unwrap();

    pub static ref OBSERVATIONS_OTHER_SOURCE: IntCounter = IntCounter::new(
        "observations_other_source_total",
        "Assets skipped because the source feeding their history reported nothing"
    ).unwrap();

    pub static ref TRACKED_ASSETS: IntGauge = IntGauge::new(
        "tracked_assets",
        "Assets with at least one stored observation"
    ).unwrap();
}

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(COLLECTION_CYCLES.clone()))?;
    REGISTRY.register(Box::new(COLLECTION_CYCLE_DURATION.clone()))?;
    REGISTRY.register(Box::new(SOURCE_FETCH_FAILURES.clone()))?;
    REGISTRY.register(Box::new(SOURCE_FETCH_LATENCY.clone()))?;
    REGISTRY.register(Box::new(OBSERVATIONS_RECORDED.clone()))?;
    REGISTRY.register(Box::new(OBSERVATIONS_REJECTED.clone()))?;
    REGISTRY.register(Box::new(OBSERVATIONS_DEBOUNCED.clone()))?;
    REGISTRY.register(Box::new(OBSERVATIONS_OTHER_SOURCE.clone()))?;
    REGISTRY.register(Box::new(TRACKED_ASSETS.clone()))?;
    Ok(())
}
