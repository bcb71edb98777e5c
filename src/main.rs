use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::time::Duration;
use pricewatch::config::AppConfig;
use pricewatch::observability::metrics::register_metrics;
use pricewatch::observability::tracing::init_tracing;
use pricewatch::{LookbackWindow, PriceService, SourceId};

#[derive(Parser, Debug)]
#[command(version, about = "Polls exchange tickers and tracks short-horizon price changes")]
struct Args {
    /// Configuration environment, loads `{config_dir}/{env}.toml` over the defaults
    #[arg(long, default_value = "development")]
    env: String,

    /// Directory holding `default.toml` and per-environment overrides
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Exchange whose board is logged in the periodic summary
    #[arg(long)]
    primary: Option<SourceId>,

    /// Window used for the periodic summary (1h, 4h, 24h)
    #[arg(long, default_value = "1h")]
    window: LookbackWindow,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config_dir, &args.env)
        .with_context(|| format!("loading configuration from {}", args.config_dir))?;
    init_tracing(&config.logging)?;
    register_metrics()?;

    let primary = args
        .primary
        .or_else(|| config.sources.iter().find(|s| s.enabled).map(|s| s.source_id))
        .context("no enabled source to summarize")?;

    let mut service = PriceService::from_config(&config)?;
    let view = service.view();
    let store = service.store();
    let board = service.board();

    let mut summary = tokio::time::interval(Duration::from_secs(
        config.logging.summary_interval_secs.max(1),
    ));
    summary.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = summary.tick() => {
                if let Err(e) = service.check_health() {
                    tracing::error!("Collector stopped: {}", e);
                    break;
                }

                tracing::info!(
                    "{} assets tracked after {} cycles, uptime {:?}",
                    store.len(),
                    service.cycles_completed(),
                    store.uptime()
                );
                match board.fetched_at(primary) {
                    Some(at) => tracing::info!(
                        "{} snapshot is {}s old",
                        primary,
                        (Utc::now() - at).num_seconds()
                    ),
                    None => tracing::warn!("No snapshot from {} yet", primary),
                }
                for row in view.top_movers(primary, args.window, config.logging.summary_top) {
                    tracing::info!(
                        "{} {} {}: {:+.2}% (price {:?})",
                        primary,
                        args.window,
                        row.asset,
                        row.change,
                        row.price
                    );
                }
            }
        }
    }

    service.shutdown().await;
    Ok(())
}
