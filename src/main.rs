use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use arbcore::cache::BookCache;
use arbcore::catalog::{CatalogClient, HttpCatalogClient};
use arbcore::config::Config;
use arbcore::detector::DetectorConfig;
use arbcore::dispatcher::{DispatchConfig, Dispatcher};
use arbcore::feed::{FeedClient, FeedConfig};
use arbcore::gateway::{DryRunGateway, HttpGateway, TradingGateway};
use arbcore::registry::Registry;
use arbcore::risk::RiskLedger;
use arbcore::stats;

/// Real-time arbitrage core for binary-outcome prediction markets.
#[derive(Parser, Debug)]
#[command(name = "arbcore", version, about)]
struct Cli {
    /// Path to a TOML configuration file, layered over the built-in defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force dry-run mode regardless of configuration.
    #[arg(long)]
    dry_run: bool,

    /// Override the configured log level (e.g. debug, info, warn).
    #[arg(long)]
    log_level: Option<String>,

    /// Number of active markets to fetch from the catalog at startup.
    #[arg(long, default_value_t = 1000)]
    market_limit: usize,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if format.eq_ignore_ascii_case("json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    init_tracing(&config.log_level, &config.log_format);

    info!(dry_run = config.dry_run, "starting arbitrage core");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let catalog = HttpCatalogClient::new(http.clone(), config.catalog_api_url.clone());
    let markets = catalog.list_active_markets(cli.market_limit).await?;
    let registry = Arc::new(Registry::from_markets(&markets));
    info!(markets = registry.market_count(), "registry built from catalog");

    let cache = Arc::new(BookCache::new());
    let risk = Arc::new(RiskLedger::new(
        config.max_position_quote,
        config.max_total_exposure_quote,
    ));

    let gateway: Arc<dyn TradingGateway> = if config.dry_run {
        Arc::new(DryRunGateway)
    } else {
        Arc::new(HttpGateway::new(http.clone(), config.catalog_api_url.clone()))
    };

    let mut dispatcher = Dispatcher::new(
        registry.clone(),
        cache.clone(),
        gateway,
        risk.clone(),
        DetectorConfig {
            fee_rate: config.fee_rate,
            min_net_spread: config.min_net_spread,
            min_profit: config.min_profit_quote,
        },
        DispatchConfig {
            cooldown_s: config.cooldown_s,
            max_position_quote: config.max_position_quote,
            bankroll_quote: config.bankroll_quote,
            per_trade_fraction: config.per_trade_fraction,
        },
    );
    let dispatch_stats = dispatcher.stats_handle();

    let feed = FeedClient::new(FeedConfig {
        ws_url: config.feed_ws_url.clone(),
        subscribe_batch_size: config.subscribe_batch_size,
        reconnect_delay_s: config.reconnect_delay_s,
    });
    let feed_stats = feed.stats_handle();

    let stats_task = tokio::spawn(stats::run(
        feed_stats,
        dispatch_stats,
        cache.clone(),
        Duration::from_secs(config.stats_interval_s),
    ));

    let token_ids = registry.all_token_ids();
    let feed_cache = cache.clone();
    let feed_task = tokio::spawn(async move {
        feed.run(&token_ids, |event| {
            let asset_id = match &event {
                arbcore::feed::FeedEvent::Book(book) => {
                    feed_cache.apply_snapshot(book);
                    &book.asset_id
                }
                arbcore::feed::FeedEvent::PriceChange(change) => {
                    feed_cache.apply_delta(&change.asset_id, &change.changes);
                    &change.asset_id
                }
                _ => return,
            };
            dispatcher.on_token_updated(&arbcore::domain::ids::TokenId::from(asset_id.as_str()));
        })
        .await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, exiting");
        }
        result = feed_task => {
            if let Err(err) = result {
                error!(error = %err, "feed task panicked");
            }
        }
    }

    stats_task.abort();
    Ok(())
}
