use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dex_sentinel::alerts::{build_sink, Dispatcher};
use dex_sentinel::api::{self, AppState};
use dex_sentinel::config::{parse_address, Config};
use dex_sentinel::indexer::{initial_cursor, Scanner};
use dex_sentinel::lookup::TokenInspector;
use dex_sentinel::pipeline::{EventPipeline, Thresholds};
use dex_sentinel::pricing::{AnchorQuoteSource, PriceOracle};
use dex_sentinel::risk::RiskEvaluator;
use dex_sentinel::rpc::{connect_pool, PooledChain};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=debug for per-range detail)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("DEX Sentinel starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    let dex = config.dex.addresses()?;
    tracing::info!(
        chain = %config.chain.name,
        chain_id = config.chain.chain_id,
        endpoints = config.chain.rpc_endpoints.len(),
        "Configuration loaded from {}",
        config_path
    );

    // One long-lived client per endpoint, shared by scanner and API
    let pool = connect_pool(&config.chain.rpc_endpoints, config.chain.rpc_timeout())?;
    let chain = Arc::new(PooledChain::new(pool));

    let quotes = AnchorQuoteSource::from_config(&config.quote)?;
    let oracle = Arc::new(PriceOracle::new(
        chain.clone(),
        dex.factory,
        dex.anchor,
        config.dex.anchor_decimals,
        quotes,
    ));
    let evaluator = Arc::new(RiskEvaluator::new(
        chain.clone(),
        dex.factory,
        dex.router,
        dex.anchor,
        config.risk.buy_amount(config.dex.anchor_decimals),
        parse_address("risk.simulation_sender", &config.risk.simulation_sender)?,
    ));

    let sink = build_sink(&config.delivery)?;
    let dispatcher = Arc::new(Dispatcher::new(
        sink,
        Duration::from_secs(config.alerts.seen_ttl_secs),
        config.alerts.seen_capacity,
    ));

    // Seed subscribers from config
    for subscriber in &config.subscribers {
        let id = dispatcher.subscribe(&subscriber.destination).await;
        for raw in &subscriber.watched_wallets {
            let wallet = parse_address("subscribers.watched_wallets", raw)?;
            dispatcher
                .watch_wallet(id, wallet)
                .await
                .map_err(|e| eyre::eyre!("Failed to seed wallet watch: {}", e))?;
        }
    }
    if !config.subscribers.is_empty() {
        tracing::info!(subscribers = config.subscribers.len(), "Subscribers seeded");
    }

    // Spawn API server
    if config.api.enabled {
        let state = AppState {
            inspector: Arc::new(TokenInspector::new(chain.clone(), oracle.clone(), evaluator.clone())),
            dispatcher: dispatcher.clone(),
            chain: chain.clone(),
            lookup_timeout: Duration::from_millis(config.api.lookup_timeout_ms),
        };
        let host = config.api.host.clone();
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = api::serve(state, &host, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    let shutdown = CancellationToken::new();

    let pipeline = EventPipeline::new(
        chain.clone(),
        oracle,
        evaluator,
        Thresholds::from(&config.alerts),
    );
    let scanner_chain = chain.clone();
    let scanner_shutdown = shutdown.clone();
    let scanner_config = config.scanner.clone();
    let scanner = tokio::spawn(async move {
        let Some(cursor) =
            initial_cursor(scanner_chain.as_ref(), scanner_config.start_block, &scanner_shutdown).await
        else {
            return;
        };
        Scanner::new(
            scanner_chain,
            pipeline,
            dispatcher,
            dex.factory,
            dex.router,
            &scanner_config,
            cursor,
        )
        .run(scanner_shutdown)
        .await;
    });

    tracing::info!("Scanner started. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping scanner...");
    shutdown.cancel();

    let _ = scanner.await;

    tracing::info!("DEX Sentinel stopped gracefully");
    Ok(())
}
