//! Market Sync Binary
//!
//! Starts the market data synchronizer: one upstream WebSocket connection,
//! REST polling loops per tracked symbol, and the in-process fan-out hub.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin market-sync
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `MARKET_SYNC_SYMBOLS`: Comma-separated symbols (default: BTC/USD,ETH/USD,SOL/USD,ADA/USD)
//! - `MARKET_SYNC_STREAM_URL`: Upstream WebSocket URL (default: <ws://localhost:8000/api/ws>)
//! - `MARKET_SYNC_REST_BASE_URL`: Snapshot provider base URL (default: <https://api.binance.com>)
//! - `MARKET_SYNC_RECONNECT_ENABLED`: Enable auto-reconnect (default: true)
//! - `MARKET_SYNC_RECONNECT_INTERVAL_SECS`: Delay between reconnects (default: 3)
//! - `MARKET_SYNC_MAX_RECONNECT_ATTEMPTS`: Reconnects before giving up (default: 5)
//! - `MARKET_SYNC_TICKER_INTERVAL_SECS`: Ticker poll cadence (default: 2)
//! - `MARKET_SYNC_ORDER_BOOK_INTERVAL_SECS`: Depth poll cadence (default: 2)
//! - `MARKET_SYNC_CANDLE_POLL_SECS`: Kline poll cadence (default: 30)
//! - `MARKET_SYNC_CANDLE_INTERVAL`: Canonical candle interval (default: 1h)
//! - `MARKET_SYNC_KLINE_LIMIT`: Candles per poll (default: 100)
//! - `MARKET_SYNC_CHANNEL_CAPACITY`: Per-subscriber channel capacity (default: 1024)
//! - `MARKET_SYNC_CANDLE_WINDOW`: Stored candles per series, 100-1000 (default: 500)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use market_sync::infrastructure::telemetry;
use market_sync::{
    MarketHub, MarketStore, MarketSyncService, PollKinds, PollingConfig, PollingFetcher,
    RestClient, RestConfig, StaticSnapshots, StreamConfig, StreamConnection, SyncConfig,
};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    tracing::info!("Starting market sync");

    let config = SyncConfig::from_env()?;
    log_config(&config);

    let store = Arc::new(MarketStore::new(config.candle_window));
    let hub = Arc::new(MarketHub::new(config.channel_capacity));
    let sync = Arc::new(MarketSyncService::new(
        Arc::clone(&store),
        Arc::clone(&hub) as _,
    ));

    let connection = Arc::new(StreamConnection::new(
        StreamConfig {
            url: config.stream.url.clone(),
            reconnect: config.stream.reconnect.clone(),
        },
        Arc::clone(&sync),
    ));
    connection.connect();

    let mut rest_config = RestConfig::new(config.polling.base_url.clone());
    rest_config.timeout = config.polling.request_timeout;
    let rest_client = Arc::new(RestClient::new(rest_config)?);

    let fetcher = Arc::new(PollingFetcher::new(
        PollingConfig {
            ticker_interval: config.polling.ticker_interval,
            order_book_interval: config.polling.order_book_interval,
            candle_interval: config.polling.candle_interval,
            candle_timeframe: config.polling.candle_timeframe,
            kline_limit: config.polling.kline_limit,
        },
        rest_client,
        Arc::new(StaticSnapshots::new()),
        Arc::clone(&sync),
    ));
    for symbol in &config.symbols {
        fetcher.start(symbol, PollKinds::all());
    }

    tracing::info!("Market sync ready");

    await_shutdown().await;

    fetcher.stop_all();
    connection.disconnect();

    tracing::info!("Market sync stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &SyncConfig) {
    tracing::info!(
        symbols = ?config.symbols,
        stream_url = %config.stream.url,
        rest_base_url = %config.polling.base_url,
        candle_timeframe = %config.polling.candle_timeframe,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
