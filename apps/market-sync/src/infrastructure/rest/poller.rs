//! Polling Fallback Fetcher
//!
//! Fixed-cadence REST polling per tracked symbol. Each poll kind (ticker,
//! order book, candles) runs on its own timer; ticks never skip the
//! cadence on failure. A failed fetch keeps whatever the store already
//! holds; only a key the store has never seen is seeded from the static
//! fallback provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::SnapshotSource;
use crate::application::services::MarketSyncService;
use crate::domain::events::MarketEvent;
use crate::domain::market::{Interval, Symbol};

/// Cadence and shape of the polling loops.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Ticker poll cadence.
    pub ticker_interval: Duration,
    /// Order book poll cadence.
    pub order_book_interval: Duration,
    /// Candle poll cadence.
    pub candle_interval: Duration,
    /// Canonical interval polled for candles.
    pub candle_timeframe: Interval,
    /// Candles requested per poll.
    pub kline_limit: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            ticker_interval: Duration::from_secs(2),
            order_book_interval: Duration::from_secs(2),
            candle_interval: Duration::from_secs(30),
            candle_timeframe: Interval::OneHour,
            kline_limit: 100,
        }
    }
}

/// Which poll loops to run for a symbol.
#[derive(Debug, Clone, Copy)]
pub struct PollKinds {
    /// Poll the 24-hour ticker summary.
    pub ticker: bool,
    /// Poll order book depth.
    pub order_book: bool,
    /// Poll candles.
    pub candles: bool,
}

impl PollKinds {
    /// Every poll kind enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            ticker: true,
            order_book: true,
            candles: true,
        }
    }
}

/// Spawns and tracks per-symbol polling loops.
pub struct PollingFetcher {
    config: PollingConfig,
    source: Arc<dyn SnapshotSource>,
    fallback: Arc<dyn SnapshotSource>,
    sync: Arc<MarketSyncService>,
    tasks: RwLock<HashMap<Symbol, CancellationToken>>,
}

impl PollingFetcher {
    /// Create a fetcher over a live source and a fallback provider.
    pub fn new(
        config: PollingConfig,
        source: Arc<dyn SnapshotSource>,
        fallback: Arc<dyn SnapshotSource>,
        sync: Arc<MarketSyncService>,
    ) -> Self {
        Self {
            config,
            source,
            fallback,
            sync,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Start the selected poll loops for a symbol. Restarting an already
    /// tracked symbol cancels its previous loops first.
    pub fn start(self: &Arc<Self>, symbol: &str, kinds: PollKinds) {
        self.stop(symbol);

        let cancel = CancellationToken::new();
        self.tasks
            .write()
            .insert(symbol.to_string(), cancel.clone());

        tracing::info!(symbol, ?kinds, "Starting poll loops");

        if kinds.ticker {
            tokio::spawn(Self::run_loop(
                Arc::clone(self),
                symbol.to_string(),
                self.config.ticker_interval,
                cancel.clone(),
                PollKind::Ticker,
            ));
        }
        if kinds.order_book {
            tokio::spawn(Self::run_loop(
                Arc::clone(self),
                symbol.to_string(),
                self.config.order_book_interval,
                cancel.clone(),
                PollKind::OrderBook,
            ));
        }
        if kinds.candles {
            tokio::spawn(Self::run_loop(
                Arc::clone(self),
                symbol.to_string(),
                self.config.candle_interval,
                cancel,
                PollKind::Candles,
            ));
        }
    }

    /// Cancel all poll loops for a symbol.
    pub fn stop(&self, symbol: &str) {
        if let Some(cancel) = self.tasks.write().remove(symbol) {
            tracing::info!(symbol, "Stopping poll loops");
            cancel.cancel();
        }
    }

    /// Cancel every tracked symbol's loops.
    pub fn stop_all(&self) {
        let mut tasks = self.tasks.write();
        for (symbol, cancel) in tasks.drain() {
            tracing::info!(symbol, "Stopping poll loops");
            cancel.cancel();
        }
    }

    /// Symbols currently being polled.
    #[must_use]
    pub fn tracked_symbols(&self) -> Vec<Symbol> {
        self.tasks.read().keys().cloned().collect()
    }

    async fn run_loop(
        self: Arc<Self>,
        symbol: Symbol,
        cadence: Duration,
        cancel: CancellationToken,
        kind: PollKind,
    ) {
        let mut timer = tokio::time::interval(cadence);
        // A slow fetch delays the next tick instead of bursting.
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                _ = timer.tick() => match kind {
                    PollKind::Ticker => self.poll_ticker_once(&symbol).await,
                    PollKind::OrderBook => self.poll_order_book_once(&symbol).await,
                    PollKind::Candles => self.poll_candles_once(&symbol).await,
                },
            }
        }
    }

    async fn poll_ticker_once(&self, symbol: &str) {
        match self.source.ticker(symbol).await {
            Ok(snapshot) => {
                self.sync
                    .apply(MarketEvent::TickerBatchReplaced(vec![snapshot]));
            }
            Err(err) => {
                tracing::warn!(symbol, error = %err, "Ticker poll failed, keeping last known value");
                if self.sync.store().ticker(symbol).is_none() {
                    self.seed_ticker(symbol).await;
                }
            }
        }
    }

    async fn poll_order_book_once(&self, symbol: &str) {
        match self.source.order_book(symbol).await {
            Ok(book) => self.sync.apply(MarketEvent::OrderBookReplaced(book)),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "Depth poll failed, keeping last known value");
                if self.sync.store().order_book(symbol).is_none() {
                    self.seed_order_book(symbol).await;
                }
            }
        }
    }

    async fn poll_candles_once(&self, symbol: &str) {
        let interval = self.config.candle_timeframe;
        match self
            .source
            .candles(symbol, interval, self.config.kline_limit)
            .await
        {
            Ok(points) => self.sync.apply(MarketEvent::CandlesMerged {
                symbol: symbol.to_string(),
                interval,
                points,
            }),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "Kline poll failed, keeping last known series");
                if self.sync.store().candles(symbol, interval).is_none() {
                    self.seed_candles(symbol, interval).await;
                }
            }
        }
    }

    async fn seed_ticker(&self, symbol: &str) {
        match self.fallback.ticker(symbol).await {
            Ok(snapshot) => {
                tracing::info!(symbol, "Seeding ticker from fallback provider");
                self.sync
                    .apply(MarketEvent::TickerBatchReplaced(vec![snapshot]));
            }
            Err(err) => tracing::debug!(symbol, error = %err, "No fallback ticker available"),
        }
    }

    async fn seed_order_book(&self, symbol: &str) {
        match self.fallback.order_book(symbol).await {
            Ok(book) => {
                tracing::info!(symbol, "Seeding order book from fallback provider");
                self.sync.apply(MarketEvent::OrderBookReplaced(book));
            }
            Err(err) => tracing::debug!(symbol, error = %err, "No fallback order book available"),
        }
    }

    async fn seed_candles(&self, symbol: &str, interval: Interval) {
        match self
            .fallback
            .candles(symbol, interval, self.config.kline_limit)
            .await
        {
            Ok(points) => {
                tracing::info!(symbol, interval = %interval, "Seeding candles from fallback provider");
                self.sync.apply(MarketEvent::CandlesMerged {
                    symbol: symbol.to_string(),
                    interval,
                    points,
                });
            }
            Err(err) => tracing::debug!(symbol, error = %err, "No fallback candles available"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PollKind {
    Ticker,
    OrderBook,
    Candles,
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::ports::{EventSink, FetchError};
    use crate::domain::market::{CandlePoint, OrderBookSnapshot, TickerSnapshot};
    use crate::domain::store::MarketStore;
    use crate::infrastructure::rest::StaticSnapshots;

    struct NullSink;

    impl EventSink for NullSink {
        fn notify(&self, _event: MarketEvent) {}
    }

    /// Source that always fails, standing in for an unreachable provider.
    struct DownSource;

    #[async_trait]
    impl SnapshotSource for DownSource {
        fn is_ready(&self) -> bool {
            false
        }

        async fn ticker(&self, _symbol: &str) -> Result<TickerSnapshot, FetchError> {
            Err(FetchError::Request("connection refused".to_string()))
        }

        async fn order_book(&self, _symbol: &str) -> Result<OrderBookSnapshot, FetchError> {
            Err(FetchError::Request("connection refused".to_string()))
        }

        async fn candles(
            &self,
            _symbol: &str,
            _interval: Interval,
            _limit: usize,
        ) -> Result<Vec<CandlePoint>, FetchError> {
            Err(FetchError::Request("connection refused".to_string()))
        }
    }

    fn fetcher_with_down_source(store: Arc<MarketStore>) -> Arc<PollingFetcher> {
        let sync = Arc::new(MarketSyncService::new(store, Arc::new(NullSink)));
        Arc::new(PollingFetcher::new(
            PollingConfig::default(),
            Arc::new(DownSource),
            Arc::new(StaticSnapshots::new()),
            sync,
        ))
    }

    fn ticker(symbol: &str, price: i64) -> TickerSnapshot {
        TickerSnapshot {
            symbol: symbol.to_string(),
            price: Decimal::from(price),
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            high_24h: Decimal::from(price),
            low_24h: Decimal::from(price),
            volume_24h: Decimal::from(1_000),
            last_update: Utc::now(),
        }
    }

    #[tokio::test]
    async fn failed_poll_keeps_last_known_value() {
        let store = Arc::new(MarketStore::default());
        store.apply_ticker_batch(vec![ticker("BTC/USD", 123_456)]);
        let fetcher = fetcher_with_down_source(Arc::clone(&store));

        fetcher.poll_ticker_once("BTC/USD").await;

        assert_eq!(
            store.ticker("BTC/USD").unwrap().price,
            Decimal::from(123_456)
        );
    }

    #[tokio::test]
    async fn cold_key_is_seeded_from_static_fallback() {
        let store = Arc::new(MarketStore::default());
        let fetcher = fetcher_with_down_source(Arc::clone(&store));

        fetcher.poll_ticker_once("BTC/USD").await;

        assert_eq!(
            store.ticker("BTC/USD").unwrap().price,
            Decimal::from(109_000)
        );
    }

    #[tokio::test]
    async fn unknown_cold_key_stays_empty() {
        let store = Arc::new(MarketStore::default());
        let fetcher = fetcher_with_down_source(Arc::clone(&store));

        fetcher.poll_ticker_once("DOGE/USD").await;

        assert!(store.ticker("DOGE/USD").is_none());
    }

    #[tokio::test]
    async fn stop_removes_tracked_symbol() {
        let store = Arc::new(MarketStore::default());
        let fetcher = fetcher_with_down_source(store);

        fetcher.start(
            "BTC/USD",
            PollKinds {
                ticker: true,
                order_book: false,
                candles: false,
            },
        );
        assert_eq!(fetcher.tracked_symbols(), vec!["BTC/USD".to_string()]);

        fetcher.stop("BTC/USD");
        assert!(fetcher.tracked_symbols().is_empty());
    }
}
