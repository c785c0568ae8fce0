//! Market Data Store
//!
//! The authoritative, mergeable snapshot of market state. The stream
//! decoder and the polling fetcher both funnel their updates through the
//! apply operations here, so one freshness rule arbitrates between the two
//! racing transports: an incoming record replaces the stored record for
//! its key only if its timestamp is not older than the stored one. A slow
//! poll response can therefore never regress a fresher streamed value.
//!
//! Records are replaced wholesale per key; no partial-field merges.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::market::{
    CandlePoint, CandleSeries, ExchangeQuote, Interval, OrderBookSnapshot, Symbol, TickerSnapshot,
};

/// Default sliding window bound for candle series.
pub const DEFAULT_CANDLE_WINDOW: usize = 500;

/// Authoritative market snapshot store.
///
/// Interior mutability is per-map; every apply operation takes the write
/// lock for its map once, so each key is replaced atomically even when
/// timers and the stream task interleave on the runtime.
#[derive(Debug)]
pub struct MarketStore {
    tickers: RwLock<HashMap<Symbol, TickerSnapshot>>,
    exchange_quotes: RwLock<HashMap<(Symbol, String), ExchangeQuote>>,
    order_books: RwLock<HashMap<Symbol, OrderBookSnapshot>>,
    candles: RwLock<HashMap<(Symbol, Interval), CandleSeries>>,
    candle_window: usize,
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new(DEFAULT_CANDLE_WINDOW)
    }
}

impl MarketStore {
    /// Create a store with the given candle window bound.
    #[must_use]
    pub fn new(candle_window: usize) -> Self {
        Self {
            tickers: RwLock::new(HashMap::new()),
            exchange_quotes: RwLock::new(HashMap::new()),
            order_books: RwLock::new(HashMap::new()),
            candles: RwLock::new(HashMap::new()),
            candle_window: candle_window.max(1),
        }
    }

    // =========================================================================
    // Apply operations
    // =========================================================================

    /// Apply a full-replacement ticker batch.
    ///
    /// Symbols absent from the batch keep their stored value. Returns the
    /// number of records that actually replaced stored state.
    pub fn apply_ticker_batch(&self, batch: Vec<TickerSnapshot>) -> usize {
        let mut tickers = self.tickers.write();
        let mut applied = 0;

        for incoming in batch {
            let fresh = tickers
                .get(&incoming.symbol)
                .is_none_or(|stored| incoming.last_update >= stored.last_update);

            if fresh {
                tickers.insert(incoming.symbol.clone(), incoming);
                applied += 1;
            } else {
                tracing::debug!(symbol = %incoming.symbol, "Dropping stale ticker update");
            }
        }

        applied
    }

    /// Apply a flattened exchange quote batch, keyed by (symbol, exchange).
    pub fn apply_exchange_batch(&self, batch: Vec<ExchangeQuote>) -> usize {
        let mut quotes = self.exchange_quotes.write();
        let mut applied = 0;

        for incoming in batch {
            let key = (incoming.symbol.clone(), incoming.exchange.clone());
            let fresh = quotes
                .get(&key)
                .is_none_or(|stored| incoming.last_update >= stored.last_update);

            if fresh {
                quotes.insert(key, incoming);
                applied += 1;
            }
        }

        applied
    }

    /// Replace a symbol's order book wholesale, subject to the freshness
    /// rule. The book is normalized (bids descending, asks ascending)
    /// before storage.
    pub fn apply_order_book(&self, mut book: OrderBookSnapshot) -> bool {
        book.normalize();

        let mut books = self.order_books.write();
        let fresh = books
            .get(&book.symbol)
            .is_none_or(|stored| book.last_update >= stored.last_update);

        if fresh {
            books.insert(book.symbol.clone(), book);
        }
        fresh
    }

    /// Merge one candle point into a (symbol, interval) series.
    ///
    /// Same-timestamp points replace the series' last point in place;
    /// newer points append and the window is trimmed from the front.
    pub fn apply_candle_point(&self, symbol: &str, interval: Interval, point: CandlePoint) -> bool {
        let mut candles = self.candles.write();
        let series = candles
            .entry((symbol.to_string(), interval))
            .or_insert_with(|| CandleSeries::new(symbol.to_string(), interval));

        series.merge_point(point, self.candle_window)
    }

    /// Merge a batch of candle points, oldest first.
    pub fn apply_candle_points(
        &self,
        symbol: &str,
        interval: Interval,
        points: Vec<CandlePoint>,
    ) -> usize {
        let mut candles = self.candles.write();
        let series = candles
            .entry((symbol.to_string(), interval))
            .or_insert_with(|| CandleSeries::new(symbol.to_string(), interval));

        points
            .into_iter()
            .filter(|point| series.merge_point(*point, self.candle_window))
            .count()
    }

    // =========================================================================
    // Read accessors (clones; the store stays sole owner)
    // =========================================================================

    /// Latest ticker for a symbol.
    #[must_use]
    pub fn ticker(&self, symbol: &str) -> Option<TickerSnapshot> {
        self.tickers.read().get(symbol).cloned()
    }

    /// All known tickers, in no particular order.
    #[must_use]
    pub fn tickers(&self) -> Vec<TickerSnapshot> {
        self.tickers.read().values().cloned().collect()
    }

    /// All exchange quotes for a symbol, in no particular order.
    #[must_use]
    pub fn exchange_quotes(&self, symbol: &str) -> Vec<ExchangeQuote> {
        self.exchange_quotes
            .read()
            .iter()
            .filter(|((sym, _), _)| sym == symbol)
            .map(|(_, quote)| quote.clone())
            .collect()
    }

    /// Latest order book for a symbol.
    #[must_use]
    pub fn order_book(&self, symbol: &str) -> Option<OrderBookSnapshot> {
        self.order_books.read().get(symbol).cloned()
    }

    /// Candle series for a (symbol, interval) pair.
    #[must_use]
    pub fn candles(&self, symbol: &str, interval: Interval) -> Option<CandleSeries> {
        self.candles
            .read()
            .get(&(symbol.to_string(), interval))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn ticker(symbol: &str, price: i64, age_secs: i64) -> TickerSnapshot {
        TickerSnapshot {
            symbol: symbol.to_string(),
            price: Decimal::from(price),
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            high_24h: Decimal::from(price),
            low_24h: Decimal::from(price),
            volume_24h: Decimal::from(1_000),
            last_update: Utc::now() - Duration::seconds(age_secs),
        }
    }

    fn quote(symbol: &str, exchange: &str, price: i64) -> ExchangeQuote {
        ExchangeQuote {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            price: Decimal::from(price),
            volume: Decimal::from(10),
            status: "trending".to_string(),
            last_update: Utc::now(),
        }
    }

    fn point(open_time: i64) -> CandlePoint {
        CandlePoint {
            open_time,
            open: Decimal::ONE,
            high: Decimal::ONE,
            low: Decimal::ONE,
            close: Decimal::ONE,
            volume: Decimal::ONE,
        }
    }

    #[test]
    fn ticker_batch_replaces_whole_records() {
        let store = MarketStore::default();

        assert_eq!(store.apply_ticker_batch(vec![ticker("BTC/USD", 100, 10)]), 1);
        assert_eq!(store.apply_ticker_batch(vec![ticker("BTC/USD", 110, 5)]), 1);

        assert_eq!(store.ticker("BTC/USD").unwrap().price, Decimal::from(110));
    }

    #[test]
    fn stale_update_never_regresses_fresher_value() {
        let store = MarketStore::default();

        // Fresh streamed value first, then a slow poll response with an
        // older timestamp.
        assert_eq!(store.apply_ticker_batch(vec![ticker("BTC/USD", 110, 0)]), 1);
        assert_eq!(store.apply_ticker_batch(vec![ticker("BTC/USD", 90, 60)]), 0);

        assert_eq!(store.ticker("BTC/USD").unwrap().price, Decimal::from(110));
    }

    #[test]
    fn batch_does_not_clear_missing_symbols() {
        let store = MarketStore::default();

        store.apply_ticker_batch(vec![ticker("BTC/USD", 100, 10), ticker("ETH/USD", 50, 10)]);
        store.apply_ticker_batch(vec![ticker("BTC/USD", 105, 5)]);

        assert!(store.ticker("ETH/USD").is_some());
        assert_eq!(store.tickers().len(), 2);
    }

    #[test]
    fn exchange_quotes_keyed_by_symbol_and_exchange() {
        let store = MarketStore::default();

        store.apply_exchange_batch(vec![
            quote("BTC/USD", "uniswap", 100),
            quote("BTC/USD", "sushiswap", 101),
            quote("ETH/USD", "uniswap", 50),
        ]);

        assert_eq!(store.exchange_quotes("BTC/USD").len(), 2);
        assert_eq!(store.exchange_quotes("ETH/USD").len(), 1);
    }

    #[test]
    fn order_book_is_normalized_on_apply() {
        let store = MarketStore::default();
        let book = OrderBookSnapshot {
            symbol: "BTC/USD".to_string(),
            bids: vec![
                crate::domain::market::PriceLevel {
                    price: Decimal::from(99),
                    size: Decimal::ONE,
                },
                crate::domain::market::PriceLevel {
                    price: Decimal::from(100),
                    size: Decimal::ONE,
                },
            ],
            asks: vec![],
            last_update: Utc::now(),
        };

        assert!(store.apply_order_book(book));
        let stored = store.order_book("BTC/USD").unwrap();
        assert_eq!(stored.best_bid().unwrap().price, Decimal::from(100));
    }

    #[test]
    fn candle_window_trims_from_front() {
        let store = MarketStore::new(3);

        let applied =
            store.apply_candle_points("BTC/USD", Interval::OneHour, (0..5).map(|i| point(i * 1_000)).collect());
        assert_eq!(applied, 5);

        let series = store.candles("BTC/USD", Interval::OneHour).unwrap();
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[0].open_time, 2_000);
    }
}
