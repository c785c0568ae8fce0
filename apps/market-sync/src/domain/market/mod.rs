//! Market Data Types
//!
//! Snapshot types held by the store: per-symbol tickers, per-exchange
//! quotes, order books, and candle series. Records are immutable values;
//! the store replaces them wholesale, never field by field.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A symbol string (e.g. "BTC/USD").
pub type Symbol = String;

// =============================================================================
// Intervals
// =============================================================================

/// Canonical candle interval vocabulary exposed to consumers.
///
/// Translation to provider-specific tokens (e.g. `60m` for one hour) is
/// owned exclusively by the polling fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// One minute.
    #[serde(rename = "1m")]
    OneMinute,
    /// Five minutes.
    #[serde(rename = "5m")]
    FiveMinutes,
    /// Fifteen minutes.
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// Thirty minutes.
    #[serde(rename = "30m")]
    ThirtyMinutes,
    /// One hour.
    #[serde(rename = "1h")]
    OneHour,
    /// Four hours.
    #[serde(rename = "4h")]
    FourHours,
    /// One day.
    #[serde(rename = "1d")]
    OneDay,
    /// One week.
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    /// All canonical intervals.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::OneMinute,
            Self::FiveMinutes,
            Self::FifteenMinutes,
            Self::ThirtyMinutes,
            Self::OneHour,
            Self::FourHours,
            Self::OneDay,
            Self::OneWeek,
        ]
    }

    /// Canonical token for this interval.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
        }
    }

    /// Interval length in milliseconds.
    #[must_use]
    pub const fn duration_millis(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            Self::OneMinute => MINUTE,
            Self::FiveMinutes => 5 * MINUTE,
            Self::FifteenMinutes => 15 * MINUTE,
            Self::ThirtyMinutes => 30 * MINUTE,
            Self::OneHour => 60 * MINUTE,
            Self::FourHours => 240 * MINUTE,
            Self::OneDay => 1_440 * MINUTE,
            Self::OneWeek => 10_080 * MINUTE,
        }
    }

    /// Parse a canonical token.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::OneMinute),
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "30m" => Some(Self::ThirtyMinutes),
            "1h" => Some(Self::OneHour),
            "4h" => Some(Self::FourHours),
            "1d" => Some(Self::OneDay),
            "1w" => Some(Self::OneWeek),
            _ => None,
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tickers
// =============================================================================

/// A single symbol's latest price/volume/change summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Trading pair symbol.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: Decimal,
    /// Absolute 24-hour price change.
    pub change: Decimal,
    /// Relative 24-hour price change, in percent.
    pub change_percent: Decimal,
    /// 24-hour high.
    pub high_24h: Decimal,
    /// 24-hour low.
    pub low_24h: Decimal,
    /// 24-hour traded volume.
    pub volume_24h: Decimal,
    /// Timestamp of the update this record was built from.
    pub last_update: DateTime<Utc>,
}

/// One exchange's quote for a symbol, as flattened out of the nested
/// `exchange_update` feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeQuote {
    /// Exchange name (e.g. "uniswap").
    pub exchange: String,
    /// Trading pair symbol.
    pub symbol: Symbol,
    /// Quoted price on this exchange.
    pub price: Decimal,
    /// Quoted volume on this exchange.
    #[serde(default)]
    pub volume: Decimal,
    /// Free-form exchange status tag ("limited", "trending", ...).
    #[serde(default)]
    pub status: String,
    /// Timestamp of the quote.
    pub last_update: DateTime<Utc>,
}

// =============================================================================
// Order Books
// =============================================================================

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price.
    pub price: Decimal,
    /// Outstanding size at this price.
    pub size: Decimal,
}

/// The set of outstanding buy and sell price levels for a symbol.
///
/// Replaced wholesale on each update; bids are sorted descending by price,
/// asks ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// Trading pair symbol.
    pub symbol: Symbol,
    /// Buy levels, best (highest) first.
    pub bids: Vec<PriceLevel>,
    /// Sell levels, best (lowest) first.
    pub asks: Vec<PriceLevel>,
    /// Timestamp of the update this record was built from.
    pub last_update: DateTime<Utc>,
}

impl OrderBookSnapshot {
    /// Re-sort both sides into canonical order (bids descending, asks
    /// ascending). Snapshot endpoints are not trusted to sort correctly.
    pub fn normalize(&mut self) {
        self.bids.sort_by(|a, b| b.price.cmp(&a.price));
        self.asks.sort_by(|a, b| a.price.cmp(&b.price));
    }

    /// Best bid, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Best ask, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }
}

// =============================================================================
// Candles
// =============================================================================

/// One open-high-low-close-volume aggregate over a fixed interval.
///
/// `open_time` is always epoch milliseconds; sources that report seconds
/// are normalized before a point reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandlePoint {
    /// Interval open time, epoch milliseconds.
    pub open_time: i64,
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Traded volume over the interval.
    pub volume: Decimal,
}

/// An append-only candle series with a sliding window bound.
///
/// The most recent point may be replaced in place (same `open_time`) to
/// reflect an in-progress interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleSeries {
    /// Trading pair symbol.
    pub symbol: Symbol,
    /// Candle interval.
    pub interval: Interval,
    /// Ordered points, oldest first.
    pub points: Vec<CandlePoint>,
}

impl CandleSeries {
    /// Create an empty series.
    #[must_use]
    pub const fn new(symbol: Symbol, interval: Interval) -> Self {
        Self {
            symbol,
            interval,
            points: Vec::new(),
        }
    }

    /// Merge one point into the series.
    ///
    /// A point with the same `open_time` as the last point replaces it in
    /// place; a strictly newer point is appended and the window trimmed to
    /// `max_points` from the front. Points older than the last are ignored.
    ///
    /// Returns `true` if the series changed.
    pub fn merge_point(&mut self, point: CandlePoint, max_points: usize) -> bool {
        match self.points.last() {
            Some(last) if point.open_time == last.open_time => {
                // In-progress interval update.
                let idx = self.points.len() - 1;
                self.points[idx] = point;
                true
            }
            Some(last) if point.open_time < last.open_time => false,
            _ => {
                self.points.push(point);
                if self.points.len() > max_points {
                    let excess = self.points.len() - max_points;
                    self.points.drain(..excess);
                }
                true
            }
        }
    }

    /// Last (most recent) point, if any.
    #[must_use]
    pub fn last_point(&self) -> Option<&CandlePoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(open_time: i64, close: i64) -> CandlePoint {
        CandlePoint {
            open_time,
            open: Decimal::from(close),
            high: Decimal::from(close),
            low: Decimal::from(close),
            close: Decimal::from(close),
            volume: Decimal::ONE,
        }
    }

    #[test]
    fn interval_round_trips_canonical_tokens() {
        for interval in Interval::all() {
            assert_eq!(Interval::parse(interval.as_str()), Some(*interval));
        }
        assert_eq!(Interval::parse("60m"), None);
    }

    #[test]
    fn order_book_normalize_sorts_both_sides() {
        let mut book = OrderBookSnapshot {
            symbol: "BTC/USD".to_string(),
            bids: vec![
                PriceLevel {
                    price: Decimal::from(100),
                    size: Decimal::ONE,
                },
                PriceLevel {
                    price: Decimal::from(101),
                    size: Decimal::TWO,
                },
            ],
            asks: vec![
                PriceLevel {
                    price: Decimal::from(103),
                    size: Decimal::ONE,
                },
                PriceLevel {
                    price: Decimal::from(102),
                    size: Decimal::TWO,
                },
            ],
            last_update: Utc::now(),
        };

        book.normalize();

        assert_eq!(book.best_bid().unwrap().price, Decimal::from(101));
        assert_eq!(book.best_ask().unwrap().price, Decimal::from(102));
    }

    #[test]
    fn candle_same_timestamp_replaces_in_place() {
        let mut series = CandleSeries::new("BTC/USD".to_string(), Interval::OneHour);
        assert!(series.merge_point(point(1_000, 10), 100));
        assert!(series.merge_point(point(2_000, 20), 100));

        assert!(series.merge_point(point(2_000, 25), 100));

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.last_point().unwrap().close, Decimal::from(25));
    }

    #[test]
    fn candle_newer_appends_and_evicts_oldest() {
        let mut series = CandleSeries::new("BTC/USD".to_string(), Interval::OneHour);
        for i in 0..3 {
            assert!(series.merge_point(point(i * 1_000, 1), 3));
        }
        assert_eq!(series.points.len(), 3);

        assert!(series.merge_point(point(3_000, 2), 3));

        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[0].open_time, 1_000);
        assert_eq!(series.last_point().unwrap().open_time, 3_000);
    }

    #[test]
    fn candle_older_point_is_ignored() {
        let mut series = CandleSeries::new("BTC/USD".to_string(), Interval::OneHour);
        assert!(series.merge_point(point(2_000, 1), 100));

        assert!(!series.merge_point(point(1_000, 1), 100));
        assert_eq!(series.points.len(), 1);
    }
}
