//! Provider Snapshot Client
//!
//! Reqwest adapter for the provider's public snapshot endpoints: 24-hour
//! ticker, order book depth, and klines. The provider speaks numeric
//! fields as JSON strings and uses its own interval vocabulary; both
//! quirks are contained here and never leak past the `SnapshotSource`
//! boundary.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::application::ports::{FetchError, SnapshotSource};
use crate::domain::market::{
    CandlePoint, Interval, OrderBookSnapshot, PriceLevel, TickerSnapshot,
};
use crate::infrastructure::rest::intervals::provider_token;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open times below this are in seconds, not milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Configuration for the snapshot client.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the provider, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    /// Config for a base URL with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP snapshot client over the provider's REST API.
pub struct RestClient {
    config: RestConfig,
    http: reqwest::Client,
}

impl RestClient {
    /// Build a client for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError::Request` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: RestConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| FetchError::Request(err.to_string()))?;

        Ok(Self { config, http })
    }

    /// Provider symbols carry no separator ("BTCUSD", not "BTC/USD").
    fn provider_symbol(symbol: &str) -> String {
        symbol.replace('/', "")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| FetchError::Body(err.to_string()))
    }
}

#[async_trait]
impl SnapshotSource for RestClient {
    fn is_ready(&self) -> bool {
        true
    }

    async fn ticker(&self, symbol: &str) -> Result<TickerSnapshot, FetchError> {
        let url = format!(
            "{}/api/v3/ticker/24hr?symbol={}",
            self.config.base_url,
            Self::provider_symbol(symbol)
        );
        let body: Ticker24hResponse = self.get_json(url).await?;
        body.into_snapshot(symbol)
    }

    async fn order_book(&self, symbol: &str) -> Result<OrderBookSnapshot, FetchError> {
        let url = format!(
            "{}/api/v3/depth?symbol={}&limit=20",
            self.config.base_url,
            Self::provider_symbol(symbol)
        );
        let body: DepthResponse = self.get_json(url).await?;
        body.into_snapshot(symbol)
    }

    async fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<CandlePoint>, FetchError> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={limit}",
            self.config.base_url,
            Self::provider_symbol(symbol),
            provider_token(interval)
        );
        let rows: Vec<Vec<Value>> = self.get_json(url).await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in &rows {
            points.push(parse_kline_row(row)?);
        }
        Ok(points)
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

/// 24-hour ticker payload; every numeric field arrives as a string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24hResponse {
    last_price: String,
    price_change: String,
    price_change_percent: String,
    high_price: String,
    low_price: String,
    volume: String,
}

impl Ticker24hResponse {
    fn into_snapshot(self, symbol: &str) -> Result<TickerSnapshot, FetchError> {
        Ok(TickerSnapshot {
            symbol: symbol.to_string(),
            price: parse_decimal("lastPrice", &self.last_price)?,
            change: parse_decimal("priceChange", &self.price_change)?,
            change_percent: parse_decimal("priceChangePercent", &self.price_change_percent)?,
            high_24h: parse_decimal("highPrice", &self.high_price)?,
            low_24h: parse_decimal("lowPrice", &self.low_price)?,
            volume_24h: parse_decimal("volume", &self.volume)?,
            last_update: Utc::now(),
        })
    }
}

/// Depth payload: `[price, size]` string pairs per side.
#[derive(Debug, Deserialize)]
struct DepthResponse {
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

impl DepthResponse {
    fn into_snapshot(self, symbol: &str) -> Result<OrderBookSnapshot, FetchError> {
        let mut book = OrderBookSnapshot {
            symbol: symbol.to_string(),
            bids: parse_levels(&self.bids)?,
            asks: parse_levels(&self.asks)?,
            last_update: Utc::now(),
        };
        // Depth endpoints are not trusted to sort.
        book.normalize();
        Ok(book)
    }
}

fn parse_levels(raw: &[[String; 2]]) -> Result<Vec<PriceLevel>, FetchError> {
    raw.iter()
        .map(|[price, size]| {
            Ok(PriceLevel {
                price: parse_decimal("price", price)?,
                size: parse_decimal("size", size)?,
            })
        })
        .collect()
}

/// Kline rows are positional arrays:
/// `[openTime, open, high, low, close, volume, ...]`.
fn parse_kline_row(row: &[Value]) -> Result<CandlePoint, FetchError> {
    if row.len() < 6 {
        return Err(FetchError::Body(format!(
            "kline row has {} fields, expected at least 6",
            row.len()
        )));
    }

    let open_time = row[0].as_i64().ok_or_else(|| FetchError::Validation {
        field: "openTime",
        value: row[0].to_string(),
    })?;

    Ok(CandlePoint {
        open_time: normalize_open_time(open_time),
        open: parse_decimal_value("open", &row[1])?,
        high: parse_decimal_value("high", &row[2])?,
        low: parse_decimal_value("low", &row[3])?,
        close: parse_decimal_value("close", &row[4])?,
        volume: parse_decimal_value("volume", &row[5])?,
    })
}

/// Sources disagree on seconds vs milliseconds; the store expects
/// milliseconds.
const fn normalize_open_time(open_time: i64) -> i64 {
    if open_time > 0 && open_time < MILLIS_THRESHOLD {
        open_time * 1_000
    } else {
        open_time
    }
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, FetchError> {
    Decimal::from_str(value).map_err(|_| FetchError::Validation {
        field,
        value: value.to_string(),
    })
}

/// Kline cells may be strings or bare numbers depending on the endpoint.
fn parse_decimal_value(field: &'static str, value: &Value) -> Result<Decimal, FetchError> {
    match value {
        Value::String(s) => parse_decimal(field, s),
        Value::Number(n) => Decimal::from_str(&n.to_string()).map_err(|_| FetchError::Validation {
            field,
            value: n.to_string(),
        }),
        other => Err(FetchError::Validation {
            field,
            value: other.to_string(),
        }),
    }
}
