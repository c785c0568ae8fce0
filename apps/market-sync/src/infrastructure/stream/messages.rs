//! Stream Wire Messages
//!
//! Serde types for the JSON frame grammar of the multiplexed market feed.
//! Two inbound message kinds exist: `crypto_update` (symbol -> ticker
//! fields) and `exchange_update` (symbol -> exchange -> quote). Wire types
//! convert into the domain snapshot types; timestamps tolerate ISO-8601
//! strings with or without an offset, defaulting to receive time when
//! absent.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::market::{ExchangeQuote, TickerSnapshot};

// =============================================================================
// Outbound
// =============================================================================

/// The single outbound frame, sent once upon open. The feed is one
/// multiplexed stream, so there is no per-symbol payload.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    /// Message discriminator, always `"subscribe"`.
    #[serde(rename = "type")]
    pub msg_type: &'static str,
}

impl SubscribeRequest {
    /// Create the subscribe frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            msg_type: "subscribe",
        }
    }
}

impl Default for SubscribeRequest {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Inbound
// =============================================================================

/// Ticker fields as they appear in a `crypto_update` mapping value.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerFields {
    /// Symbol, when the payload repeats it inside the value.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Last traded price.
    pub price: Decimal,
    /// Absolute 24-hour change.
    #[serde(default)]
    pub change: Decimal,
    /// Relative 24-hour change in percent.
    #[serde(default, alias = "price_24h_change")]
    pub change_percent: Decimal,
    /// 24-hour high.
    #[serde(default)]
    pub high_24h: Decimal,
    /// 24-hour low.
    #[serde(default)]
    pub low_24h: Decimal,
    /// 24-hour volume.
    #[serde(default, alias = "volume")]
    pub volume_24h: Decimal,
    /// Update timestamp; absent or unparseable stamps fall back to
    /// receive time.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TickerFields {
    /// Convert into a domain snapshot, taking the symbol from the mapping
    /// key when the value does not carry one.
    #[must_use]
    pub fn into_snapshot(self, key: &str) -> TickerSnapshot {
        TickerSnapshot {
            symbol: self.symbol.unwrap_or_else(|| key.to_string()),
            price: self.price,
            change: self.change,
            change_percent: self.change_percent,
            high_24h: self.high_24h,
            low_24h: self.low_24h,
            volume_24h: self.volume_24h,
            last_update: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

/// Exchange quote fields as they appear in an `exchange_update` leaf.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeQuoteFields {
    /// Exchange name, when repeated inside the value.
    #[serde(default)]
    pub exchange: Option<String>,
    /// Symbol, when repeated inside the value.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Quoted price.
    pub price: Decimal,
    /// Quoted volume.
    #[serde(default)]
    pub volume: Decimal,
    /// Exchange status tag.
    #[serde(default)]
    pub status: String,
    /// Update timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExchangeQuoteFields {
    /// Convert into a domain quote, filling symbol and exchange from the
    /// mapping keys when the value omits them.
    #[must_use]
    pub fn into_quote(self, symbol_key: &str, exchange_key: &str) -> ExchangeQuote {
        ExchangeQuote {
            exchange: self.exchange.unwrap_or_else(|| exchange_key.to_string()),
            symbol: self.symbol.unwrap_or_else(|| symbol_key.to_string()),
            price: self.price,
            volume: self.volume,
            status: self.status,
            last_update: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

// =============================================================================
// Timestamp handling
// =============================================================================

/// Parse an ISO-8601 timestamp, tolerating a missing UTC offset (the feed
/// emits naive `isoformat()` stamps).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
