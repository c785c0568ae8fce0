//! Port Definitions
//!
//! Interfaces between the sync core and its adapters. Snapshot providers
//! are pluggable capabilities behind one trait, selected by configuration
//! rather than duplicated ad hoc; the fan-out hub is reached through the
//! `EventSink` port so application code never depends on a concrete
//! channel implementation.

use async_trait::async_trait;

use crate::domain::events::MarketEvent;
use crate::domain::market::{CandlePoint, Interval, OrderBookSnapshot, TickerSnapshot};

// =============================================================================
// Errors
// =============================================================================

/// Errors from snapshot endpoint fetches.
///
/// None of these are fatal: the polling fetcher logs, substitutes the last
/// known good value, and keeps its cadence.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (refused, reset, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// Endpoint returned a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// Response body was not parseable as the expected shape.
    #[error("malformed response body: {0}")]
    Body(String),

    /// A numeric-as-text field failed to parse; the whole record from the
    /// fetch is discarded, never partially applied.
    #[error("invalid numeric field `{field}`: {value}")]
    Validation {
        /// Field name that failed to parse.
        field: &'static str,
        /// Offending raw value.
        value: String,
    },
}

// =============================================================================
// Ports
// =============================================================================

/// Destination for store-change and connection-state notifications.
pub trait EventSink: Send + Sync {
    /// Deliver an event to all interested subscribers.
    fn notify(&self, event: MarketEvent);
}

/// A pull-based provider of market snapshots.
///
/// One conforming adapter per provider; implementations own any
/// provider-specific symbol or interval vocabulary.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Whether the provider is usable right now.
    fn is_ready(&self) -> bool;

    /// Fetch the 24-hour ticker summary for a symbol.
    async fn ticker(&self, symbol: &str) -> Result<TickerSnapshot, FetchError>;

    /// Fetch the order book depth for a symbol.
    async fn order_book(&self, symbol: &str) -> Result<OrderBookSnapshot, FetchError>;

    /// Fetch up to `limit` candles for a symbol and canonical interval,
    /// oldest first, open times in epoch milliseconds.
    async fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<CandlePoint>, FetchError>;
}
