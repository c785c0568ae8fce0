//! Domain Events
//!
//! Typed events produced by the protocol decoder and the polling fetcher,
//! and consumed by the sync service and fan-out subscribers. Both transports
//! emit the same event types so the store reconciles them with one rule.

use crate::domain::market::{
    CandlePoint, ExchangeQuote, Interval, OrderBookSnapshot, Symbol, TickerSnapshot,
};

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of the managed stream connection.
///
/// Exactly one value exists per connection; transitions are the only way
/// consumers learn whether the transport is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection has been attempted yet.
    #[default]
    Uninitialized,
    /// Connection attempt in progress.
    Connecting,
    /// Connected; frames flow and `send` is permitted.
    Open,
    /// Explicit disconnect in progress.
    Closing,
    /// Not connected (failure, remote close, or completed disconnect).
    Closed,
}

impl ConnectionState {
    /// Human-readable state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Events delivered through the subscriber fan-out.
#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// The stream connection changed state.
    ConnectionStateChanged {
        /// State before the transition.
        previous: ConnectionState,
        /// State after the transition.
        current: ConnectionState,
    },
    /// The reconnect policy ran out of attempts; the connection stays
    /// Closed until `connect` is called explicitly.
    ReconnectExhausted {
        /// Attempts used before giving up.
        attempts: u32,
    },
    /// A full-replacement batch of ticker snapshots. Symbols missing from
    /// the batch keep their stored value.
    TickerBatchReplaced(Vec<TickerSnapshot>),
    /// A flattened batch of per-exchange quotes.
    ExchangeBatchReplaced(Vec<ExchangeQuote>),
    /// A wholesale order book replacement for one symbol.
    OrderBookReplaced(OrderBookSnapshot),
    /// Candle points for one (symbol, interval) series, oldest first.
    CandlesMerged {
        /// Trading pair symbol.
        symbol: Symbol,
        /// Candle interval.
        interval: Interval,
        /// Points to merge, oldest first.
        points: Vec<CandlePoint>,
    },
}

impl MarketEvent {
    /// The kind of this event, for filter matching.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ConnectionStateChanged { .. } => EventKind::ConnectionState,
            Self::ReconnectExhausted { .. } => EventKind::ReconnectExhausted,
            Self::TickerBatchReplaced(_) => EventKind::Tickers,
            Self::ExchangeBatchReplaced(_) => EventKind::Exchanges,
            Self::OrderBookReplaced(_) => EventKind::OrderBook,
            Self::CandlesMerged { .. } => EventKind::Candles,
        }
    }

    /// Symbols carried by this event. Empty for connection events.
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        match self {
            Self::ConnectionStateChanged { .. } | Self::ReconnectExhausted { .. } => vec![],
            Self::TickerBatchReplaced(tickers) => {
                tickers.iter().map(|t| t.symbol.as_str()).collect()
            }
            Self::ExchangeBatchReplaced(quotes) => {
                quotes.iter().map(|q| q.symbol.as_str()).collect()
            }
            Self::OrderBookReplaced(book) => vec![book.symbol.as_str()],
            Self::CandlesMerged { symbol, .. } => vec![symbol.as_str()],
        }
    }
}

/// Event kinds, used by subscriber filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection state transitions.
    ConnectionState,
    /// Reconnect policy exhaustion.
    ReconnectExhausted,
    /// Ticker batch replacements.
    Tickers,
    /// Exchange quote batch replacements.
    Exchanges,
    /// Order book replacements.
    OrderBook,
    /// Candle series updates.
    Candles,
}

impl EventKind {
    /// All event kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ConnectionState,
            Self::ReconnectExhausted,
            Self::Tickers,
            Self::Exchanges,
            Self::OrderBook,
            Self::Candles,
        ]
    }
}
