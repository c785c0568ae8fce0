#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Market Sync - Real-Time Market Data Synchronizer
//!
//! Maintains a single WebSocket connection to an upstream market feed,
//! backstopped by REST polling, and fans decoded updates out to multiple
//! in-process subscribers through filtered channels. A timestamp-based
//! freshness rule arbitrates between the two racing transports so a slow
//! poll response never regresses a fresher streamed value.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core market data types and the snapshot store
//!   - `market`: Tickers, exchange quotes, order books, candles
//!   - `events`: Domain events and connection lifecycle states
//!   - `store`: The mergeable, freshness-arbitrated snapshot store
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Snapshot source and event sink interfaces
//!   - `services`: The shared store-merge-and-notify path
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `stream`: WebSocket lifecycle, frame codec, reconnect policy
//!   - `rest`: Snapshot client, static fallback, polling loops
//!   - `broadcast`: Filtered per-subscriber fan-out channels
//!   - `config`: Environment-driven configuration
//!   - `telemetry`: Tracing setup
//!
//! # Data Flow
//!
//! ```text
//! Upstream WS ──┐
//!               │    ┌──────────────┐    ┌─────────────┐
//!               ├───►│  Sync Service │───►│  Market Hub │──► Subscriber 1
//! REST Pollers ─┘    │  + Store      │    │  (filters)  │──► Subscriber N
//!                    └──────────────┘    └─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - core market data types with no external integrations.
pub mod domain;

/// Application layer - use cases and port definitions.
pub mod application;

/// Infrastructure layer - adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::events::{ConnectionState, EventKind, MarketEvent};
pub use domain::market::{
    CandlePoint, CandleSeries, ExchangeQuote, Interval, OrderBookSnapshot, PriceLevel, Symbol,
    TickerSnapshot,
};
pub use domain::store::MarketStore;

// Application services and ports
pub use application::ports::{EventSink, FetchError, SnapshotSource};
pub use application::services::MarketSyncService;

// Infrastructure config
pub use infrastructure::config::{ConfigError, PollingSettings, StreamSettings, SyncConfig};

// Fan-out hub (for integration tests)
pub use infrastructure::broadcast::{
    EventFilter, MarketHub, SharedMarketHub, Subscription, SubscriptionId,
};

// Stream transport (for integration tests)
pub use infrastructure::stream::{
    JsonCodec, ReconnectConfig, ReconnectPolicy, StreamConfig, StreamConnection,
};

// REST transport (for integration tests)
pub use infrastructure::rest::{
    PollKinds, PollingConfig, PollingFetcher, RestClient, RestConfig, StaticSnapshots,
};
