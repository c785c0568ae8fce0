//! Sync Service Configuration Settings
//!
//! Configuration types for the market sync service, loaded from
//! environment variables. Every knob has a working default so the binary
//! runs with an empty environment.

use std::time::Duration;

use crate::domain::market::Interval;
use crate::infrastructure::stream::ReconnectConfig;

/// Default upstream stream endpoint.
const DEFAULT_STREAM_URL: &str = "ws://localhost:8000/api/ws";

/// Default REST snapshot provider.
const DEFAULT_REST_BASE_URL: &str = "https://api.binance.com";

/// Default tracked symbols.
const DEFAULT_SYMBOLS: &str = "BTC/USD,ETH/USD,SOL/USD,ADA/USD";

/// Candle window bounds.
const MIN_CANDLE_WINDOW: usize = 100;
const MAX_CANDLE_WINDOW: usize = 1_000;

/// Stream connection settings.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Upstream WebSocket URL.
    pub url: String,
    /// Reconnect policy.
    pub reconnect: ReconnectConfig,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// REST polling settings.
#[derive(Debug, Clone)]
pub struct PollingSettings {
    /// Snapshot provider base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Ticker poll cadence.
    pub ticker_interval: Duration,
    /// Order book poll cadence.
    pub order_book_interval: Duration,
    /// Candle poll cadence.
    pub candle_interval: Duration,
    /// Canonical candle interval polled on startup.
    pub candle_timeframe: Interval,
    /// Candles requested per poll.
    pub kline_limit: usize,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REST_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            ticker_interval: Duration::from_secs(2),
            order_book_interval: Duration::from_secs(2),
            candle_interval: Duration::from_secs(30),
            candle_timeframe: Interval::OneHour,
            kline_limit: 100,
        }
    }
}

/// Complete sync service configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Symbols tracked by the pollers.
    pub symbols: Vec<String>,
    /// Stream connection settings.
    pub stream: StreamSettings,
    /// REST polling settings.
    pub polling: PollingSettings,
    /// Per-subscriber fan-out channel capacity.
    pub channel_capacity: usize,
    /// Sliding window bound for stored candle series.
    pub candle_window: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            symbols: split_symbols(DEFAULT_SYMBOLS),
            stream: StreamSettings::default(),
            polling: PollingSettings::default(),
            channel_capacity: crate::infrastructure::broadcast::DEFAULT_CHANNEL_CAPACITY,
            candle_window: crate::domain::store::DEFAULT_CANDLE_WINDOW,
        }
    }
}

impl SyncConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but unusable, e.g. an
    /// empty symbol list or an unknown candle interval token.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let symbols = match std::env::var("MARKET_SYNC_SYMBOLS") {
            Ok(raw) => {
                let symbols = split_symbols(&raw);
                if symbols.is_empty() {
                    return Err(ConfigError::EmptyValue("MARKET_SYNC_SYMBOLS".to_string()));
                }
                symbols
            }
            Err(_) => defaults.symbols,
        };

        let candle_timeframe = match std::env::var("MARKET_SYNC_CANDLE_INTERVAL") {
            Ok(token) => Interval::parse(&token).ok_or(ConfigError::InvalidInterval(token))?,
            Err(_) => defaults.polling.candle_timeframe,
        };

        let stream = StreamSettings {
            url: std::env::var("MARKET_SYNC_STREAM_URL")
                .unwrap_or_else(|_| DEFAULT_STREAM_URL.to_string()),
            reconnect: ReconnectConfig {
                enabled: parse_env_bool(
                    "MARKET_SYNC_RECONNECT_ENABLED",
                    ReconnectConfig::default().enabled,
                ),
                interval: parse_env_duration_secs(
                    "MARKET_SYNC_RECONNECT_INTERVAL_SECS",
                    ReconnectConfig::default().interval,
                ),
                max_attempts: parse_env_u32(
                    "MARKET_SYNC_MAX_RECONNECT_ATTEMPTS",
                    ReconnectConfig::default().max_attempts,
                ),
            },
        };

        let polling = PollingSettings {
            base_url: std::env::var("MARKET_SYNC_REST_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_REST_BASE_URL.to_string()),
            request_timeout: parse_env_duration_secs(
                "MARKET_SYNC_REQUEST_TIMEOUT_SECS",
                defaults.polling.request_timeout,
            ),
            ticker_interval: parse_env_duration_secs(
                "MARKET_SYNC_TICKER_INTERVAL_SECS",
                defaults.polling.ticker_interval,
            ),
            order_book_interval: parse_env_duration_secs(
                "MARKET_SYNC_ORDER_BOOK_INTERVAL_SECS",
                defaults.polling.order_book_interval,
            ),
            candle_interval: parse_env_duration_secs(
                "MARKET_SYNC_CANDLE_POLL_SECS",
                defaults.polling.candle_interval,
            ),
            candle_timeframe,
            kline_limit: parse_env_usize("MARKET_SYNC_KLINE_LIMIT", defaults.polling.kline_limit),
        };

        Ok(Self {
            symbols,
            stream,
            polling,
            channel_capacity: parse_env_usize(
                "MARKET_SYNC_CHANNEL_CAPACITY",
                defaults.channel_capacity,
            ),
            candle_window: parse_env_usize("MARKET_SYNC_CANDLE_WINDOW", defaults.candle_window)
                .clamp(MIN_CANDLE_WINDOW, MAX_CANDLE_WINDOW),
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has an empty or all-blank value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Candle interval token is not part of the canonical vocabulary.
    #[error("unknown candle interval: {0}")]
    InvalidInterval(String),
}

fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |v| v.to_lowercase() != "false")
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
