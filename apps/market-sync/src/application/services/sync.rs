//! Market Sync Service
//!
//! The single merge path shared by both transports. The stream decoder and
//! the polling fetcher hand their typed events here; the service merges
//! them into the store under the freshness rule and then notifies the
//! fan-out hub. Because everything converges on this path, stream and poll
//! updates can race freely without diverging.

use std::sync::Arc;

use crate::application::ports::EventSink;
use crate::domain::events::MarketEvent;
use crate::domain::store::MarketStore;

/// Routes domain events through the store merge and out to subscribers.
pub struct MarketSyncService {
    store: Arc<MarketStore>,
    sink: Arc<dyn EventSink>,
}

impl MarketSyncService {
    /// Create a sync service over a store and an event sink.
    pub fn new(store: Arc<MarketStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// The store this service merges into.
    #[must_use]
    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    /// Merge an event into the store, then notify subscribers.
    ///
    /// Data events that change nothing (every record stale) are not
    /// re-broadcast; connection lifecycle events always pass through.
    pub fn apply(&self, event: MarketEvent) {
        let changed = match &event {
            MarketEvent::ConnectionStateChanged { previous, current } => {
                tracing::debug!(
                    previous = previous.as_str(),
                    current = current.as_str(),
                    "Connection state changed"
                );
                true
            }
            MarketEvent::ReconnectExhausted { attempts } => {
                tracing::warn!(attempts, "Reconnect attempts exhausted");
                true
            }
            MarketEvent::TickerBatchReplaced(batch) => {
                self.store.apply_ticker_batch(batch.clone()) > 0
            }
            MarketEvent::ExchangeBatchReplaced(batch) => {
                self.store.apply_exchange_batch(batch.clone()) > 0
            }
            MarketEvent::OrderBookReplaced(book) => self.store.apply_order_book(book.clone()),
            MarketEvent::CandlesMerged {
                symbol,
                interval,
                points,
            } => {
                self.store
                    .apply_candle_points(symbol, *interval, points.clone())
                    > 0
            }
        };

        if changed {
            self.sink.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::events::ConnectionState;
    use crate::domain::market::TickerSnapshot;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<MarketEvent>>,
    }

    impl EventSink for RecordingSink {
        fn notify(&self, event: MarketEvent) {
            self.events.lock().push(event);
        }
    }

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

    #[test]
    fn applied_batch_is_merged_and_broadcast() {
        let store = Arc::new(MarketStore::default());
        let sink = Arc::new(RecordingSink::default());
        let service = MarketSyncService::new(Arc::clone(&store), sink.clone());

        service.apply(MarketEvent::TickerBatchReplaced(vec![ticker(
            "BTC/USD", 100, 0,
        )]));

        assert!(store.ticker("BTC/USD").is_some());
        assert_eq!(sink.events.lock().len(), 1);
    }

    #[test]
    fn stale_batch_is_not_rebroadcast() {
        let store = Arc::new(MarketStore::default());
        let sink = Arc::new(RecordingSink::default());
        let service = MarketSyncService::new(Arc::clone(&store), sink.clone());

        service.apply(MarketEvent::TickerBatchReplaced(vec![ticker(
            "BTC/USD", 110, 0,
        )]));
        service.apply(MarketEvent::TickerBatchReplaced(vec![ticker(
            "BTC/USD", 90, 120,
        )]));

        assert_eq!(store.ticker("BTC/USD").unwrap().price, Decimal::from(110));
        assert_eq!(sink.events.lock().len(), 1);
    }

    #[test]
    fn connection_events_always_pass_through() {
        let store = Arc::new(MarketStore::default());
        let sink = Arc::new(RecordingSink::default());
        let service = MarketSyncService::new(store, sink.clone());

        service.apply(MarketEvent::ConnectionStateChanged {
            previous: ConnectionState::Uninitialized,
            current: ConnectionState::Connecting,
        });

        assert_eq!(sink.events.lock().len(), 1);
    }
}
