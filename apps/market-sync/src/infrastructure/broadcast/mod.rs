//! Subscriber Fan-out
//!
//! Distributes store-change and connection-state events to registered
//! subscribers over per-subscriber channels. Each subscriber declares an
//! `EventFilter`; `notify` delivers one cloned event to every matching
//! live subscriber. A slow or dropped subscriber is isolated: its channel
//! filling up or closing never affects delivery to the others.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::application::ports::EventSink;
use crate::domain::events::{EventKind, MarketEvent};
use crate::domain::market::Symbol;

/// Default per-subscriber channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

// =============================================================================
// Filters
// =============================================================================

/// Subscriber interest declaration.
///
/// `None` for a dimension means "everything". A symbol filter only applies
/// to events that carry symbols; connection lifecycle events are matched
/// by kind alone.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    kinds: Option<HashSet<EventKind>>,
    symbols: Option<HashSet<Symbol>>,
}

impl EventFilter {
    /// Match every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given event kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Restrict to events carrying any of the given symbols.
    #[must_use]
    pub fn with_symbols(mut self, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        self.symbols = Some(symbols.into_iter().collect());
        self
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &MarketEvent) -> bool {
        if let Some(kinds) = &self.kinds
            && !kinds.contains(&event.kind())
        {
            return false;
        }

        if let Some(symbols) = &self.symbols {
            let carried = event.symbols();
            if !carried.is_empty() && !carried.iter().any(|s| symbols.contains(*s)) {
                return false;
            }
        }

        true
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Opaque handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A live subscription: the handle plus the receiving end of the event
/// channel. Carries no ownership of store data; events are clones.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<MarketEvent>,
}

impl Subscription {
    /// This subscription's handle.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receive the next matching event; `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<MarketEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    ///
    /// # Errors
    ///
    /// Returns the underlying channel error when empty or disconnected.
    pub fn try_recv(&mut self) -> Result<MarketEvent, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }
}

struct Subscriber {
    filter: EventFilter,
    tx: mpsc::Sender<MarketEvent>,
}

// =============================================================================
// Hub
// =============================================================================

/// Central fan-out hub for market events.
pub struct MarketHub {
    subscribers: RwLock<HashMap<SubscriptionId, Subscriber>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl MarketHub {
    /// Create a hub with the given per-subscriber channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Create a hub with the default channel capacity.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Register a subscriber with the given filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);

        self.subscribers
            .write()
            .insert(id, Subscriber { filter, tx });

        Subscription { id, rx }
    }

    /// Remove a subscriber. Dropping the `Subscription` has the same
    /// effect lazily: the dead channel is pruned on the next delivery.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().remove(&id);
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver an event to every matching live subscriber.
    ///
    /// Returns the number of subscribers that received it. Full channels
    /// drop this event for that subscriber only; closed channels are
    /// pruned.
    pub fn publish(&self, event: &MarketEvent) -> usize {
        let mut delivered = 0;
        let mut dead: Vec<SubscriptionId> = Vec::new();

        {
            let subscribers = self.subscribers.read();
            for (id, subscriber) in subscribers.iter() {
                if !subscriber.filter.matches(event) {
                    continue;
                }

                match subscriber.tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::debug!(subscription = id.0, "Subscriber channel full, dropping event");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dead.push(*id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in dead {
                subscribers.remove(&id);
            }
        }

        delivered
    }
}

impl EventSink for MarketHub {
    fn notify(&self, event: MarketEvent) {
        let _ = self.publish(&event);
    }
}

/// Shared hub reference.
pub type SharedMarketHub = Arc<MarketHub>;
