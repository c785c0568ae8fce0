//! Domain layer for the market sync core.
//!
//! Contains the market data snapshot types, the domain events that flow
//! between transports and consumers, and the authoritative store with its
//! freshness-based merge rule.

pub mod events;
pub mod market;
pub mod store;
