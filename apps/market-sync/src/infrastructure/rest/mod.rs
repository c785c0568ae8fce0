//! REST Polling Transport
//!
//! Pull-based bootstrap and backstop for the stream: a reqwest client for
//! provider snapshot endpoints, a static fallback provider for cold
//! starts, and the polling fetcher whose fixed-cadence timers funnel
//! results through the same store-merge path as the stream decoder.

pub mod client;
pub mod fallback;
pub mod intervals;
pub mod poller;

pub use client::{RestClient, RestConfig};
pub use fallback::StaticSnapshots;
pub use poller::{PollKinds, PollingConfig, PollingFetcher};
