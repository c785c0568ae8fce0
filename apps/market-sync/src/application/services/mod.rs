//! Application services.

pub mod sync;

pub use sync::MarketSyncService;
