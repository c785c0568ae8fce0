//! Configuration Loading

pub mod settings;

pub use settings::{ConfigError, PollingSettings, StreamSettings, SyncConfig};
