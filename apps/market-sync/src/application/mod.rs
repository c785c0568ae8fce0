//! Application layer - use cases and port definitions.

pub mod ports;
pub mod services;
