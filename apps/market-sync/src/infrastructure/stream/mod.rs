//! Stream Transport
//!
//! WebSocket connection lifecycle management, the JSON frame codec, the
//! fixed-interval reconnect policy, and the diagnostic raw-message ring
//! buffer.

pub mod codec;
pub mod connection;
pub mod messages;
pub mod raw;
pub mod reconnect;

pub use codec::{DecodeError, JsonCodec};
pub use connection::{StreamConfig, StreamConnection, StreamError};
pub use raw::{RawMessage, RawMessageBuffer};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
