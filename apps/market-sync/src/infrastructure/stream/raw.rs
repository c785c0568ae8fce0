//! Raw Message Ring Buffer
//!
//! Keeps the most recent inbound frames for diagnostics and replay.
//! Bounded; the oldest entry is evicted first. Never consulted for
//! correctness decisions.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Default ring buffer capacity.
pub const DEFAULT_RAW_CAPACITY: usize = 100;

/// One raw inbound frame.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Frame payload as received.
    pub payload: String,
    /// Receive timestamp.
    pub received_at: DateTime<Utc>,
}

/// Bounded ring buffer of raw inbound frames.
#[derive(Debug)]
pub struct RawMessageBuffer {
    inner: RwLock<VecDeque<RawMessage>>,
    capacity: usize,
}

impl Default for RawMessageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RAW_CAPACITY)
    }
}

impl RawMessageBuffer {
    /// Create a buffer with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Append a frame, evicting the oldest entry when full.
    pub fn push(&self, payload: String) {
        let mut inner = self.inner.write();
        if inner.len() == self.capacity {
            inner.pop_front();
        }
        inner.push_back(RawMessage {
            payload,
            received_at: Utc::now(),
        });
    }

    /// Number of retained frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// The most recent `n` frames, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<RawMessage> {
        let inner = self.inner.read();
        inner.iter().skip(inner.len().saturating_sub(n)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first_at_capacity() {
        let buffer = RawMessageBuffer::new(3);
        for i in 0..5 {
            buffer.push(format!("frame-{i}"));
        }

        assert_eq!(buffer.len(), 3);
        let recent = buffer.recent(10);
        assert_eq!(recent[0].payload, "frame-2");
        assert_eq!(recent[2].payload, "frame-4");
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let buffer = RawMessageBuffer::default();
        for i in 0..10 {
            buffer.push(format!("frame-{i}"));
        }

        let recent = buffer.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].payload, "frame-8");
        assert_eq!(recent[1].payload, "frame-9");
    }
}
