//! Monotonic timestamp source.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds that never repeat or go backwards.
///
/// Two calls within the same millisecond (or after a clock step backwards) return
/// `last + 1`.
#[derive(Debug, Default)]
pub struct IncreasingTime {
    last: AtomicI64,
}

impl IncreasingTime {
    /// Create a clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp, strictly greater than every previous one.
    pub fn next(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Make sure later timestamps exceed `timestamp` (used for caller-supplied times).
    pub fn observe(&self, timestamp: i64) {
        self.last.fetch_max(timestamp, Ordering::AcqRel);
    }
}
