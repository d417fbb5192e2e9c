//! Element id generation.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of ids for elements created without one.
pub trait IdGenerator: Send + Sync {
    /// A fresh, never-before-returned id.
    fn next_id(&self) -> String;
}

/// Random UUIDv4 ids in simple (dash-free) form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Zero-padded sequential ids with an optional prefix; deterministic, for tests and
/// single-process tools.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Ids `{prefix}00000000000000000000`, `{prefix}00000000000000000001`, ...
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{:020}", self.prefix, n)
    }
}
