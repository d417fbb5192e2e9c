//! Authorization-aware element cache.
//!
//! Entries are populated on create and on every read made without hidden data, and
//! invalidated by id on every update, delete, hide or mark-visible touching the
//! element. A lookup hits only when the cached fetch hints cover the requested ones
//! and the entry was loaded under the caller's own authorizations.

use crate::model::{FetchHints, GraphElement};
use crate::security::Authorizations;
use log::trace;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

struct CacheEntry<T> {
    element: T,
    authorizations: Authorizations,
}

/// LRU cache of one element kind, keyed by id.
pub(crate) struct ElementCache<T> {
    entries: Option<Mutex<LruCache<String, CacheEntry<T>>>>,
}

impl<T: GraphElement + Clone> ElementCache<T> {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(
        &self,
        id: &str,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Option<T> {
        let entries = self.entries.as_ref()?;
        let mut entries = entries.lock();
        let entry = entries.get(id)?;
        if !entry.element.fetch_hints().has_fetch_hints(fetch_hints)
            || entry.authorizations != *authorizations
        {
            trace!("Cache miss for {id}: hints or authorizations differ");
            return None;
        }
        Some(entry.element.clone())
    }

    pub fn put(&self, element: &T, authorizations: &Authorizations) {
        if element.fetch_hints().is_include_hidden() {
            return;
        }
        if let Some(entries) = &self.entries {
            entries.lock().put(
                element.id().to_string(),
                CacheEntry {
                    element: element.clone(),
                    authorizations: authorizations.clone(),
                },
            );
        }
    }

    pub fn invalidate(&self, id: &str) {
        if let Some(entries) = &self.entries {
            entries.lock().pop(id);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().len())
    }
}
