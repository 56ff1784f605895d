// src/crawl/dedup.rs
// =============================================================================
// The deduplication filter: admits each canonical URL exactly once per crawl.
//
// The whole check-then-insert happens inside one lock, so two workers racing
// on the same URL can never both see "not seen yet". HashSet::insert already
// returns whether the value was new, which makes the critical section a
// single call.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

// Owns the seen-set for one crawl run
//
// The set is append-only; a fresh crawl gets a fresh Deduplicator.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashSet<String>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `url` is passed in, false on every call
    /// after that.
    pub fn admit(&self, url: &Url) -> bool {
        self.lock().insert(url.as_str().to_owned())
    }

    /// Number of URLs admitted so far.
    pub fn admitted(&self) -> usize {
        self.lock().len()
    }

    // A panic while holding the lock can't leave the set half-written
    // (insert either happened or it didn't), so a poisoned lock is still
    // safe to keep using.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
