// src/crawl/completion.rs
// =============================================================================
// Knows when the crawl is finished.
//
// Every admitted URL holds one unit of "work" from the moment it passes the
// deduplicator until the worker that processed it has pushed all of its
// children. When the counter drops to zero nothing is queued, nothing is
// being fetched and nothing can be added anymore - so we close the frontier,
// which makes every worker fall out of its loop.
//
// The one rule that makes this correct (reserve-before-publish):
//   reserve() for a URL happens BEFORE that URL is pushed, and a worker's
//   release() happens AFTER all of its children were reserved and pushed.
// Break that order and the counter can briefly hit zero while work is still
// being staged, shutting the crawl down early.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::frontier::Frontier;

// The in-flight work counter for one crawl run
#[derive(Debug, Default)]
pub struct WorkCounter {
    in_flight: AtomicUsize,
}

impl WorkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes one unit of work for a URL that was just admitted.
    pub fn reserve(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// Gives back one unit of work. Returns true when this call brought the
    /// counter to zero.
    ///
    /// Panics on release without a matching reserve; that is a bookkeeping
    /// bug, and carrying on would either hang the crawl or end it early.
    pub fn release(&self) -> bool {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        assert!(previous > 0, "work counter released more often than reserved");
        previous == 1
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

// Owns the counter and the single decision to close the frontier
#[derive(Debug)]
pub struct CompletionDetector {
    counter: WorkCounter,
    frontier: Arc<Frontier>,
}

impl CompletionDetector {
    pub fn new(frontier: Arc<Frontier>) -> Self {
        Self {
            counter: WorkCounter::new(),
            frontier,
        }
    }

    pub fn reserve(&self) {
        self.counter.reserve();
    }

    // Releases one unit; the release that reaches zero closes the frontier
    //
    // Returns true if this call closed it. Frontier::close is itself
    // idempotent, so two observers can never double-close.
    pub fn release(&self) -> bool {
        if self.counter.release() {
            return self.frontier.close();
        }
        false
    }

    pub fn in_flight(&self) -> usize {
        self.counter.in_flight()
    }
}
