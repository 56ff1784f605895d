// src/config.rs
// =============================================================================
// Knobs for the crawl engine itself. Transport settings (timeouts, TLS) live
// with the HTTP fetcher in src/fetch/http.rs; the CLI fills in both.
// =============================================================================

use crate::crawl::DEFAULT_FRONTIER_CAPACITY;

/// Default size of the worker pool.
pub const DEFAULT_WORKERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// How many pages are fetched at the same time
    pub workers: usize,
    /// How many admitted URLs may wait in the frontier before producers block
    pub frontier_capacity: usize,
}

impl CrawlConfig {
    // Zero workers would never finish and a zero-sized frontier could never
    // accept the seed, so both are raised to at least 1
    pub fn sanitized(self) -> Self {
        Self {
            workers: self.workers.max(1),
            frontier_capacity: self.frontier_capacity.max(1),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
        }
    }
}
