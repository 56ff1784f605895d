// src/crawl/result.rs
// =============================================================================
// What a crawl produces: one CrawlResult per processed page, and a
// CrawlSummary for the whole run.
// =============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

// The outcome of processing one URL
//
// Produced by exactly one worker and handed to the sink exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlResult {
    /// The page that was fetched
    pub source_url: Url,
    /// Every link on the page that canonicalized, in document order
    /// (including links that were already seen elsewhere)
    pub discovered_urls: Vec<Url>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Why the fetch failed, if it did. A failed page never has children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// Totals for one finished crawl run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// URLs that passed the deduplicator, seed included
    pub admitted: usize,
    /// Results handed to the sink
    pub processed: usize,
    /// Results that carry a fetch error
    pub failed: usize,
    /// Results the reporter failed to write
    pub report_errors: usize,
    /// Units of work still held when the workers exited (0 for a clean run)
    pub in_flight: usize,
    /// Most URLs the frontier ever held at once
    pub frontier_peak: usize,
    pub elapsed: Duration,
}
