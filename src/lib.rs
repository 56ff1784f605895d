// src/lib.rs
// =============================================================================
// web-spider: visits every page reachable from a seed URL exactly once, with
// a fixed pool of concurrent workers.
//
// Modules:
// - crawl: the engine (frontier, dedup, worker pool, completion detection)
// - fetch: the HTTP fetcher and HTML link extractor the workers use
// - report: where results go (console, JSON lines, urls.txt)
// - config / seed: crawl settings and seed validation
//
// The binary in src/main.rs is a thin CLI on top of this library.
// =============================================================================

pub mod config;
pub mod crawl;
pub mod fetch;
pub mod report;
pub mod seed;

pub use config::CrawlConfig;
pub use crawl::{CrawlResult, CrawlSummary, Crawler, ResultSink};
pub use fetch::{FetchError, FetchSettings, Fetcher, HtmlLinkExtractor, HttpFetcher, LinkExtractor};
pub use report::{Reporter, ReportError};
pub use seed::{parse_seed, SeedError};
