// src/crawl/mod.rs
// =============================================================================
// The crawl engine.
//
// Components (leaves first):
// - canonical: href + page URL -> canonical absolute URL (or drop it)
// - dedup: admits each canonical URL exactly once per run
// - frontier: bounded blocking queue of admitted URLs
// - completion: in-flight work counter; closes the frontier at quiescence
// - sink: serializes result reporting
// - worker: the worker pool and Crawler::run, which wires it all together
//
// Data flow:
//   seed -> dedup -> frontier -> worker (fetch + extract)
//        -> canonical -> dedup -> frontier (again) ... and one result per page
//           goes to the sink
// =============================================================================

mod canonical;
mod completion;
mod dedup;
mod frontier;
mod result;
mod sink;
mod worker;

pub use canonical::{canonicalize, canonicalize_with};
pub use completion::{CompletionDetector, WorkCounter};
pub use dedup::Deduplicator;
pub use frontier::{Frontier, FrontierClosed, DEFAULT_FRONTIER_CAPACITY};
pub use result::{CrawlResult, CrawlSummary};
pub use sink::ResultSink;
pub use worker::Crawler;
