// src/crawl/worker.rs
// =============================================================================
// The worker pool and the crawl run that ties every component together.
//
// How a run works:
// 1. Admit the seed, reserve one unit of work for it, push it
// 2. Start N workers. Each one loops:
//      pop a URL -> fetch -> extract links -> canonicalize each one
//      -> admit it -> reserve -> push it (may wait on backpressure)
//      -> report the page -> release the page's unit of work
// 3. The release that brings the work counter to zero closes the frontier
// 4. Every worker's pop() then returns None, the workers exit, and we build
//    the summary
//
// A failed fetch is just a page with an error and no children. A panic
// inside the fetcher or extractor is caught and treated the same way, so a
// single bad page can never leak its unit of work and hang the crawl.
// =============================================================================

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, info, warn};
use url::Url;

use super::canonical::canonicalize_with;
use super::completion::CompletionDetector;
use super::dedup::Deduplicator;
use super::frontier::Frontier;
use super::result::{CrawlResult, CrawlSummary};
use super::sink::ResultSink;
use crate::config::CrawlConfig;
use crate::fetch::{Fetcher, LinkExtractor};

// Runs crawls with a fixed set of collaborators
//
// Every call to run() starts from a fresh seen-set, frontier and work
// counter; nothing carries over between runs except the sink.
pub struct Crawler<F, E> {
    fetcher: Arc<F>,
    extractor: Arc<E>,
    sink: Arc<ResultSink>,
    config: CrawlConfig,
}

impl<F, E> Crawler<F, E>
where
    F: Fetcher + 'static,
    E: LinkExtractor + 'static,
{
    pub fn new(fetcher: F, extractor: E, sink: ResultSink, config: CrawlConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            sink: Arc::new(sink),
            config: config.sanitized(),
        }
    }

    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    // Crawls everything reachable from `seed` and returns once all workers
    // have exited
    pub async fn run(&self, mut seed: Url) -> CrawlSummary {
        let started = Instant::now();
        seed.set_fragment(None);

        let frontier = Arc::new(Frontier::new(
            self.config.frontier_capacity,
            self.config.workers,
        ));
        let run = Arc::new(Run {
            frontier: Arc::clone(&frontier),
            dedup: Deduplicator::new(),
            completion: CompletionDetector::new(Arc::clone(&frontier)),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            sink: Arc::clone(&self.sink),
        });

        info!(
            seed = %seed,
            workers = self.config.workers,
            frontier_capacity = self.config.frontier_capacity,
            "starting crawl"
        );

        // The seed goes through the same admit -> reserve -> push path as
        // every discovered link
        run.dedup.admit(&seed);
        run.stage(seed).await;

        let workers = (0..self.config.workers).map(|id| {
            let run = Arc::clone(&run);
            tokio::spawn(async move { run.work(id).await })
        });

        // Totals come from this run's own workers; the sink may be shared
        // with other runs going on at the same time
        let mut tally = Tally::default();
        for outcome in join_all(workers).await {
            match outcome {
                Ok(worker) => tally.add(worker),
                Err(e) => warn!(error = %e, "worker task ended abnormally"),
            }
        }

        let summary = CrawlSummary {
            admitted: run.dedup.admitted(),
            processed: tally.processed,
            failed: tally.failed,
            report_errors: tally.report_errors,
            in_flight: run.completion.in_flight(),
            frontier_peak: frontier.peak(),
            elapsed: started.elapsed(),
        };

        info!(
            admitted = summary.admitted,
            processed = summary.processed,
            failed = summary.failed,
            frontier_peak = summary.frontier_peak,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "crawl finished"
        );

        summary
    }
}

// What one worker did during a run
#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    failed: usize,
    report_errors: usize,
}

impl Tally {
    fn add(&mut self, other: Tally) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.report_errors += other.report_errors;
    }
}

// Holds one unit of work and gives it back when dropped, so the unit is
// released even if the worker unwinds halfway through a page
struct WorkUnit<'a> {
    completion: &'a CompletionDetector,
}

impl<'a> WorkUnit<'a> {
    fn new(completion: &'a CompletionDetector) -> Self {
        Self { completion }
    }
}

impl Drop for WorkUnit<'_> {
    fn drop(&mut self) {
        self.completion.release();
    }
}

// State shared by the workers of one run
struct Run<F, E> {
    frontier: Arc<Frontier>,
    dedup: Deduplicator,
    completion: CompletionDetector,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    sink: Arc<ResultSink>,
}

impl<F: Fetcher, E: LinkExtractor> Run<F, E> {
    // The worker loop; only a closed frontier ends it
    async fn work(&self, id: usize) -> Tally {
        let mut tally = Tally::default();

        while let Some(url) = self.frontier.pop().await {
            // Dropped at the end of this iteration, after every child was
            // reserved and pushed and the result was reported
            let _unit = WorkUnit::new(&self.completion);

            let result = match AssertUnwindSafe(self.process(url.clone()))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(worker = id, url = %url, "page processing panicked");
                    let now = Utc::now();
                    CrawlResult {
                        source_url: url,
                        discovered_urls: Vec::new(),
                        start_time: now,
                        end_time: now,
                        error: Some("page processing panicked".to_string()),
                    }
                }
            };

            if !result.is_ok() {
                tally.failed += 1;
            }
            if !self.sink.report(result) {
                tally.report_errors += 1;
            }
            tally.processed += 1;
        }

        debug!(worker = id, processed = tally.processed, "worker exiting");
        tally
    }

    async fn process(&self, url: Url) -> CrawlResult {
        let start_time = Utc::now();

        let (discovered_urls, error) = match self.fetcher.fetch(&url).await {
            Ok(body) => (self.follow_links(&url, &body).await, None),
            Err(e) => {
                warn!(url = %url, error = %e, "fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        CrawlResult {
            source_url: url,
            discovered_urls,
            start_time,
            end_time: Utc::now(),
            error,
        }
    }

    // Canonicalizes every link on the page and stages the new ones
    //
    // Links are pushed one at a time by this worker, so a huge page waits on
    // the frontier instead of fanning out.
    async fn follow_links(&self, page: &Url, body: &str) -> Vec<Url> {
        let hrefs = self.extractor.extract_links(body);
        let mut discovered = Vec::with_capacity(hrefs.len());

        for href in hrefs {
            let Some(url) = canonicalize_with(&href, page) else {
                continue;
            };

            if self.dedup.admit(&url) {
                debug!(parent = %page, url = %url, "admitted");
                self.stage(url.clone()).await;
            }
            discovered.push(url);
        }

        discovered
    }

    // Reserve-before-publish: the work unit exists before anyone can pop
    // the URL
    async fn stage(&self, url: Url) {
        self.completion.reserve();
        if let Err(closed) = self.frontier.push(url).await {
            // Only reachable if the bookkeeping is broken; undo our
            // reservation so the counter stays balanced
            warn!(error = %closed, "dropping admitted URL");
            self.completion.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::report::{ReportError, Reporter};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    // An in-memory web: each page is either a list of hrefs or a failure
    #[derive(Default)]
    struct FakeWeb {
        pages: HashMap<String, Result<Vec<String>, String>>,
        fetches: Mutex<HashMap<String, usize>>,
        delay: Option<Duration>,
    }

    impl FakeWeb {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            self.pages.insert(
                url.to_string(),
                Ok(links.iter().map(|l| l.to_string()).collect()),
            );
            self
        }

        fn broken(mut self, url: &str, reason: &str) -> Self {
            self.pages.insert(url.to_string(), Err(reason.to_string()));
            self
        }

        fn fetch_counts(&self) -> HashMap<String, usize> {
            self.fetches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for Arc<FakeWeb> {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            *self
                .fetches
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default() += 1;

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            } else {
                tokio::task::yield_now().await;
            }

            match self.pages.get(url.as_str()) {
                Some(Ok(links)) => Ok(links.join("\n")),
                Some(Err(reason)) => Err(FetchError::Other(reason.clone())),
                None => Err(FetchError::Other("not found".to_string())),
            }
        }
    }

    // Bodies are just one href per line
    struct LineExtractor;

    impl LinkExtractor for LineExtractor {
        fn extract_links(&self, body: &str) -> Vec<String> {
            body.lines().map(str::to_string).collect()
        }
    }

    #[derive(Clone, Default)]
    struct Collected(Arc<Mutex<Vec<CrawlResult>>>);

    impl Collected {
        fn by_source(&self) -> HashMap<String, CrawlResult> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|r| (r.source_url.to_string(), r.clone()))
                .collect()
        }

        fn len(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl Reporter for Collected {
        fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
            self.0.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    async fn crawl(
        web: Arc<FakeWeb>,
        seed: &str,
        config: CrawlConfig,
    ) -> (CrawlSummary, Collected) {
        let collected = Collected::default();
        let crawler = Crawler::new(
            web,
            LineExtractor,
            ResultSink::new(collected.clone()),
            config,
        );
        let summary = timeout(
            Duration::from_secs(30),
            crawler.run(Url::parse(seed).unwrap()),
        )
        .await
        .expect("crawl should terminate");
        assert_eq!(summary.in_flight, 0, "work left over after the crawl");
        (summary, collected)
    }

    fn urls(list: &[&str]) -> Vec<Url> {
        list.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_linear_chain() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://a.test/", &["https://b.test/"])
                .page("https://b.test/", &["https://c.test/"])
                .page("https://c.test/", &[]),
        );

        let (summary, collected) = crawl(web, "https://a.test/", CrawlConfig::default()).await;
        let results = collected.by_source();

        assert_eq!(results.len(), 3);
        assert_eq!(results["https://a.test/"].discovered_urls, urls(&["https://b.test/"]));
        assert_eq!(results["https://b.test/"].discovered_urls, urls(&["https://c.test/"]));
        assert!(results["https://c.test/"].discovered_urls.is_empty());
        assert_eq!(summary.admitted, 3);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.in_flight, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycle_visits_each_page_once() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://a.test/", &["https://b.test/"])
                .page("https://b.test/", &["https://a.test/#again", "/"]),
        );

        let (summary, collected) =
            crawl(Arc::clone(&web), "https://a.test/", CrawlConfig::default()).await;

        assert_eq!(collected.len(), 2);
        assert_eq!(summary.admitted, 2);
        assert_eq!(
            collected.by_source()["https://b.test/"].discovered_urls,
            urls(&["https://a.test/", "https://b.test/"])
        );
        assert!(web.fetch_counts().values().all(|&n| n == 1));
    }

    #[tokio::test]
    async fn test_failed_seed_ends_the_crawl() {
        let web = Arc::new(FakeWeb::default().broken("https://a.test/", "connection refused"));

        let (summary, collected) = crawl(web, "https://a.test/", CrawlConfig::default()).await;
        let results = collected.by_source();

        assert_eq!(results.len(), 1);
        let a = &results["https://a.test/"];
        assert_eq!(a.error.as_deref(), Some("connection refused"));
        assert!(a.discovered_urls.is_empty());
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
    }

    #[tokio::test]
    async fn test_bad_links_are_dropped_and_broken_pages_keep_the_crawl_going() {
        let web = Arc::new(
            FakeWeb::default()
                .page(
                    "https://a.test/",
                    &["mailto:x@a.test", "javascript:void(0)", "http://[::1", "/ok", "/gone"],
                )
                .page("https://a.test/ok", &[])
                .broken("https://a.test/gone", "HTTP 404 Not Found"),
        );

        let (summary, collected) = crawl(web, "https://a.test/", CrawlConfig::default()).await;

        assert_eq!(
            collected.by_source()["https://a.test/"].discovered_urls,
            urls(&["https://a.test/ok", "https://a.test/gone"])
        );
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_dense_graph_conserves_work_and_never_refetches() {
        // 200 pages, each linking to 20 others (and back to the seed)
        let n = 200;
        let mut web = FakeWeb::default();
        for i in 0..n {
            let links: Vec<String> = (1..=20)
                .map(|step| format!("https://g.test/{}", (i * 7 + step) % n))
                .chain(std::iter::once("https://g.test/0".to_string()))
                .collect();
            let refs: Vec<&str> = links.iter().map(String::as_str).collect();
            web = web.page(&format!("https://g.test/{i}"), &refs);
        }
        let web = Arc::new(web);

        let config = CrawlConfig {
            workers: 8,
            frontier_capacity: 4,
        };
        let (summary, collected) = crawl(Arc::clone(&web), "https://g.test/0", config).await;

        let counts = web.fetch_counts();
        assert!(counts.values().all(|&c| c == 1), "some URL was fetched twice");
        assert_eq!(counts.len(), summary.admitted);
        assert_eq!(collected.len(), summary.admitted);
        assert_eq!(summary.processed, summary.admitted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_beyond_capacity() {
        let targets: Vec<String> = (0..10_000).map(|i| format!("https://wide.test/{i}")).collect();
        let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
        // Targets are not in the web, so every one of them fails fast
        let web = Arc::new(FakeWeb::default().page("https://wide.test/", &refs));

        let config = CrawlConfig {
            workers: 4,
            frontier_capacity: 100,
        };
        let (summary, collected) = crawl(web, "https://wide.test/", config).await;

        assert_eq!(summary.admitted, 10_001);
        assert_eq!(summary.processed, 10_001);
        assert_eq!(collected.len(), 10_001);
        assert_eq!(summary.failed, 10_000);
        assert!(
            summary.frontier_peak <= 100,
            "frontier grew to {}",
            summary.frontier_peak
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_worker_producing_does_not_deadlock() {
        // Two workers, a frontier of one, and pages that all link to many
        // fresh pages: both workers end up producing at the same time
        let mut web = FakeWeb::default();
        for i in 0..50 {
            let links: Vec<String> = (0..10).map(|j| format!("https://d.test/{}", i * 10 + j + 1)).collect();
            let refs: Vec<&str> = links.iter().map(String::as_str).collect();
            web = web.page(&format!("https://d.test/{i}"), &refs);
        }
        let web = Arc::new(web);

        let config = CrawlConfig {
            workers: 2,
            frontier_capacity: 1,
        };
        let (summary, collected) = crawl(web, "https://d.test/0", config).await;

        assert_eq!(summary.processed, summary.admitted);
        assert_eq!(collected.len(), summary.admitted);
        assert_eq!(summary.admitted, 501);
    }

    #[tokio::test]
    async fn test_single_worker_with_tiny_frontier_finishes() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://s.test/", &["/1", "/2", "/3"])
                .page("https://s.test/1", &["/2", "/3", "/4"]),
        );
        let config = CrawlConfig {
            workers: 1,
            frontier_capacity: 1,
        };

        let (summary, _) = crawl(web, "https://s.test/", config).await;
        assert_eq!(summary.admitted, 5);
        assert_eq!(summary.processed, 5);
    }

    struct PanickyExtractor;

    impl LinkExtractor for PanickyExtractor {
        fn extract_links(&self, body: &str) -> Vec<String> {
            if body.contains("boom") {
                panic!("extractor blew up");
            }
            body.lines().map(str::to_string).collect()
        }
    }

    #[tokio::test]
    async fn test_panicking_page_is_reported_and_crawl_terminates() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://p.test/", &["/bad", "/good"])
                .page("https://p.test/bad", &["boom"])
                .page("https://p.test/good", &[]),
        );
        let collected = Collected::default();
        let crawler = Crawler::new(
            web,
            PanickyExtractor,
            ResultSink::new(collected.clone()),
            CrawlConfig::default(),
        );

        let summary = timeout(
            Duration::from_secs(10),
            crawler.run(Url::parse("https://p.test/").unwrap()),
        )
        .await
        .expect("crawl should terminate");

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 1);
        assert!(collected.by_source()["https://p.test/bad"].error.is_some());
    }

    #[tokio::test]
    async fn test_each_run_starts_fresh() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://r.test/", &["/x"])
                .page("https://r.test/x", &[]),
        );
        let collected = Collected::default();
        let crawler = Crawler::new(
            Arc::clone(&web),
            LineExtractor,
            ResultSink::new(collected.clone()),
            CrawlConfig::default(),
        );
        let seed = Url::parse("https://r.test/").unwrap();

        let first = crawler.run(seed.clone()).await;
        let second = crawler.run(seed).await;

        assert_eq!(first.processed, 2);
        assert_eq!(second.processed, 2);
        assert_eq!(second.admitted, 2);
        assert_eq!(collected.len(), 4);
        assert_eq!(crawler.sink().reported(), 4);
        assert!(web.fetch_counts().values().all(|&c| c == 2));
    }

    // Panics while writing /b
    struct PanickyReporter(Collected);

    impl Reporter for PanickyReporter {
        fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
            if result.source_url.path() == "/b" {
                panic!("reporter blew up");
            }
            self.0.report(result)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_reporter_does_not_hang_the_crawl() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://q.test/", &["/a", "/b"])
                .page("https://q.test/a", &["/c"])
                .page("https://q.test/b", &["/d"])
                .page("https://q.test/c", &[])
                .page("https://q.test/d", &[]),
        );
        let collected = Collected::default();
        let crawler = Crawler::new(
            web,
            LineExtractor,
            ResultSink::new(PanickyReporter(collected.clone())),
            CrawlConfig::default(),
        );

        let summary = timeout(
            Duration::from_secs(10),
            crawler.run(Url::parse("https://q.test/").unwrap()),
        )
        .await
        .expect("crawl should terminate");

        assert_eq!(summary.admitted, 5);
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.report_errors, 1);
        assert_eq!(summary.in_flight, 0);
        assert_eq!(collected.len(), 4);
        assert!(!collected.by_source().contains_key("https://q.test/b"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_runs_keep_separate_totals() {
        let web = Arc::new(
            FakeWeb::default()
                .page("https://p.test/", &["/1", "/2"])
                .page("https://p.test/1", &[])
                .page("https://p.test/2", &[])
                .page("https://q.test/", &["/1", "/2", "/3", "/4"])
                .broken("https://q.test/1", "connection reset"),
        );
        let collected = Collected::default();
        let crawler = Crawler::new(
            web,
            LineExtractor,
            ResultSink::new(collected.clone()),
            CrawlConfig::default(),
        );

        let (p, q) = timeout(
            Duration::from_secs(10),
            async {
                tokio::join!(
                    crawler.run(Url::parse("https://p.test/").unwrap()),
                    crawler.run(Url::parse("https://q.test/").unwrap()),
                )
            },
        )
        .await
        .expect("both crawls should terminate");

        assert_eq!((p.admitted, p.processed, p.failed), (3, 3, 0));
        // q.test/2..4 aren't in the web either, so only the seed succeeds
        assert_eq!((q.admitted, q.processed, q.failed), (5, 5, 4));
        assert_eq!(p.in_flight + q.in_flight, 0);
        assert_eq!(collected.len(), 8);
        assert_eq!(crawler.sink().reported(), 8);
    }
}
