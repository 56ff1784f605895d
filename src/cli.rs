// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI structure is a plain Rust struct and clap
// generates the parsing code (plus --help and --version) from the attributes.
//
// The seed URL is deliberately an Option here. If clap required it, a missing
// seed would become clap's own usage error; we want to answer with our own
// exit code instead (1 = no URL, 2 = invalid URL).
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use web_spider::config::{CrawlConfig, DEFAULT_WORKERS};
use web_spider::crawl::DEFAULT_FRONTIER_CAPACITY;
use web_spider::FetchSettings;

#[derive(Parser, Debug)]
#[command(
    name = "web-spider",
    version,
    about = "Crawl every page reachable from a seed URL, concurrently, visiting each URL once",
    long_about = "web-spider starts at a seed URL, follows every http(s) link it finds and \
                  prints each page together with the links found on it. Every URL is fetched \
                  at most once, and the crawl stops by itself when no work is left."
)]
pub struct Cli {
    /// The URL to start crawling from (e.g., https://example.com)
    pub seed: Option<String>,

    /// Number of pages fetched at the same time
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// How many discovered URLs may wait in the queue before workers pause
    #[arg(long, default_value_t = DEFAULT_FRONTIER_CAPACITY)]
    pub frontier_capacity: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Accept invalid TLS certificates (self-signed, expired, wrong host)
    #[arg(long)]
    pub insecure: bool,

    /// Also append every page and its links to this file (e.g., urls.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print results as JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            workers: self.workers,
            frontier_capacity: self.frontier_capacity,
        }
        .sanitized()
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.timeout.max(1)),
            accept_invalid_certs: self.insecure,
            ..FetchSettings::default()
        }
    }
}
