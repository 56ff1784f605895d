// src/main.rs
// =============================================================================
// Entry point of the web-spider CLI.
//
// What happens here:
// 1. Set up logging (stderr, controlled by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Validate the seed URL
// 4. Build the fetcher, link extractor and reporter, then run the crawl
// 5. Exit with a code that tells the caller what happened
//
// Exit codes:
//   0 = crawl finished (individual pages may still have failed)
//   1 = no seed URL given
//   2 = the seed URL is invalid
//   3 = anything else went wrong before the crawl could start
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use web_spider::report::{JsonLinesReporter, Reporter, TeeReporter, TextReporter, UrlFileReporter};
use web_spider::{parse_seed, Crawler, HtmlLinkExtractor, HttpFetcher, ResultSink, SeedError};

const EXIT_OK: i32 = 0;
const EXIT_NO_SEED: i32 = 1;
const EXIT_INVALID_SEED: i32 = 2;
const EXIT_FAILURE: i32 = 3;

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    let exit_code = match run(cli).await {
        Ok(()) => EXIT_OK,
        Err(e) => match e.downcast_ref::<SeedError>() {
            Some(seed_error) => {
                eprintln!("Error: {}", seed_error);
                match seed_error {
                    SeedError::Missing => EXIT_NO_SEED,
                    _ => EXIT_INVALID_SEED,
                }
            }
            None => {
                error!("{:#}", e);
                EXIT_FAILURE
            }
        },
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout only ever carries crawl results
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let seed = parse_seed(cli.seed.as_deref())?;

    let fetcher =
        HttpFetcher::new(&cli.fetch_settings()).context("failed to build the HTTP client")?;
    let sink = ResultSink::boxed(build_reporter(&cli)?);

    let crawler = Crawler::new(fetcher, HtmlLinkExtractor::new(), sink, cli.crawl_config());
    let summary = crawler.run(seed).await;

    info!(
        pages = summary.processed,
        failed = summary.failed,
        "crawled {} page(s) in {:.2?}",
        summary.processed,
        summary.elapsed
    );
    Ok(())
}

// Console reporter (text or JSON lines), plus the urls file if asked for
fn build_reporter(cli: &Cli) -> Result<Box<dyn Reporter>> {
    let console: Box<dyn Reporter> = if cli.json {
        Box::new(JsonLinesReporter::stdout())
    } else {
        Box::new(TextReporter::stdout())
    };

    match &cli.output {
        Some(path) => {
            let file = UrlFileReporter::open(path)
                .with_context(|| format!("failed to open output file {}", path.display()))?;
            Ok(Box::new(TeeReporter::new(console, file)))
        }
        None => Ok(console),
    }
}
