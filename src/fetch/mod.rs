// src/fetch/mod.rs
// =============================================================================
// The two collaborators a worker needs to process a page:
// - Fetcher: downloads a URL and returns the body (http.rs uses reqwest)
// - LinkExtractor: pulls raw href strings out of a body (html.rs uses scraper)
//
// The crawl engine only ever talks to the traits, so tests can swap in an
// in-memory web and the engine never knows about HTTP or HTML.
// =============================================================================

mod html;
mod http;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use html::HtmlLinkExtractor;
pub use http::{FetchSettings, HttpFetcher};

// Why fetching one page failed
//
// Every variant is final for that URL: the crawl records it and moves on,
// there are no retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered, but not with a 2xx status
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    /// Network, DNS, TLS, timeout or redirect-loop failure
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The response body couldn't be read
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
    /// Anything a non-HTTP fetcher wants to report
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

pub trait LinkExtractor: Send + Sync {
    // Returns every raw href on the page, in document order
    fn extract_links(&self, body: &str) -> Vec<String>;
}
