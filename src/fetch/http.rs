// src/fetch/http.rs
// =============================================================================
// Downloads pages over HTTP(S) with reqwest.
//
// Key functionality:
// - One Client for the whole crawl (connection pooling across workers)
// - Per-request timeout, so a hung server stalls a worker for a bounded time
// - Limited redirects (a redirect loop is just a failed page)
// - Any non-2xx answer is a failure for that URL
// - Certificate checks are ON unless the user explicitly passes --insecure
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{FetchError, Fetcher};

// Transport settings for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Whole-request timeout (connect + headers + body)
    pub timeout: Duration,
    /// How many redirects to follow before giving up on a URL
    pub redirect_limit: usize,
    /// Skip TLS certificate verification. Off by default.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            redirect_limit: 5,
            accept_invalid_certs: false,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the shared client; fails only if the TLS backend can't start
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.as_str())
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!(url = %url, "fetching");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        response.text().await.map_err(FetchError::Body)
    }
}
