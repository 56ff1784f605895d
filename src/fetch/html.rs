// src/fetch/html.rs
// =============================================================================
// Extracts links from HTML pages with the `scraper` crate.
//
// This only collects the raw href values. Turning "../about" into an
// absolute URL (and dropping mailto: and friends) is the canonicalizer's job,
// see src/crawl/canonical.rs.
// =============================================================================

use scraper::{Html, Selector};

use super::LinkExtractor;

#[derive(Debug, Clone)]
pub struct HtmlLinkExtractor {
    anchors: Selector,
}

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self {
            // A constant selector; it can only fail if this literal is wrong
            anchors: Selector::parse("a[href]").expect("a[href] is a valid selector"),
        }
    }
}

impl Default for HtmlLinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);

        document
            .select(&self.anchors)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }
}
