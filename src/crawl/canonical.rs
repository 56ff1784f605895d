// src/crawl/canonical.rs
// =============================================================================
// Turns a raw href found on a page into the canonical URL we crawl and
// deduplicate on.
//
// How it works:
// 1. Parse the base (the page the link was found on)
// 2. Resolve the href against it (absolute, scheme-relative, path-relative
//    and fragment-only references all work, just like in a browser)
// 3. Reject anything that isn't http/https (mailto:, javascript:, data: ...)
// 4. Drop the #fragment - it never changes which document gets fetched
//
// The url crate already normalizes the rest: lowercase scheme and host,
// default ports removed, "." and ".." path segments resolved.
//
// This is a pure function with no shared state, so every worker can call it
// at the same time without any locking.
// =============================================================================

use url::Url;

// Resolves `href` relative to `base` and returns its canonical form
//
// Returns None when either input doesn't parse or the result isn't HTTP(S).
// A None here is a silently dropped link, never a crawl error.
pub fn canonicalize(href: &str, base: &str) -> Option<Url> {
    let base = Url::parse(base).ok()?;
    canonicalize_with(href, &base)
}

// Same as canonicalize, for callers that already hold a parsed base
//
// Workers resolve every link of a page against the same base, so they parse
// it once and call this in the loop.
pub fn canonicalize_with(href: &str, base: &Url) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;

    if !is_http(&url) {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host().is_some()
}
