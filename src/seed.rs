// src/seed.rs
// =============================================================================
// Validates the seed URL before any crawling starts.
//
// This is the only fatal error in the whole crawl: once the seed is accepted,
// bad pages and bad links just degrade the result instead of stopping it.
// =============================================================================

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("please specify a URL to crawl")]
    Missing,
    #[error("'{input}' is not a valid URL: {source}")]
    Malformed {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("'{0}' is not an http or https URL")]
    UnsupportedScheme(String),
}

// Parses the seed as an absolute HTTP(S) URL
//
// Surrounding whitespace is ignored and the #fragment is dropped, so the seed
// has the same canonical form as any link pointing back at it.
pub fn parse_seed(input: Option<&str>) -> Result<Url, SeedError> {
    let input = input.map(str::trim).filter(|s| !s.is_empty()).ok_or(SeedError::Missing)?;

    let mut url = Url::parse(input).map_err(|source| SeedError::Malformed {
        input: input.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(SeedError::UnsupportedScheme(input.to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_seed() {
        let url = parse_seed(Some(" https://Example.com/start#top ")).unwrap();
        assert_eq!(url.as_str(), "https://example.com/start");
    }

    #[test]
    fn test_missing_seed() {
        assert_eq!(parse_seed(None), Err(SeedError::Missing));
        assert_eq!(parse_seed(Some("   ")), Err(SeedError::Missing));
    }

    #[test]
    fn test_relative_seed_is_malformed() {
        assert!(matches!(
            parse_seed(Some("/just/a/path")),
            Err(SeedError::Malformed { .. })
        ));
    }

    #[test]
    fn test_non_http_seed_is_rejected() {
        assert_eq!(
            parse_seed(Some("ftp://example.com/")),
            Err(SeedError::UnsupportedScheme("ftp://example.com/".to_string()))
        );
        assert!(matches!(
            parse_seed(Some("mailto:me@example.com")),
            Err(SeedError::UnsupportedScheme(_))
        ));
    }
}
