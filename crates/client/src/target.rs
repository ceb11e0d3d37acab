//! Validation of scrape targets.
//!
//! The pipeline only ever navigates to absolute `http`/`https` URLs. Anything
//! else is rejected here, before the cache or the browser is touched.

use mdscrape_core::Error;

/// Error type for URL validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("Missing url parameter")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

/// Validate a requested URL.
///
/// Unlike a canonicalizer this never rewrites the input: relative or
/// scheme-less URLs are rejected rather than defaulted to `https://`.
/// Leading/trailing whitespace is ignored.
pub fn validate_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(parsed)
}
