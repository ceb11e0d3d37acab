//! Unified error types for mdscrape.
//!
//! Every failure a scrape request can produce collapses into one of these
//! variants. A page whose main content cannot be isolated is *not* an error:
//! the extractor silently falls back to the full document.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the mdscrape pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input (bad URL, zero chunk size). No browser work is done.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// DNS, connection, or navigation-timeout failure while loading the page.
    #[error("NAVIGATION_FAILED: {0}")]
    NavigationFailed(String),

    /// Unexpected failure anywhere after navigation, including browser launch.
    #[error("PIPELINE_FAILURE: {0}")]
    PipelineFailure(String),

    /// The coordinator's hard deadline fired before the pipeline finished.
    #[error("DEADLINE_EXCEEDED: {0}")]
    DeadlineExceeded(String),
}

impl Error {
    /// HTTP status an outer transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::NavigationFailed(_) | Error::PipelineFailure(_) => 500,
            Error::DeadlineExceeded(_) => 504,
        }
    }

    /// Human-readable message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidInput(msg)
            | Error::NavigationFailed(msg)
            | Error::PipelineFailure(msg)
            | Error::DeadlineExceeded(msg) => msg,
        }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::NavigationFailed(_) => -32012,
            Error::PipelineFailure(_) => -32000,
            Error::DeadlineExceeded(_) => -32006,
        };

        McpError { code: ErrorCode(code), message: err.message().to_string().into(), data: None }
    }
}
