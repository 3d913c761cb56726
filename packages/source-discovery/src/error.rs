//! Typed errors for the source discovery library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! caller defects (invalid queries, malformed tokens) apart from the
//! environmental failures the pipeline absorbs.

use thiserror::Error;

/// Errors that can occur during discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Search execution failed
    #[error("search failed: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Homepage fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Text-generation service unavailable or failed
    #[error("generation service error: {0}")]
    Generation(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Model output did not match the response contract
    #[error("schema violation: {reason}")]
    Schema { reason: String },

    /// Invalid search query provided
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Race identifier could not be parsed
    #[error("invalid race id: {race_id}")]
    InvalidRaceId { race_id: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request did not complete in time
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Non-success status code
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Response is not an HTML document
    #[error("non-HTML content ({content_type}) from {url}")]
    NotHtml { url: String, content_type: String },

    /// Response body was empty
    #[error("empty body from {url}")]
    EmptyBody { url: String },
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
