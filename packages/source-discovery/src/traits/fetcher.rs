//! HTML fetch trait used by the site walker.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchResult;

/// Raw response for a fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,

    /// HTTP status code.
    pub status: u16,

    /// `Content-Type` header, if any.
    pub content_type: Option<String>,

    /// Response body.
    pub body: String,
}

impl FetchedPage {
    /// Create a 200 `text/html` page.
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for `text/html` and `application/xhtml+xml` responses.
    ///
    /// A missing header is treated as HTML.
    pub fn is_html(&self) -> bool {
        is_html_content_type(self.content_type.as_deref())
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// True for `text/html` and `application/xhtml+xml`; `None` counts as HTML.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        }
    }
}

/// Fetches page HTML with a per-request timeout and redirect following.
///
/// # Implementations
///
/// - `HttpFetcher` - reqwest
/// - `MockFetcher` - for testing
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    /// Fetch a URL. Non-success statuses are returned, not raised; the
    /// caller decides what to accept.
    async fn get_html(&self, url: &str, timeout: Duration) -> FetchResult<FetchedPage>;

    /// Fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
