//! reqwest-backed HTML fetcher.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{is_html_content_type, FetchedPage, HtmlFetcher};

const DEFAULT_USER_AGENT: &str = "SourceDiscoveryBot/1.0";
const MAX_REDIRECTS: usize = 10;

/// Fetches homepages over HTTP(S), following up to 10 redirects.
///
/// Non-success statuses are returned as pages so the caller decides what
/// to accept. Transport failures, timeouts and non-HTML content types are
/// errors; a non-HTML body is never downloaded.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn get_html(&self, url: &str, timeout: Duration) -> FetchResult<FetchedPage> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        debug!(url = %url, timeout = ?timeout, "HTTP fetch starting");

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http(Box::new(e))
            }
        };

        let response = self
            .client
            .get(parsed)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        check_content_type(&final_url, content_type.as_deref())?;

        let body = response.text().await.map_err(classify)?;

        debug!(
            url = %url,
            final_url = %final_url,
            status,
            bytes = body.len(),
            "HTTP fetch completed"
        );

        Ok(FetchedPage {
            url: final_url,
            status,
            content_type,
            body,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Refuse non-HTML responses before their body is downloaded.
fn check_content_type(url: &str, content_type: Option<&str>) -> FetchResult<()> {
    if is_html_content_type(content_type) {
        return Ok(());
    }
    debug!(url = %url, content_type = ?content_type, "Skipping non-HTML body");
    Err(FetchError::NotHtml {
        url: url.to_string(),
        content_type: content_type.unwrap_or_default().to_string(),
    })
}
