//! Tavily-backed search executor.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::pipeline::heuristics::classify_source_type;
use crate::traits::searcher::SearchExecutor;
use crate::types::{query::SearchQuery, source::Source};

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";

/// Search executor on the Tavily search API.
///
/// Maps `max_results` directly and a query's date restriction to Tavily's
/// `time_range` bucket. Result scores come from Tavily's relevance score.
///
/// # Example
///
/// ```rust,ignore
/// let searcher = RateLimitedSearcher::new(TavilySearcher::from_env()?, 5);
/// ```
pub struct TavilySearcher {
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
    search_depth: String,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<&'static str>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    title: Option<String>,
    content: Option<String>,
    score: Option<f32>,
}

impl TavilySearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            search_depth: "basic".to_string(),
        }
    }

    /// Create from the `TAVILY_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| DiscoveryError::Config("TAVILY_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Use `advanced` search depth (slower, better recall).
    pub fn advanced(mut self) -> Self {
        self.search_depth = "advanced".to_string();
        self
    }

    /// Set a custom endpoint (for proxies and tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn request_body<'a>(&'a self, query: &'a SearchQuery) -> TavilyRequest<'a> {
        TavilyRequest {
            query: &query.text,
            search_depth: &self.search_depth,
            max_results: query.max_results,
            time_range: query.date_restrict.map(|d| d.time_range()),
        }
    }
}

fn to_source(result: TavilyResult) -> Option<Source> {
    url::Url::parse(&result.url).ok()?;

    let mut source = Source::new(result.url.as_str())
        .with_type(classify_source_type(&result.url))
        .with_score(result.score.unwrap_or(0.0));
    if let Some(title) = result.title.filter(|t| !t.trim().is_empty()) {
        source = source.with_title(title);
    }
    if let Some(content) = result.content.filter(|c| !c.trim().is_empty()) {
        source = source.with_description(content);
    }
    Some(source)
}

#[async_trait]
impl SearchExecutor for TavilySearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Source>> {
        debug!(query = %query.text, max_results = query.max_results, "Tavily search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&self.request_body(query))
            .send()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Search(
                format!("Tavily API error {}: {}", status, body).into(),
            ));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        Ok(parsed.results.into_iter().filter_map(to_source).collect())
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::query::{DateRestrict, Issue, QueryPurpose};
    use crate::types::source::SourceType;

    #[test]
    fn test_request_maps_date_restrict() {
        let searcher = TavilySearcher::new("tvly-test");
        let query = SearchQuery::new(
            "\"Josh Hawley\" immigration 2024",
            "mo-senate-2024",
            Issue::Immigration,
            QueryPurpose::CandidateIssue,
        )
        .unwrap()
        .with_max_results(7)
        .with_date_restrict(DateRestrict::parse("w2").unwrap());

        let body = serde_json::to_value(searcher.request_body(&query)).unwrap();

        assert_eq!(body["max_results"], 7);
        assert_eq!(body["time_range"], "month");
        assert_eq!(body["search_depth"], "basic");
    }

    #[test]
    fn test_evergreen_request_has_no_time_range() {
        let searcher = TavilySearcher::new("tvly-test").advanced();
        let query = SearchQuery::new(
            "site:ballotpedia.org Missouri",
            "mo-senate-2024",
            Issue::General,
            QueryPurpose::TrustedSeed,
        )
        .unwrap();

        let body = serde_json::to_value(searcher.request_body(&query)).unwrap();

        assert!(body.get("time_range").is_none());
        assert_eq!(body["search_depth"], "advanced");
    }

    #[test]
    fn test_result_mapping() {
        let response: TavilyResponse = serde_json::from_str(
            r#"{"results": [
                {"url": "https://apnews.com/article/hawley", "title": "Hawley wins", "content": "...", "score": 0.81},
                {"url": "not a url", "title": null, "content": null, "score": null},
                {"url": "https://joshhawley.com", "title": "", "content": null, "score": 3.2}
            ]}"#,
        )
        .unwrap();

        let sources: Vec<Source> = response.results.into_iter().filter_map(to_source).collect();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_type, SourceType::News);
        assert!((sources[0].score - 0.81).abs() < 1e-6);
        assert_eq!(sources[1].title, None);
        assert_eq!(sources[1].score, 1.0);
    }

    #[tokio::test]
    #[ignore = "Requires TAVILY_API_KEY"]
    async fn test_live_search() {
        let searcher = TavilySearcher::from_env().unwrap();
        let query = SearchQuery::new(
            "Missouri U.S. Senate 2024 candidates",
            "mo-senate-2024",
            Issue::General,
            QueryPurpose::TrustedSeed,
        )
        .unwrap();

        let sources = searcher.search(&query).await.unwrap();
        assert!(!sources.is_empty());
    }
}
