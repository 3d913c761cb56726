//! Testing utilities including mock implementations.
//!
//! These let applications exercise the discovery pipeline without making
//! real search, network or model calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{DiscoveryError, FetchError, FetchResult, Result};
use crate::traits::{
    fetcher::{FetchedPage, HtmlFetcher},
    generator::{GenerationRequest, TextGenerator},
    metadata::RaceMetadataProvider,
    searcher::SearchExecutor,
};
use crate::types::{query::SearchQuery, race::RaceMetadata, source::Source};

fn mock_io_error(message: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        message.to_string(),
    ))
}

/// A mock search executor.
///
/// Lookup order for a query: failing queries, exact text matches, then the
/// first registered fragment contained in the query text, then the default
/// results.
#[derive(Default, Clone)]
pub struct MockSearcher {
    /// Results by exact query text
    results: Arc<RwLock<HashMap<String, Vec<Source>>>>,

    /// Results for any query containing a fragment, in registration order
    fragments: Arc<RwLock<Vec<(String, Vec<Source>)>>>,

    /// Results for queries nothing else matched
    default_results: Arc<RwLock<Vec<Source>>>,

    /// Query texts that should fail
    fail_queries: Arc<RwLock<Vec<String>>>,

    fail_all: bool,

    /// Call tracking
    calls: Arc<RwLock<Vec<SearchQuery>>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `sources` for the query with exactly this text.
    pub fn with_results(self, query: impl Into<String>, sources: Vec<Source>) -> Self {
        self.results.write().unwrap().insert(query.into(), sources);
        self
    }

    /// Return zero-score sources for these URLs for the query with exactly
    /// this text.
    pub fn with_urls(self, query: impl Into<String>, urls: &[&str]) -> Self {
        let sources = urls.iter().map(|url| Source::new(*url)).collect();
        self.with_results(query, sources)
    }

    /// Return `sources` for any query whose text contains `fragment`.
    pub fn with_results_containing(
        self,
        fragment: impl Into<String>,
        sources: Vec<Source>,
    ) -> Self {
        self.fragments
            .write()
            .unwrap()
            .push((fragment.into(), sources));
        self
    }

    /// Return `sources` for queries nothing else matched.
    pub fn with_default_results(self, sources: Vec<Source>) -> Self {
        *self.default_results.write().unwrap() = sources;
        self
    }

    /// Fail the query with exactly this text.
    pub fn fail_query(self, query: impl Into<String>) -> Self {
        self.fail_queries.write().unwrap().push(query.into());
        self
    }

    /// Fail every query.
    pub fn fail_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Get all queries executed against this mock.
    pub fn calls(&self) -> Vec<SearchQuery> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SearchExecutor for MockSearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Source>> {
        self.calls.write().unwrap().push(query.clone());

        if self.fail_all || self.fail_queries.read().unwrap().contains(&query.text) {
            return Err(DiscoveryError::Search(mock_io_error("Mock search refused")));
        }

        if let Some(sources) = self.results.read().unwrap().get(&query.text) {
            return Ok(sources.clone());
        }

        let by_fragment = self
            .fragments
            .read()
            .unwrap()
            .iter()
            .find(|(fragment, _)| query.text.contains(fragment.as_str()))
            .map(|(_, sources)| sources.clone());
        if let Some(sources) = by_fragment {
            return Ok(sources);
        }

        Ok(self.default_results.read().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock HTML fetcher.
///
/// Unknown URLs answer with a 404 error. Tracks the peak number of
/// concurrent fetches for concurrency assertions.
#[derive(Default, Clone)]
pub struct MockFetcher {
    /// Predefined pages by URL
    pages: Arc<RwLock<HashMap<String, FetchedPage>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Artificial latency per fetch
    delay: Option<Duration>,

    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,

    /// Call tracking
    calls: Arc<RwLock<Vec<String>>>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined page, keyed by its URL.
    pub fn with_page(self, page: FetchedPage) -> Self {
        self.pages.write().unwrap().insert(page.url.clone(), page);
        self
    }

    /// Add a 200 `text/html` page.
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page(FetchedPage::html(url, html))
    }

    /// Mark a URL as failing.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all fetched URLs.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Peak number of fetches observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HtmlFetcher for MockFetcher {
    async fn get_html(&self, url: &str, _timeout: Duration) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_urls.read().unwrap().iter().any(|u| u == url) {
            return Err(FetchError::Http(mock_io_error("Mock connection refused")));
        }

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock text generator replaying scripted responses in call order.
///
/// Once the script runs out every call fails, which exercises the
/// fail-open path.
#[derive(Default, Clone)]
pub struct MockGenerator {
    /// `None` entries are scripted failures
    script: Arc<RwLock<VecDeque<Option<serde_json::Value>>>>,

    fail_all: bool,

    /// Call tracking
    calls: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_response(self, response: serde_json::Value) -> Self {
        self.script.write().unwrap().push_back(Some(response));
        self
    }

    /// Queue a failed call.
    pub fn with_failure(self) -> Self {
        self.script.write().unwrap().push_back(None);
        self
    }

    /// Fail every call.
    pub fn fail_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Get all requests made to this mock.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate_structured(&self, request: &GenerationRequest) -> Result<serde_json::Value> {
        self.calls.write().unwrap().push(request.clone());

        if self.fail_all {
            return Err(DiscoveryError::Generation(mock_io_error(
                "Mock generation unavailable",
            )));
        }

        match self.script.write().unwrap().pop_front() {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(DiscoveryError::Generation(mock_io_error(
                "Mock generation failed",
            ))),
            None => Err(DiscoveryError::Generation(mock_io_error(
                "Mock generation script exhausted",
            ))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock race metadata provider.
#[derive(Default, Clone)]
pub struct MockMetadataProvider {
    races: Arc<RwLock<HashMap<String, RaceMetadata>>>,
    fail: bool,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for a race id.
    pub fn with_race(self, race_id: impl Into<String>, metadata: RaceMetadata) -> Self {
        self.races.write().unwrap().insert(race_id.into(), metadata);
        self
    }

    /// Fail every lookup.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl RaceMetadataProvider for MockMetadataProvider {
    async fn race_metadata(&self, race_id: &str) -> Result<Option<RaceMetadata>> {
        if self.fail {
            return Err(DiscoveryError::Generation(mock_io_error(
                "Mock metadata store unavailable",
            )));
        }
        Ok(self.races.read().unwrap().get(race_id).cloned())
    }
}
