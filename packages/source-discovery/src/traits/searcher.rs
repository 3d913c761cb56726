//! Search execution trait.
//!
//! Abstracts over full-text / web search providers (Tavily, SerpAPI, Google
//! Custom Search, etc.). The pipeline only builds [`SearchQuery`] values and
//! merges what comes back; how a query is executed is up to the provider.
//!
//! ```rust,ignore
//! let searcher = TavilySearcher::from_env()?;
//! let batches = searcher.search_many(&queries).await;
//! let merged = searcher.deduplicate(batches.into_iter().flatten().collect());
//! ```

use async_trait::async_trait;
use futures::future::join_all;
use tracing::warn;

use crate::error::Result;
use crate::pipeline::rank;
use crate::types::{query::SearchQuery, source::Source};

/// Search execution for discovery queries.
///
/// # Implementations
///
/// - `TavilySearcher` - Tavily API
/// - `RateLimitedSearcher` - quota wrapper around any searcher
/// - `MockSearcher` - for testing
#[async_trait]
pub trait SearchExecutor: Send + Sync {
    /// Execute one query.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Source>>;

    /// Execute queries concurrently, one task per query.
    ///
    /// Output is positionally aligned with `queries`. A failed query
    /// contributes an empty list and never aborts its siblings.
    async fn search_many(&self, queries: &[SearchQuery]) -> Vec<Vec<Source>> {
        let tasks = queries.iter().map(|query| async move {
            match self.search(query).await {
                Ok(sources) => sources,
                Err(e) => {
                    warn!(
                        query = %query.text,
                        race_id = %query.race_id,
                        error = %e,
                        "Search failed, skipping"
                    );
                    Vec::new()
                }
            }
        });

        join_all(tasks).await
    }

    /// Merge duplicate sources by normalized URL.
    fn deduplicate(&self, sources: Vec<Source>) -> Vec<Source> {
        rank::deduplicate(sources)
    }

    /// Searcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSearcher;
    use crate::types::query::{Issue, QueryPurpose};

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text, "mo-senate-2024", Issue::General, QueryPurpose::TrustedSeed).unwrap()
    }

    #[tokio::test]
    async fn test_search_many_isolates_failures() {
        let searcher = MockSearcher::new()
            .with_urls("first", &["https://a.com", "https://b.com"])
            .fail_query("second")
            .with_urls("third", &["https://c.com"]);

        let results = searcher
            .search_many(&[query("first"), query("second"), query("third")])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].len(), 2);
        assert!(results[1].is_empty());
        assert_eq!(results[2][0].url, "https://c.com");
    }

    #[tokio::test]
    async fn test_default_deduplicate() {
        let searcher = MockSearcher::new();
        let merged = searcher.deduplicate(vec![
            Source::new("https://a.com/").with_score(0.4),
            Source::new("https://www.a.com").with_score(0.6),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].score, 0.6);
    }
}
