//! Configuration types for discovery, site walking and triage.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DiscoveryError, Result};
use crate::types::query::{DateRestrict, Issue, DEFAULT_MAX_RESULTS};

/// Configuration for the discovery pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Results requested per search query.
    ///
    /// Default: 5.
    pub max_results_per_query: usize,

    /// Freshness window for the recency phase.
    ///
    /// Default: `m6`.
    pub recency_window: DateRestrict,

    /// Issues swept in the recency phase, in priority order.
    pub issues: Vec<Issue>,

    /// Cap on candidate × issue queries per candidate.
    ///
    /// Default: 4.
    pub max_issues_per_candidate: usize,

    /// Race-level issue queries (no candidate) in the recency phase.
    ///
    /// Default: 3.
    pub general_issue_queries: usize,

    /// Site walker settings.
    pub site_walk: SiteWalkConfig,

    /// AI triage settings.
    pub triage: TriageConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_results_per_query: DEFAULT_MAX_RESULTS,
            recency_window: DateRestrict::default(),
            issues: vec![
                Issue::Economy,
                Issue::Healthcare,
                Issue::Immigration,
                Issue::Education,
                Issue::Environment,
                Issue::PublicSafety,
                Issue::Taxes,
                Issue::ReproductiveRights,
            ],
            max_issues_per_candidate: 4,
            general_issue_queries: 3,
            site_walk: SiteWalkConfig::default(),
            triage: TriageConfig::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `DISCOVERY_*` environment variables.
    ///
    /// Reads a `.env` file first if one is present. Unset variables keep
    /// their defaults; set but unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(v) = env_parse::<usize>("DISCOVERY_MAX_RESULTS")? {
            config.max_results_per_query = v.max(1);
        }
        if let Some(v) = env_parse::<DateRestrict>("DISCOVERY_RECENCY_WINDOW")? {
            config.recency_window = v;
        }
        if let Some(v) = env_parse::<usize>("DISCOVERY_FETCH_CONCURRENCY")? {
            config.site_walk.max_concurrency = v.max(1);
        }
        if let Some(v) = env_parse::<u64>("DISCOVERY_FETCH_TIMEOUT_SECS")? {
            config.site_walk.fetch_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<usize>("DISCOVERY_MAX_SUBPAGES")? {
            config.site_walk.max_links_per_homepage = v;
        }
        if let Some(v) = env_parse::<bool>("DISCOVERY_TRIAGE_ENABLED")? {
            config.triage.enabled = v;
        }
        if let Some(v) = env_parse::<usize>("DISCOVERY_TRIAGE_BATCH_SIZE")? {
            config.triage.batch_size = v.max(1);
        }
        if let Some(v) = env_parse::<f32>("DISCOVERY_DROP_THRESHOLD")? {
            config.triage.drop_threshold = v;
        }

        Ok(config)
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results_per_query = max.max(1);
        self
    }

    pub fn with_recency_window(mut self, window: DateRestrict) -> Self {
        self.recency_window = window;
        self
    }

    pub fn with_issues(mut self, issues: impl IntoIterator<Item = Issue>) -> Self {
        self.issues = issues.into_iter().collect();
        self
    }

    pub fn with_max_issues_per_candidate(mut self, max: usize) -> Self {
        self.max_issues_per_candidate = max;
        self
    }

    pub fn with_general_issue_queries(mut self, count: usize) -> Self {
        self.general_issue_queries = count;
        self
    }

    pub fn with_site_walk(mut self, site_walk: SiteWalkConfig) -> Self {
        self.site_walk = site_walk;
        self
    }

    pub fn with_triage(mut self, triage: TriageConfig) -> Self {
        self.triage = triage;
        self
    }
}

/// Configuration for walking official homepages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteWalkConfig {
    /// Whether to walk homepages at all.
    pub enabled: bool,

    /// Global cap on concurrent homepage fetches.
    ///
    /// Default: 8.
    pub max_concurrency: usize,

    /// Per-fetch timeout, applied after a concurrency permit is held.
    ///
    /// Default: 12s.
    pub fetch_timeout: Duration,

    /// Subpages kept per homepage, in document order.
    ///
    /// Default: 8.
    pub max_links_per_homepage: usize,
}

impl Default for SiteWalkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrency: 8,
            fetch_timeout: Duration::from_secs(12),
            max_links_per_homepage: 8,
        }
    }
}

impl SiteWalkConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_links(mut self, max: usize) -> Self {
        self.max_links_per_homepage = max;
        self
    }
}

/// Configuration for model-assisted triage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Whether to call the text-generation service at all.
    pub enabled: bool,

    /// Sources per prompt.
    ///
    /// Default: 18.
    pub batch_size: usize,

    /// Blended score below which a source the model does not want is
    /// considered for dropping.
    ///
    /// Default: 0.35.
    pub drop_threshold: f32,

    /// Token budget per triage call.
    pub max_tokens: u32,

    /// Let the generation service repair non-conforming JSON.
    pub allow_repair: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 18,
            drop_threshold: 0.35,
            max_tokens: 2000,
            allow_repair: true,
        }
    }
}

impl TriageConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_drop_threshold(mut self, threshold: f32) -> Self {
        self.drop_threshold = threshold;
        self
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| DiscoveryError::Config(format!("{} is invalid: {}", name, e).into())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.max_results_per_query, 5);
        assert_eq!(config.recency_window.to_string(), "m6");
        assert_eq!(config.site_walk.max_concurrency, 8);
        assert_eq!(config.site_walk.fetch_timeout, Duration::from_secs(12));
        assert_eq!(config.site_walk.max_links_per_homepage, 8);
        assert_eq!(config.triage.batch_size, 18);
        assert!((config.triage.drop_threshold - 0.35).abs() < f32::EPSILON);
        assert!(!config.issues.contains(&Issue::General));
    }

    #[test]
    fn test_builders_enforce_minimums() {
        let config = DiscoveryConfig::new()
            .with_max_results(0)
            .with_site_walk(SiteWalkConfig::default().with_max_concurrency(0))
            .with_triage(TriageConfig::default().with_batch_size(0));

        assert_eq!(config.max_results_per_query, 1);
        assert_eq!(config.site_walk.max_concurrency, 1);
        assert_eq!(config.triage.batch_size, 1);
    }

    #[test]
    fn test_env_parse() {
        std::env::set_var("SOURCE_DISCOVERY_TEST_USIZE", "12");
        std::env::set_var("SOURCE_DISCOVERY_TEST_BAD", "twelve");

        assert_eq!(
            env_parse::<usize>("SOURCE_DISCOVERY_TEST_USIZE").unwrap(),
            Some(12)
        );
        assert!(env_parse::<usize>("SOURCE_DISCOVERY_TEST_BAD").is_err());
        assert_eq!(
            env_parse::<usize>("SOURCE_DISCOVERY_TEST_UNSET").unwrap(),
            None
        );
    }
}
