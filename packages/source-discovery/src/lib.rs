//! Source Discovery for Electoral Races
//!
//! Given a race identifier and optional race metadata, produces a ranked,
//! deduplicated list of information sources: official campaign sites,
//! election-data references, government pages, news and social profiles.
//!
//! # Design Philosophy
//!
//! - Best effort, never fatal: every search, fetch and model call fails on
//!   its own and only shortens the result list
//! - Heuristics first, model second: triage refines heuristic scores and
//!   falls back to them whenever the model misbehaves
//! - Official campaign homepages always rank first
//! - Library handles mechanics, collaborators (search, fetch, generation)
//!   are traits
//!
//! # Usage
//!
//! ```rust,ignore
//! use source_discovery::{HttpFetcher, RaceMetadata, SourceDiscovery, TavilySearcher};
//! use source_discovery::ai::OpenAIGenerator;
//!
//! let discovery = SourceDiscovery::new(
//!     TavilySearcher::from_env()?,
//!     HttpFetcher::new(),
//!     OpenAIGenerator::from_env()?,
//! );
//!
//! let race = RaceMetadata::new("MO", "senate", "2024")
//!     .with_candidates(["Josh Hawley", "Lucas Kunce"]);
//! let sources = discovery.discover_all_sources("mo-senate-2024", Some(&race)).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator boundaries (search, fetch, generation, metadata)
//! - [`types`] - Sources, queries, race metadata and configuration
//! - [`pipeline`] - Query building, seeds, site walking, ranking, triage and orchestration
//! - [`searchers`] - Search executors (Tavily, rate limiting)
//! - [`fetchers`] - HTML fetchers
//! - [`ai`] - Strict response schemas and the OpenAI generator (feature `openai`)
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod searchers;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DiscoveryError, FetchError, FetchResult, Result};
pub use traits::{
    fetcher::{FetchedPage, HtmlFetcher},
    generator::{GenerationRequest, TaskType, TextGenerator},
    metadata::RaceMetadataProvider,
    searcher::SearchExecutor,
};
pub use types::{
    config::{DiscoveryConfig, SiteWalkConfig, TriageConfig},
    query::{DateRestrict, DateUnit, Issue, QueryPurpose, SearchQuery},
    race::{RaceMetadata, RaceType},
    source::{normalize_url, Source, SourceType},
};

pub use pipeline::{DiscoveryReport, DiscoveryStats, PhaseStats, SourceDiscovery};

pub use fetchers::HttpFetcher;
pub use searchers::{RateLimitedSearcher, TavilySearcher};

#[cfg(feature = "openai")]
pub use ai::OpenAIGenerator;

pub use testing::{MockFetcher, MockGenerator, MockMetadataProvider, MockSearcher};
