//! Discovery pipeline.
//!
//! The pipeline composes:
//! - Seed sources and query templates (core / evergreen)
//! - Site walking of official campaign homepages
//! - Date-bounded recency queries
//! - Dedup / rank across phases
//! - Batched AI triage with heuristic fallback

pub mod discovery;
pub mod heuristics;
pub mod links;
pub mod prompts;
pub mod queries;
pub mod rank;
pub mod seeds;
pub mod triage;
pub mod walker;

pub use discovery::{DiscoveryReport, DiscoveryStats, PhaseStats, SourceDiscovery};
pub use heuristics::{
    classify_source_type, looks_official_campaign, mentions_candidate, registrable_domain,
    FINAL_OFFICIAL_FLOOR, OFFICIAL_CAMPAIGN_FLOOR,
};
pub use links::{extract_links, ExtractedLink};
pub use queries::{
    candidate_issue_queries, official_site_queries, race_issue_queries, trusted_seed_queries,
};
pub use rank::{dedupe_and_rank, deduplicate, pin_official, rank};
pub use seeds::{seed_sources, seeds_for_race};
pub use triage::{triage_sources, TriageCategory, TriageItem, TriageOutcome, TriageResponse};
pub use walker::{is_walkable_path, subpages_from_html, walk_homepages};
