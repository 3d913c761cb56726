//! Discovery orchestrator - the two-phase source discovery pipeline.
//!
//! ```text
//! Init
//!  ├─ CorePhase ──────► SiteWalkExpansion ─┐
//!  └─ RecencyPhase ────────────────────────┤   (run concurrently)
//!                                          ▼
//!                                Merge → Triage → FinalRank → Done
//! ```
//!
//! Phases are never retried. Every search, fetch and triage batch inside a
//! phase fails independently, so environmental trouble only shortens the
//! result list.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::pipeline::heuristics::{
    classify_source_type, looks_official_campaign, mentions_candidate, FINAL_OFFICIAL_FLOOR,
    OFFICIAL_CAMPAIGN_FLOOR,
};
use crate::pipeline::queries::{
    candidate_issue_queries, official_site_queries, race_issue_queries, trusted_seed_queries,
};
use crate::pipeline::rank::{dedupe_and_rank, deduplicate, pin_official, rank};
use crate::pipeline::seeds::seed_sources;
use crate::pipeline::triage::triage_sources;
use crate::pipeline::walker::walk_homepages;
use crate::traits::{
    fetcher::HtmlFetcher, generator::TextGenerator, metadata::RaceMetadataProvider,
    searcher::SearchExecutor,
};
use crate::types::config::DiscoveryConfig;
use crate::types::query::{QueryPurpose, SearchQuery};
use crate::types::race::{resolve_race, RaceMetadata};
use crate::types::source::{Source, SourceType};

/// Floor for results of reference-site queries.
pub const TRUSTED_SEED_FLOOR: f32 = 0.7;

/// Floor for results of homepage discovery queries.
pub const OFFICIAL_QUERY_FLOOR: f32 = 0.55;

/// Floor for any recency-phase result.
pub const FRESH_FLOOR: f32 = 0.5;

/// Floor for recency results of an issue-specific query.
pub const ISSUE_FLOOR: f32 = 0.55;

/// Floor for recency results that mention the candidate queried.
pub const CANDIDATE_MENTION_FLOOR: f32 = 0.6;

/// Counters for one search phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseStats {
    pub queries: usize,
    pub failed_queries: usize,
    pub raw_results: usize,
    /// Distinct sources after the phase's own dedup.
    pub sources: usize,
}

/// What happened during one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStats {
    pub seeds: usize,
    pub core: PhaseStats,
    pub recency: PhaseStats,
    pub homepages_walked: usize,
    pub subpages_found: usize,
    pub merged: usize,
    pub triage_batches: usize,
    pub triage_failed_batches: usize,
    pub triage_dropped: usize,
    pub final_count: usize,
}

/// Ranked sources plus run statistics.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub sources: Vec<Source>,
    pub stats: DiscoveryStats,
}

/// Two-phase source discovery over pluggable search, fetch and
/// text-generation services.
///
/// # Example
///
/// ```rust,ignore
/// let discovery = SourceDiscovery::new(searcher, fetcher, generator)
///     .with_config(DiscoveryConfig::from_env()?);
///
/// let sources = discovery
///     .discover_all_sources("mo-senate-2024", Some(&metadata))
///     .await;
/// ```
pub struct SourceDiscovery<S, F, G> {
    searcher: S,
    fetcher: F,
    generator: G,
    config: DiscoveryConfig,
}

impl<S, F, G> SourceDiscovery<S, F, G>
where
    S: SearchExecutor,
    F: HtmlFetcher,
    G: TextGenerator,
{
    pub fn new(searcher: S, fetcher: F, generator: G) -> Self {
        Self {
            searcher,
            fetcher,
            generator,
            config: DiscoveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover, deduplicate and rank sources for a race.
    ///
    /// Never fails for environmental reasons. A race id that cannot be
    /// parsed, with no metadata to fall back on, gets no seeds; its text is
    /// still searched. Only a blank race id with no metadata yields an
    /// empty list.
    pub async fn discover_all_sources(
        &self,
        race_id: &str,
        metadata: Option<&RaceMetadata>,
    ) -> Vec<Source> {
        self.discover_with_report(race_id, metadata).await.sources
    }

    /// Ask `provider` for race metadata, then discover.
    ///
    /// A provider error is treated the same as absent metadata.
    pub async fn discover_for_race<P>(&self, race_id: &str, provider: &P) -> Vec<Source>
    where
        P: RaceMetadataProvider + ?Sized,
    {
        let metadata = match provider.race_metadata(race_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(race_id = %race_id, error = %e, "Metadata lookup failed, using race id");
                None
            }
        };

        self.discover_all_sources(race_id, metadata.as_ref()).await
    }

    /// Like [`discover_all_sources`](Self::discover_all_sources), plus
    /// per-phase statistics.
    pub async fn discover_with_report(
        &self,
        race_id: &str,
        metadata: Option<&RaceMetadata>,
    ) -> DiscoveryReport {
        if race_id.trim().is_empty() && metadata.is_none() {
            warn!("Empty race id and no metadata, nothing to discover");
            return DiscoveryReport::default();
        }

        let seeds = seed_sources(race_id, metadata);
        let (race, resolved) = match resolve_race(race_id, metadata) {
            Some(race) => (race, true),
            None => (RaceMetadata::from_free_text(race_id), false),
        };

        info!(
            race_id = %race_id,
            resolved,
            state = %race.state,
            office = %race.office_type,
            year = %race.year,
            candidates = race.candidates.len(),
            "Starting source discovery"
        );

        let core_then_walk = async {
            let (core, seeds, core_stats) = self.core_phase(race_id, &race, seeds).await;
            let (walked, subpages) = self.site_walk(&core).await;
            (core, seeds, core_stats, walked, subpages)
        };
        let recency = self.recency_phase(race_id, &race);

        let ((core, seeds, core_stats, homepages_walked, subpages), (recent, recency_stats)) =
            tokio::join!(core_then_walk, recency);

        let mut stats = DiscoveryStats {
            seeds,
            core: core_stats,
            recency: recency_stats,
            homepages_walked,
            subpages_found: subpages.len(),
            ..Default::default()
        };

        let merged = dedupe_and_rank(core.into_iter().chain(subpages).chain(recent).collect());
        stats.merged = merged.len();

        let triaged =
            triage_sources(&self.generator, merged, resolved.then_some(&race), &self.config.triage)
                .await;
        stats.triage_batches = triaged.batches;
        stats.triage_failed_batches = triaged.failed_batches;
        stats.triage_dropped = triaged.dropped;

        let mut sources = deduplicate(triaged.sources);
        pin_official(&mut sources, FINAL_OFFICIAL_FLOOR);
        let sources = rank(sources);
        stats.final_count = sources.len();

        info!(
            race_id = %race_id,
            seeds = stats.seeds,
            core_queries = stats.core.queries,
            core_failed = stats.core.failed_queries,
            recency_queries = stats.recency.queries,
            recency_failed = stats.recency.failed_queries,
            subpages = stats.subpages_found,
            merged = stats.merged,
            triage_dropped = stats.triage_dropped,
            final_count = stats.final_count,
            "Source discovery completed"
        );

        DiscoveryReport { sources, stats }
    }

    /// Seeds plus evergreen reference and homepage searches.
    async fn core_phase(
        &self,
        race_id: &str,
        race: &RaceMetadata,
        seeds: Vec<Source>,
    ) -> (Vec<Source>, usize, PhaseStats) {
        let max_results = self.config.max_results_per_query;
        let seed_count = seeds.len();

        let mut queries = trusted_seed_queries(race_id, race, max_results);
        queries.extend(official_site_queries(
            race_id,
            race,
            &race.candidates,
            max_results,
        ));

        let (batches, mut stats) = self.run_queries("core", &queries).await;

        let mut sources = seeds;
        for (query, batch) in queries.iter().zip(batches) {
            let floor = match query.purpose {
                QueryPurpose::TrustedSeed => TRUSTED_SEED_FLOOR,
                _ => OFFICIAL_QUERY_FLOOR,
            };
            sources.extend(batch.into_iter().map(|mut source| {
                source.raise_score_to(floor);
                source
            }));
        }

        for source in sources.iter_mut() {
            fill_source_type(source);
            if looks_official_campaign(&source.url, source.title.as_deref()) {
                debug!(url = %source.url, "Official campaign site detected");
                source.mark_official(OFFICIAL_CAMPAIGN_FLOOR);
            }
        }

        let sources = dedupe_and_rank(sources);
        stats.sources = sources.len();

        info!(
            race_id = %race_id,
            seeds = seed_count,
            queries = stats.queries,
            failed = stats.failed_queries,
            sources = stats.sources,
            official = sources.iter().filter(|s| s.is_official_campaign).count(),
            "Core phase completed"
        );

        (sources, seed_count, stats)
    }

    /// Walk the official homepages found by the core phase.
    ///
    /// Returns the number of homepages walked and the subpages found.
    async fn site_walk(&self, core: &[Source]) -> (usize, Vec<Source>) {
        if !self.config.site_walk.enabled {
            return (0, Vec::new());
        }

        let homepages: Vec<Source> = core
            .iter()
            .filter(|s| s.is_official_campaign)
            .cloned()
            .collect();

        let subpages = walk_homepages(&self.fetcher, &homepages, &self.config.site_walk).await;
        (homepages.len(), subpages)
    }

    /// Date-bounded candidate × issue and race-level issue searches.
    async fn recency_phase(&self, race_id: &str, race: &RaceMetadata) -> (Vec<Source>, PhaseStats) {
        let config = &self.config;

        let mut queries = candidate_issue_queries(
            race_id,
            race,
            &race.candidates,
            &config.issues,
            config.max_issues_per_candidate,
            config.recency_window,
            config.max_results_per_query,
        );
        queries.extend(race_issue_queries(
            race_id,
            race,
            &config.issues,
            config.general_issue_queries,
            config.recency_window,
            config.max_results_per_query,
        ));

        let (batches, mut stats) = self.run_queries("recency", &queries).await;

        let mut sources = Vec::with_capacity(stats.raw_results);
        for (query, batch) in queries.iter().zip(batches) {
            for mut source in batch {
                nudge_fresh(&mut source, query);
                fill_source_type(&mut source);
                sources.push(source);
            }
        }

        let sources = dedupe_and_rank(sources);
        stats.sources = sources.len();

        info!(
            race_id = %race_id,
            window = %config.recency_window,
            queries = stats.queries,
            failed = stats.failed_queries,
            sources = stats.sources,
            "Recency phase completed"
        );

        (sources, stats)
    }

    /// Run queries concurrently. Output is aligned with `queries`; a failed
    /// query yields an empty batch.
    async fn run_queries(
        &self,
        phase: &str,
        queries: &[SearchQuery],
    ) -> (Vec<Vec<Source>>, PhaseStats) {
        let mut stats = PhaseStats {
            queries: queries.len(),
            ..Default::default()
        };

        let results = join_all(queries.iter().map(|q| self.searcher.search(q))).await;

        let batches = results
            .into_iter()
            .zip(queries)
            .map(|(result, query)| match result {
                Ok(sources) => {
                    stats.raw_results += sources.len();
                    sources
                }
                Err(e) => {
                    warn!(
                        phase,
                        searcher = self.searcher.name(),
                        query = %query.text,
                        error = %e,
                        "Search failed, skipping"
                    );
                    stats.failed_queries += 1;
                    Vec::new()
                }
            })
            .collect();

        (batches, stats)
    }
}

fn fill_source_type(source: &mut Source) {
    if source.source_type == SourceType::Website {
        source.source_type = classify_source_type(&source.url);
    }
}

fn nudge_fresh(source: &mut Source, query: &SearchQuery) {
    source.is_fresh = true;
    source.raise_score_to(FRESH_FLOOR);

    if !query.issue.is_general() {
        source.raise_score_to(ISSUE_FLOOR);
    }
    if let Some(candidate) = query.candidate.as_deref() {
        if mentions_candidate(source, candidate) {
            source.raise_score_to(CANDIDATE_MENTION_FLOOR);
        }
    }
}
