//! Integration tests for the two-phase discovery pipeline.
//!
//! These tests drive `SourceDiscovery` end to end against mock search,
//! fetch and generation services:
//! 1. Core phase (seeds, reference and homepage queries)
//! 2. Site walk of official homepages
//! 3. Recency phase
//! 4. Merge, triage and final ranking

use serde_json::json;
use source_discovery::{
    testing::{MockFetcher, MockGenerator, MockSearcher},
    DiscoveryConfig, FetchedPage, QueryPurpose, RaceMetadata, SiteWalkConfig, Source,
    SourceDiscovery, TriageConfig,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const BALLOTPEDIA: &str = "https://ballotpedia.org/United_States_Senate_election_in_Missouri,_2024";
const HAWLEY: &str = "https://joshhawley.com";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn missouri() -> RaceMetadata {
    RaceMetadata::new("MO", "senate", "2024").with_candidates(["Josh Hawley", "Lucas Kunce"])
}

/// Search mock for the Missouri scenario: one reference page and one
/// campaign homepage.
fn missouri_searcher() -> MockSearcher {
    MockSearcher::new()
        .with_results_containing(
            "site:ballotpedia.org",
            vec![Source::new(BALLOTPEDIA).with_score(0.7)],
        )
        .with_results_containing(
            "official campaign website",
            vec![Source::new(HAWLEY).with_title("Josh Hawley for Senate")],
        )
}

fn hawley_fetcher() -> MockFetcher {
    MockFetcher::new().with_page(FetchedPage::html(
        HAWLEY,
        r#"<html><body>
            <a href="/issues">Issues</a>
            <a href="/donate">Donate</a>
            <a href="/about">About Josh</a>
        </body></html>"#,
    ))
}

fn position(sources: &[Source], url: &str) -> usize {
    sources
        .iter()
        .position(|s| s.url == url)
        .unwrap_or_else(|| panic!("{} missing from results", url))
}

fn fingerprint(sources: &[Source]) -> Vec<(String, u32, bool, bool, bool)> {
    sources
        .iter()
        .map(|s| {
            (
                s.url.clone(),
                s.score.to_bits(),
                s.is_fresh,
                s.is_official_campaign,
                s.is_campaign_subpage,
            )
        })
        .collect()
}

#[tokio::test]
async fn test_official_site_ranks_first() {
    init_tracing();

    let discovery = SourceDiscovery::new(
        missouri_searcher(),
        hawley_fetcher(),
        MockGenerator::new().fail_all(),
    );

    let sources = discovery
        .discover_all_sources("mo-senate-2024", Some(&missouri()))
        .await;

    let hawley = &sources[position(&sources, HAWLEY)];
    assert!(hawley.is_official_campaign);
    assert!(hawley.score >= 0.98);
    assert!(position(&sources, HAWLEY) < position(&sources, BALLOTPEDIA));

    for source in sources.iter().filter(|s| s.is_official_campaign) {
        assert!(source.score >= 0.98, "{} scored {}", source.url, source.score);
    }
    for pair in sources.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_site_walk_subpages_in_output() {
    init_tracing();

    let discovery = SourceDiscovery::new(
        missouri_searcher(),
        hawley_fetcher(),
        MockGenerator::new().fail_all(),
    );

    let report = discovery
        .discover_with_report("mo-senate-2024", Some(&missouri()))
        .await;

    let subpages: Vec<&Source> = report
        .sources
        .iter()
        .filter(|s| s.is_campaign_subpage)
        .collect();
    let urls: Vec<&str> = subpages.iter().map(|s| s.url.as_str()).collect();

    assert_eq!(urls, vec!["https://joshhawley.com/issues", "https://joshhawley.com/about"]);
    assert_eq!(report.stats.homepages_walked, 1);
    assert_eq!(report.stats.subpages_found, 2);

    let homepage = &report.sources[position(&report.sources, HAWLEY)];
    for subpage in subpages {
        assert!(subpage.score < homepage.score);
        assert!(subpage.score <= 0.94);
    }
}

#[tokio::test]
async fn test_discovery_is_deterministic() {
    init_tracing();

    let discovery = SourceDiscovery::new(
        missouri_searcher(),
        hawley_fetcher(),
        MockGenerator::new().fail_all(),
    );

    let first = discovery
        .discover_all_sources("mo-senate-2024", Some(&missouri()))
        .await;
    let second = discovery
        .discover_all_sources("mo-senate-2024", Some(&missouri()))
        .await;

    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[tokio::test]
async fn test_no_candidates_no_metadata() {
    init_tracing();

    let searcher = MockSearcher::new();
    let discovery = SourceDiscovery::new(searcher.clone(), MockFetcher::new(), MockGenerator::new());

    let sources = discovery.discover_all_sources("mo-senate-2024", None).await;

    // Seeds only: encyclopedia, elections commission, finance tracker
    assert_eq!(sources.len(), 3);
    assert!(sources.iter().all(|s| !s.is_official_campaign));
    assert!(!searcher
        .calls()
        .iter()
        .any(|q| matches!(q.purpose, QueryPurpose::OfficialSite | QueryPurpose::CandidateIssue)));
}

#[tokio::test]
async fn test_unparseable_race_id_runs_evergreen_queries() {
    init_tracing();

    let searcher = MockSearcher::new().with_default_results(vec![Source::new(BALLOTPEDIA)]);
    let discovery = SourceDiscovery::new(searcher.clone(), MockFetcher::new(), MockGenerator::new());

    let sources = discovery
        .discover_all_sources("missouri_senate_2024", None)
        .await;

    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].url, BALLOTPEDIA);

    let calls = searcher.calls();
    assert!(calls
        .iter()
        .any(|q| q.purpose == QueryPurpose::TrustedSeed && q.date_restrict.is_none()));
    assert!(calls
        .iter()
        .any(|q| q.purpose == QueryPurpose::RaceIssue && q.date_restrict.is_some()));
    assert!(calls.iter().all(|q| q.text.contains("Missouri Senate 2024")));
}

#[tokio::test]
async fn test_empty_race_id_yields_empty() {
    init_tracing();

    let searcher = MockSearcher::new();
    let discovery = SourceDiscovery::new(searcher.clone(), MockFetcher::new(), MockGenerator::new());

    assert!(discovery.discover_all_sources("", None).await.is_empty());
    assert!(searcher.calls().is_empty());
}

#[tokio::test]
async fn test_triage_failure_is_fail_open() {
    init_tracing();

    let without_triage = SourceDiscovery::new(
        missouri_searcher(),
        hawley_fetcher(),
        MockGenerator::new(),
    )
    .with_config(DiscoveryConfig::default().with_triage(TriageConfig::disabled()));

    let generator = MockGenerator::new().fail_all();
    let with_failing_triage =
        SourceDiscovery::new(missouri_searcher(), hawley_fetcher(), generator.clone());

    let baseline = without_triage
        .discover_all_sources("mo-senate-2024", Some(&missouri()))
        .await;
    let report = with_failing_triage
        .discover_with_report("mo-senate-2024", Some(&missouri()))
        .await;

    assert!(!generator.calls().is_empty());
    assert_eq!(report.stats.triage_failed_batches, report.stats.triage_batches);
    assert_eq!(report.stats.triage_dropped, 0);
    assert_eq!(fingerprint(&baseline), fingerprint(&report.sources));
}

#[tokio::test]
async fn test_final_rank_restores_official_floor() {
    init_tracing();

    // The merged list is ranked before triage, so the official homepage is
    // item 0 of the first batch.
    let generator = MockGenerator::new().with_response(json!({
        "items": [{
            "i": 0,
            "keep": true,
            "priority": 0.0,
            "category": "blog",
            "official": false,
            "notes": null
        }]
    }));
    let discovery = SourceDiscovery::new(missouri_searcher(), hawley_fetcher(), generator);

    let report = discovery
        .discover_with_report("mo-senate-2024", Some(&missouri()))
        .await;

    assert_eq!(report.stats.triage_batches, 1);
    assert_eq!(report.sources[0].url, HAWLEY);
    assert_eq!(report.sources[0].score, 0.99);
}

#[tokio::test]
async fn test_stats_count_queries() {
    init_tracing();

    let discovery = SourceDiscovery::new(
        missouri_searcher().fail_query("Missouri U.S. Senate race 2024 news"),
        hawley_fetcher(),
        MockGenerator::new().fail_all(),
    );

    let report = discovery
        .discover_with_report("mo-senate-2024", Some(&missouri()))
        .await;

    // 4 reference queries + 3 homepage queries per candidate
    assert_eq!(report.stats.core.queries, 10);
    // 4 issues per candidate + 1 general + 3 issue-only race queries
    assert_eq!(report.stats.recency.queries, 12);
    assert_eq!(report.stats.recency.failed_queries, 1);
    assert_eq!(report.stats.seeds, 3);
    assert_eq!(report.stats.final_count, report.sources.len());
}

#[tokio::test]
async fn test_site_walk_concurrency_bound() {
    init_tracing();

    let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(25));
    let mut homepages = Vec::new();
    for i in 0..10 {
        let url = format!("https://candidate{}forsenate.com", i);
        fetcher = fetcher.with_page(FetchedPage::html(
            url.as_str(),
            r#"<a href="/platform">Platform</a>"#,
        ));
        homepages.push(Source::new(url).with_title(format!("Candidate {} for Senate", i)));
    }

    let searcher = MockSearcher::new().with_results_containing("official campaign website", homepages);
    let config = DiscoveryConfig::default()
        .with_site_walk(SiteWalkConfig::default().with_max_concurrency(2))
        .with_triage(TriageConfig::disabled());
    let discovery =
        SourceDiscovery::new(searcher, fetcher.clone(), MockGenerator::new()).with_config(config);

    let report = discovery
        .discover_with_report("mo-senate-2024", Some(&missouri()))
        .await;

    assert_eq!(fetcher.calls().len(), 10);
    assert!(fetcher.max_in_flight() <= 2);
    assert_eq!(report.stats.subpages_found, 10);
}
