//! Query templates for the three discovery query families.
//!
//! Every builder is pure. Missing metadata renders as empty text rather
//! than an error, so thin metadata yields vaguer queries instead of none.

use crate::types::query::{DateRestrict, Issue, QueryPurpose, SearchQuery};
use crate::types::race::RaceMetadata;

/// Reference-site lookups for the race. Always evergreen.
pub fn trusted_seed_queries(
    race_id: &str,
    race: &RaceMetadata,
    max_results: usize,
) -> Vec<SearchQuery> {
    let state = race.state_name();
    let office = race.office_label();
    let year = &race.year;
    let district = race
        .district
        .as_deref()
        .map(|d| format!("district {}", d))
        .unwrap_or_default();

    let mut templates = vec![
        format!("site:ballotpedia.org {} {} election {} {}", state, office, year, district),
        format!("{} {} {} candidates {}", state, office, year, district),
        format!("site:vote411.org {} {} {}", state, office, year),
    ];

    if race.race_type.is_federal() {
        templates.push(format!(
            "site:fec.gov {} {} {} candidates",
            race.state, office, year
        ));
    } else {
        templates.push(format!(
            "{} secretary of state {} {} candidate list",
            state, year, office
        ));
    }

    templates
        .into_iter()
        .filter_map(|text| {
            SearchQuery::new(text, race_id, Issue::General, QueryPurpose::TrustedSeed).ok()
        })
        .map(|q| q.with_max_results(max_results))
        .collect()
}

/// Homepage discovery queries, per candidate. Always evergreen.
pub fn official_site_queries(
    race_id: &str,
    race: &RaceMetadata,
    candidates: &[String],
    max_results: usize,
) -> Vec<SearchQuery> {
    let state = race.state_name();
    let office = race.office_label();

    candidate_names(candidates)
        .flat_map(|name| {
            [
                format!("\"{}\" official campaign website {} {}", name, office, state),
                format!("\"{}\" for {} {}", name, office, race.year),
                format!(
                    "\"{}\" {} site:x.com OR site:facebook.com OR site:instagram.com",
                    name, state
                ),
            ]
            .into_iter()
            .filter_map(move |text| {
                SearchQuery::new(text, race_id, Issue::General, QueryPurpose::OfficialSite)
                    .ok()
                    .map(|q| q.for_candidate(name))
            })
        })
        .map(|q| q.with_max_results(max_results))
        .collect()
}

/// Candidate × issue recency sweep.
///
/// At most `max_per_candidate` issues per candidate, taken in order;
/// `General` is skipped. Every query carries `window`.
pub fn candidate_issue_queries(
    race_id: &str,
    race: &RaceMetadata,
    candidates: &[String],
    issues: &[Issue],
    max_per_candidate: usize,
    window: DateRestrict,
    max_results: usize,
) -> Vec<SearchQuery> {
    candidate_names(candidates)
        .flat_map(|name| {
            issues
                .iter()
                .filter(|issue| !issue.is_general())
                .take(max_per_candidate)
                .filter_map(move |issue| {
                    let text = format!("\"{}\" {} {}", name, issue.search_terms(), race.year);
                    SearchQuery::new(text, race_id, *issue, QueryPurpose::CandidateIssue)
                        .ok()
                        .map(|q| q.for_candidate(name))
                })
        })
        .map(|q| q.with_date_restrict(window).with_max_results(max_results))
        .collect()
}

/// Race-level recency queries: one general race query plus `count`
/// issue-only queries.
pub fn race_issue_queries(
    race_id: &str,
    race: &RaceMetadata,
    issues: &[Issue],
    count: usize,
    window: DateRestrict,
    max_results: usize,
) -> Vec<SearchQuery> {
    let state = race.state_name();
    let office = race.office_label();

    let general = std::iter::once((
        Issue::General,
        format!("{} {} race {} news", state, office, race.year),
    ));
    let by_issue = issues
        .iter()
        .filter(|issue| !issue.is_general())
        .take(count)
        .map(|issue| {
            (
                *issue,
                format!("{} {} {} {}", state, office, race.year, issue.search_terms()),
            )
        });

    general
        .chain(by_issue)
        .filter_map(|(issue, text)| {
            SearchQuery::new(text, race_id, issue, QueryPurpose::RaceIssue).ok()
        })
        .map(|q| q.with_date_restrict(window).with_max_results(max_results))
        .collect()
}

fn candidate_names(candidates: &[String]) -> impl Iterator<Item = &str> {
    candidates
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missouri() -> RaceMetadata {
        RaceMetadata::from_race_id("mo-senate-2024").unwrap()
    }

    fn candidates() -> Vec<String> {
        vec!["Josh Hawley".to_string(), "Lucas Kunce".to_string()]
    }

    #[test]
    fn test_trusted_seed_queries_are_evergreen() {
        let queries = trusted_seed_queries("mo-senate-2024", &missouri(), 5);

        assert_eq!(queries.len(), 4);
        assert!(queries.iter().all(|q| q.is_evergreen()));
        assert!(queries.iter().all(|q| q.purpose == QueryPurpose::TrustedSeed));
        assert!(queries[0].text.starts_with("site:ballotpedia.org Missouri U.S. Senate"));
        assert!(queries.iter().any(|q| q.text.starts_with("site:fec.gov MO")));
    }

    #[test]
    fn test_trusted_seed_queries_for_state_race() {
        let race = RaceMetadata::from_race_id("ga-governor-2026").unwrap();
        let queries = trusted_seed_queries("ga-governor-2026", &race, 5);
        assert!(queries.iter().any(|q| q.text.contains("secretary of state")));
        assert!(!queries.iter().any(|q| q.text.contains("fec.gov")));
    }

    #[test]
    fn test_trusted_seed_queries_with_empty_metadata() {
        let race = RaceMetadata::default();
        let queries = trusted_seed_queries("", &race, 5);
        // Templates still render with their fixed keywords
        assert!(!queries.is_empty());
        assert!(queries.iter().all(|q| !q.text.contains("  ")));
    }

    #[test]
    fn test_official_site_queries() {
        let queries = official_site_queries("mo-senate-2024", &missouri(), &candidates(), 5);

        assert_eq!(queries.len(), 6);
        assert!(queries.iter().all(|q| q.is_evergreen()));
        assert!(queries.iter().any(|q| q.text.contains("site:x.com")));
        assert_eq!(queries[0].candidate.as_deref(), Some("Josh Hawley"));
        assert_eq!(queries[5].candidate.as_deref(), Some("Lucas Kunce"));
    }

    #[test]
    fn test_no_candidates_yields_no_queries() {
        let race = missouri();
        assert!(official_site_queries("mo-senate-2024", &race, &[], 5).is_empty());
        assert!(official_site_queries("mo-senate-2024", &race, &["  ".to_string()], 5).is_empty());
        assert!(candidate_issue_queries(
            "mo-senate-2024",
            &race,
            &[],
            &Issue::ALL,
            3,
            DateRestrict::default(),
            5
        )
        .is_empty());
    }

    #[test]
    fn test_candidate_issue_queries_capped_and_dated() {
        let issues = [Issue::General, Issue::Economy, Issue::Healthcare, Issue::Taxes];
        let window = DateRestrict::parse("m3").unwrap();
        let queries = candidate_issue_queries(
            "mo-senate-2024",
            &missouri(),
            &candidates(),
            &issues,
            2,
            window,
            5,
        );

        assert_eq!(queries.len(), 4);
        assert!(queries.iter().all(|q| q.date_restrict == Some(window)));
        assert!(queries.iter().all(|q| !q.issue.is_general()));
        assert_eq!(queries[0].issue, Issue::Economy);
        assert_eq!(queries[1].issue, Issue::Healthcare);
        assert!(queries[0].text.contains("\"Josh Hawley\""));
    }

    #[test]
    fn test_race_issue_queries() {
        let queries = race_issue_queries(
            "mo-senate-2024",
            &missouri(),
            &[Issue::Economy, Issue::Immigration, Issue::Energy],
            2,
            DateRestrict::default(),
            5,
        );

        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].issue, Issue::General);
        assert_eq!(queries[1].issue, Issue::Economy);
        assert!(queries.iter().all(|q| q.candidate.is_none()));
        assert!(queries.iter().all(|q| !q.is_evergreen()));
    }
}
