//! Seed sources - well-known, deterministic election-data URLs for a race.

use tracing::{debug, warn};

use crate::pipeline::heuristics::classify_source_type;
use crate::types::race::{resolve_race, RaceMetadata};
use crate::types::source::Source;

/// Baseline score for the election-encyclopedia page.
pub const ENCYCLOPEDIA_SCORE: f32 = 0.7;

/// Baseline score for the national elections-commission page.
pub const ELECTIONS_COMMISSION_SCORE: f32 = 0.8;

/// Baseline score for the campaign-finance tracker.
pub const FINANCE_TRACKER_SCORE: f32 = 0.65;

/// Baseline score for the state election authority.
pub const STATE_AUTHORITY_SCORE: f32 = 0.75;

/// State election authorities that do not live at `sos.<st>.gov`.
const STATE_AUTHORITIES: &[(&str, &str)] = &[
    ("CA", "https://www.sos.ca.gov/elections"),
    ("FL", "https://dos.fl.gov/elections/"),
    ("GA", "https://sos.ga.gov/elections-division-georgia-secretary-states-office"),
    ("MN", "https://www.sos.state.mn.us/elections-voting/"),
    ("NY", "https://www.elections.ny.gov/"),
    ("PA", "https://www.vote.pa.gov/"),
    ("TX", "https://www.sos.state.tx.us/elections/"),
    ("WI", "https://elections.wi.gov/"),
];

/// Build seed sources for a race.
///
/// Uses `metadata` if supplied, else parses `race_id`. If neither yields
/// race details the result is empty; this is logged, not raised.
pub fn seed_sources(race_id: &str, metadata: Option<&RaceMetadata>) -> Vec<Source> {
    match resolve_race(race_id, metadata) {
        Some(race) => seeds_for_race(&race),
        None => {
            warn!(race_id = %race_id, "Race id unparseable and no metadata, no seed sources");
            Vec::new()
        }
    }
}

/// Build seed sources from resolved race details.
pub fn seeds_for_race(race: &RaceMetadata) -> Vec<Source> {
    let mut seeds = Vec::new();

    if let Some(url) = encyclopedia_url(race) {
        seeds.push(
            seed(url, ENCYCLOPEDIA_SCORE)
                .with_title(format!(
                    "Ballotpedia: {} {} election {}",
                    race.state_name(),
                    race.office_label(),
                    race.year
                ))
                .with_description("Election encyclopedia race overview"),
        );
    }

    if race.race_type.is_federal() {
        if let Some(url) = elections_commission_url(race) {
            seeds.push(
                seed(url, ELECTIONS_COMMISSION_SCORE)
                    .with_title("FEC election data")
                    .with_description("Federal Election Commission candidate and filing data"),
            );
        }
        if let Some(url) = finance_tracker_url(race) {
            seeds.push(
                seed(url, FINANCE_TRACKER_SCORE)
                    .with_title("OpenSecrets race summary")
                    .with_description("Campaign finance totals for the race"),
            );
        }
    } else if let Some(url) = state_authority_url(&race.state) {
        seeds.push(
            seed(url, STATE_AUTHORITY_SCORE)
                .with_title(format!("{} election authority", race.state_name()))
                .with_description("State election authority"),
        );
    }

    debug!(
        state = %race.state,
        office = %race.office_type,
        year = %race.year,
        count = seeds.len(),
        "Built seed sources"
    );

    seeds
}

fn seed(url: String, score: f32) -> Source {
    let source_type = classify_source_type(&url);
    Source::new(url).with_type(source_type).with_score(score)
}

fn encyclopedia_url(race: &RaceMetadata) -> Option<String> {
    let office = race.office_type.to_ascii_lowercase();
    let year = &race.year;

    if race.race_type.is_federal() && office.starts_with("president") {
        return Some(format!("https://ballotpedia.org/Presidential_election,_{}", year));
    }
    if race.state.is_empty() {
        return None;
    }

    let state = race.state_name().replace(' ', "_");
    let page = if race.race_type.is_federal() && office.contains("senate") {
        format!("United_States_Senate_election_in_{},_{}", state, year)
    } else if race.race_type.is_federal() {
        match race.district_number() {
            Some(n) => format!(
                "{}%27s_{}_Congressional_District_election,_{}",
                state,
                ordinal(n),
                year
            ),
            None => format!(
                "United_States_House_of_Representatives_elections_in_{},_{}",
                state, year
            ),
        }
    } else if office == "governor" || office == "gubernatorial" {
        format!("{}_gubernatorial_election,_{}", state, year)
    } else {
        let office = race.office_label().replace(' ', "_");
        match race.district.as_deref() {
            Some(d) => format!("{}_{}_District_{}_election,_{}", state, office, d, year),
            None => format!("{}_{}_elections,_{}", state, office, year),
        }
    };

    Some(format!("https://ballotpedia.org/{}", page))
}

fn elections_commission_url(race: &RaceMetadata) -> Option<String> {
    let office = race.office_type.to_ascii_lowercase();
    let year = &race.year;

    if office.starts_with("president") {
        return Some(format!("https://www.fec.gov/data/elections/president/{}/", year));
    }
    if race.state.is_empty() {
        return None;
    }
    if office.contains("senate") {
        return Some(format!(
            "https://www.fec.gov/data/elections/senate/{}/{}/",
            race.state, year
        ));
    }

    Some(match race.district_number() {
        Some(n) => format!(
            "https://www.fec.gov/data/elections/house/{}/{:02}/{}/",
            race.state, n, year
        ),
        None => format!(
            "https://www.fec.gov/data/elections/?state={}&cycle={}",
            race.state, year
        ),
    })
}

fn finance_tracker_url(race: &RaceMetadata) -> Option<String> {
    if race.state.is_empty() {
        return None;
    }
    Some(format!(
        "https://www.opensecrets.org/races/election?id={}&cycle={}",
        race.state, race.year
    ))
}

fn state_authority_url(state: &str) -> Option<String> {
    let state = state.trim();
    if state.is_empty() {
        return None;
    }

    let known = STATE_AUTHORITIES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(state))
        .map(|(_, url)| url.to_string());

    Some(known.unwrap_or_else(|| {
        format!("https://www.sos.{}.gov/elections", state.to_ascii_lowercase())
    }))
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::source::SourceType;

    #[test]
    fn test_federal_seeds_from_race_id() {
        let seeds = seed_sources("mo-senate-2024", None);

        assert_eq!(seeds.len(), 3);
        assert_eq!(
            seeds[0].url,
            "https://ballotpedia.org/United_States_Senate_election_in_Missouri,_2024"
        );
        assert_eq!(seeds[0].score, ENCYCLOPEDIA_SCORE);
        assert_eq!(seeds[1].url, "https://www.fec.gov/data/elections/senate/MO/2024/");
        assert_eq!(seeds[1].source_type, SourceType::Government);
        assert!(seeds[2].url.contains("opensecrets.org"));
        assert!(seeds.iter().all(|s| !s.is_fresh && !s.is_official_campaign));
    }

    #[test]
    fn test_scores_stay_below_official_floor() {
        for seed in seed_sources("mo-senate-2024", None)
            .into_iter()
            .chain(seed_sources("mo-governor-2024", None))
        {
            assert!(seed.score >= 0.6 && seed.score <= 0.8, "{}", seed.url);
        }
    }

    #[test]
    fn test_house_district_seed() {
        let seeds = seed_sources("ca-house-12-2024", None);
        assert_eq!(
            seeds[0].url,
            "https://ballotpedia.org/California%27s_12th_Congressional_District_election,_2024"
        );
        assert_eq!(seeds[1].url, "https://www.fec.gov/data/elections/house/CA/12/2024/");
    }

    #[test]
    fn test_state_race_uses_state_authority() {
        let seeds = seed_sources("mo-governor-2024", None);

        assert_eq!(seeds.len(), 2);
        assert_eq!(
            seeds[0].url,
            "https://ballotpedia.org/Missouri_gubernatorial_election,_2024"
        );
        assert_eq!(seeds[1].url, "https://www.sos.mo.gov/elections");
        assert_eq!(seeds[1].score, STATE_AUTHORITY_SCORE);

        let seeds = seed_sources("tx-state-senate-2026", None);
        assert_eq!(seeds[1].url, "https://www.sos.state.tx.us/elections/");
    }

    #[test]
    fn test_metadata_overrides_race_id() {
        let metadata = RaceMetadata::new("KS", "senate", "2026");
        let seeds = seed_sources("garbage", Some(&metadata));
        assert!(seeds[0].url.contains("Kansas,_2026"));
    }

    #[test]
    fn test_unparseable_race_id_yields_nothing() {
        assert!(seed_sources("senate2024", None).is_empty());
        assert!(seed_sources("", None).is_empty());
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
    }
}
