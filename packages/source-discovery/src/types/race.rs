//! Race metadata and race identifier parsing.
//!
//! Metadata comes from an upstream extraction step and is read-only here.
//! When it is missing, a best-effort equivalent is derived from the race
//! identifier (`"mo-senate-2024"` → MO / senate / 2024). Fields are plain
//! strings on purpose: thin metadata renders as empty text in templates
//! rather than failing discovery.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{DiscoveryError, Result};

/// Federal vs. state-level race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceType {
    Federal,
    #[default]
    State,
}

impl RaceType {
    /// Infer the race type from an office name.
    pub fn infer(office: &str) -> Self {
        let office = office.trim().to_ascii_lowercase().replace(['-', '_', '.'], " ");
        if office.starts_with("state ") {
            return Self::State;
        }
        match office.as_str() {
            "senate" | "us senate" | "u s senate" | "house" | "us house" | "u s house"
            | "congress" | "congressional" | "president" | "presidential" => Self::Federal,
            _ => Self::State,
        }
    }

    pub fn is_federal(&self) -> bool {
        matches!(self, Self::Federal)
    }
}

/// Structured metadata for a race.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceMetadata {
    /// Two-letter state code (uppercase), e.g. `MO`.
    pub state: String,

    /// Office, e.g. `senate`, `house`, `governor`.
    pub office_type: String,

    /// Election year.
    pub year: String,

    /// District, for districted offices.
    #[serde(default)]
    pub district: Option<String>,

    #[serde(default)]
    pub race_type: RaceType,

    /// Candidate names, if known.
    #[serde(default)]
    pub candidates: Vec<String>,
}

impl RaceMetadata {
    /// Create metadata; the race type is inferred from the office.
    pub fn new(
        state: impl Into<String>,
        office_type: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        let office_type = office_type.into();
        Self {
            state: state.into().trim().to_ascii_uppercase(),
            race_type: RaceType::infer(&office_type),
            office_type,
            year: year.into(),
            district: None,
            candidates: Vec::new(),
        }
    }

    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn with_race_type(mut self, race_type: RaceType) -> Self {
        self.race_type = race_type;
        self
    }

    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.candidates = candidates.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Derive metadata from a dash-separated race identifier.
    ///
    /// Needs at least three non-empty parts: state, office (one or more
    /// parts), year. A numeric part right before the year is the district.
    pub fn parse_race_id(race_id: &str) -> Result<Self> {
        let parts: Vec<&str> = race_id
            .trim()
            .split('-')
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            return Err(DiscoveryError::InvalidRaceId {
                race_id: race_id.to_string(),
            });
        }

        let state = parts[0];
        let year = parts[parts.len() - 1];
        let mut office_parts = &parts[1..parts.len() - 1];

        let mut district = None;
        if office_parts.len() > 1 {
            if let Some(last) = office_parts.last() {
                if last.chars().all(|c| c.is_ascii_digit()) {
                    district = Some(last.to_string());
                    office_parts = &office_parts[..office_parts.len() - 1];
                }
            }
        }

        let office = office_parts.join(" ").to_ascii_lowercase();
        let mut metadata = Self::new(state, office, year);
        metadata.district = district;
        Ok(metadata)
    }

    /// [`parse_race_id`](Self::parse_race_id), discarding the error.
    pub fn from_race_id(race_id: &str) -> Option<Self> {
        Self::parse_race_id(race_id).ok()
    }

    /// Fallback for an identifier that does not parse: the whole id, with
    /// its delimiters turned into spaces, becomes the office text. State,
    /// year and district stay empty so templates render it on its own.
    pub fn from_free_text(race_id: &str) -> Self {
        let office = race_id
            .replace(['-', '_', '.', '/', ':'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            office_type: office,
            ..Self::default()
        }
    }

    /// Full state name, falling back to the raw code.
    pub fn state_name(&self) -> &str {
        match state_name(&self.state) {
            Some(name) => name,
            None => &self.state,
        }
    }

    /// Human-readable office label used in query text.
    pub fn office_label(&self) -> String {
        let office = self.office_type.trim().to_ascii_lowercase();
        if self.race_type.is_federal() {
            if office.contains("senate") {
                return "U.S. Senate".to_string();
            }
            if office.contains("house") || office.starts_with("congress") {
                return "U.S. House".to_string();
            }
            if office.starts_with("president") {
                return "President".to_string();
            }
        }
        title_case(&office.replace(['-', '_'], " "))
    }

    /// District rendered as a number without leading zeros, if numeric.
    pub fn district_number(&self) -> Option<u32> {
        self.district.as_deref()?.trim().parse().ok()
    }
}

impl FromStr for RaceMetadata {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_race_id(s)
    }
}

/// Use structured metadata if present, else parse the race identifier.
pub fn resolve_race(race_id: &str, metadata: Option<&RaceMetadata>) -> Option<RaceMetadata> {
    match metadata {
        Some(metadata) => Some(metadata.clone()),
        None => RaceMetadata::from_race_id(race_id),
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Full name for a two-letter state code.
pub fn state_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    STATES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}
