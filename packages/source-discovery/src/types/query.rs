//! Search query descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DiscoveryError, Result};

/// Default number of results requested per query.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Issue / topic category attached to every query.
///
/// `General` covers race-level and reference lookups that are not about a
/// specific policy area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    General,
    Economy,
    Healthcare,
    Immigration,
    Education,
    Environment,
    PublicSafety,
    Taxes,
    ReproductiveRights,
    GunPolicy,
    ForeignPolicy,
    Energy,
    Housing,
    Infrastructure,
    Veterans,
    Agriculture,
}

impl Issue {
    /// Every issue, `General` first.
    pub const ALL: [Issue; 16] = [
        Issue::General,
        Issue::Economy,
        Issue::Healthcare,
        Issue::Immigration,
        Issue::Education,
        Issue::Environment,
        Issue::PublicSafety,
        Issue::Taxes,
        Issue::ReproductiveRights,
        Issue::GunPolicy,
        Issue::ForeignPolicy,
        Issue::Energy,
        Issue::Housing,
        Issue::Infrastructure,
        Issue::Veterans,
        Issue::Agriculture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Economy => "economy",
            Self::Healthcare => "healthcare",
            Self::Immigration => "immigration",
            Self::Education => "education",
            Self::Environment => "environment",
            Self::PublicSafety => "public_safety",
            Self::Taxes => "taxes",
            Self::ReproductiveRights => "reproductive_rights",
            Self::GunPolicy => "gun_policy",
            Self::ForeignPolicy => "foreign_policy",
            Self::Energy => "energy",
            Self::Housing => "housing",
            Self::Infrastructure => "infrastructure",
            Self::Veterans => "veterans",
            Self::Agriculture => "agriculture",
        }
    }

    /// Keywords used when this issue is rendered into a query.
    pub fn search_terms(&self) -> &'static str {
        match self {
            Self::General => "",
            Self::Economy => "economy jobs inflation",
            Self::Healthcare => "healthcare",
            Self::Immigration => "immigration border",
            Self::Education => "education schools",
            Self::Environment => "climate environment",
            Self::PublicSafety => "crime public safety",
            Self::Taxes => "taxes",
            Self::ReproductiveRights => "abortion",
            Self::GunPolicy => "gun policy",
            Self::ForeignPolicy => "foreign policy",
            Self::Energy => "energy",
            Self::Housing => "housing",
            Self::Infrastructure => "infrastructure",
            Self::Veterans => "veterans",
            Self::Agriculture => "agriculture farmers",
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Self::General)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Issue {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Issue::ALL
            .iter()
            .copied()
            .find(|issue| issue.as_str() == normalized)
            .ok_or_else(|| DiscoveryError::InvalidQuery {
                reason: format!("unknown issue '{}'", s),
            })
    }
}

/// Unit of a [`DateRestrict`] window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    fn prefix(&self) -> char {
        match self {
            Self::Day => 'd',
            Self::Week => 'w',
            Self::Month => 'm',
            Self::Year => 'y',
        }
    }
}

/// Freshness window token such as `d30`, `w2`, `m6` or `y1`.
///
/// A query without one is evergreen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateRestrict {
    pub unit: DateUnit,
    pub count: u32,
}

impl DateRestrict {
    /// Parse a freshness token. Malformed tokens are a caller defect.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let invalid = || DiscoveryError::InvalidQuery {
            reason: format!("invalid date restriction '{}'", token),
        };

        let mut chars = token.chars();
        let unit = match chars.next().map(|c| c.to_ascii_lowercase()) {
            Some('d') => DateUnit::Day,
            Some('w') => DateUnit::Week,
            Some('m') => DateUnit::Month,
            Some('y') => DateUnit::Year,
            _ => return Err(invalid()),
        };
        let count: u32 = chars.as_str().parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        Ok(Self { unit, count })
    }

    pub fn months(count: u32) -> Self {
        Self {
            unit: DateUnit::Month,
            count: count.max(1),
        }
    }

    /// Window length in days (months are 30 days, years 365).
    pub fn approximate_days(&self) -> u32 {
        let per_unit = match self.unit {
            DateUnit::Day => 1,
            DateUnit::Week => 7,
            DateUnit::Month => 30,
            DateUnit::Year => 365,
        };
        self.count.saturating_mul(per_unit)
    }

    /// Coarsest named range that covers the window.
    pub fn time_range(&self) -> &'static str {
        match self.approximate_days() {
            0..=1 => "day",
            2..=7 => "week",
            8..=31 => "month",
            _ => "year",
        }
    }
}

impl Default for DateRestrict {
    fn default() -> Self {
        Self::months(6)
    }
}

impl fmt::Display for DateRestrict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.unit.prefix(), self.count)
    }
}

impl FromStr for DateRestrict {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DateRestrict {
    type Error = DiscoveryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DateRestrict> for String {
    fn from(value: DateRestrict) -> Self {
        value.to_string()
    }
}

/// Which query family produced a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPurpose {
    /// Reference-site lookups (election encyclopedias, government data).
    TrustedSeed,
    /// Candidate homepage discovery.
    OfficialSite,
    /// Candidate × issue recency sweep.
    CandidateIssue,
    /// Race-level issue sweep without a candidate.
    RaceIssue,
}

/// A request descriptor consumed by a [`SearchExecutor`](crate::SearchExecutor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The query string.
    pub text: String,

    /// Race this query belongs to.
    pub race_id: String,

    /// Issue / topic tag, used for score nudging.
    pub issue: Issue,

    /// Maximum results requested.
    pub max_results: usize,

    /// Freshness window; `None` means evergreen.
    pub date_restrict: Option<DateRestrict>,

    /// Query family.
    pub purpose: QueryPurpose,

    /// Candidate this query is about, if any.
    pub candidate: Option<String>,
}

impl SearchQuery {
    /// Create an evergreen query. Empty text is rejected.
    pub fn new(
        text: impl Into<String>,
        race_id: impl Into<String>,
        issue: Issue,
        purpose: QueryPurpose,
    ) -> Result<Self> {
        let text = collapse_whitespace(&text.into());
        if text.is_empty() {
            return Err(DiscoveryError::InvalidQuery {
                reason: "query text is empty".to_string(),
            });
        }

        Ok(Self {
            text,
            race_id: race_id.into(),
            issue,
            max_results: DEFAULT_MAX_RESULTS,
            date_restrict: None,
            purpose,
            candidate: None,
        })
    }

    /// Set the result limit (at least 1).
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Bound results to a recency window.
    pub fn with_date_restrict(mut self, date_restrict: DateRestrict) -> Self {
        self.date_restrict = Some(date_restrict);
        self
    }

    /// Attach the candidate this query is about.
    pub fn for_candidate(mut self, candidate: impl Into<String>) -> Self {
        self.candidate = Some(candidate.into());
        self
    }

    pub fn is_evergreen(&self) -> bool {
        self.date_restrict.is_none()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
