//! Source type - a candidate information source for a race.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Broad classification of where a source comes from.
///
/// Informational only; ranking never branches on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Website,
    Government,
    News,
    Social,
}

impl SourceType {
    /// Returns the type as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Government => "government",
            Self::News => "news",
            Self::Social => "social",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate information source.
///
/// Scores live in `[0, 1]`. Heuristics only ever move a score upward through
/// [`Source::raise_score_to`]; the one place a score may go down is triage
/// blending, which goes through [`Source::set_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// URL of the source. Identity for dedup is [`normalize_url`] of this.
    pub url: String,

    /// Where the source comes from.
    #[serde(rename = "type", default)]
    pub source_type: SourceType,

    /// Page title, if known.
    pub title: Option<String>,

    /// Snippet or description, if known.
    pub description: Option<String>,

    /// Relevance score in `[0, 1]`.
    pub score: f32,

    /// Produced by the recency phase.
    #[serde(default)]
    pub is_fresh: bool,

    /// Believed to be a candidate's own campaign homepage.
    #[serde(default)]
    pub is_official_campaign: bool,

    /// Produced by walking an official homepage.
    #[serde(default)]
    pub is_campaign_subpage: bool,

    /// When this record was produced.
    pub fetched_at: DateTime<Utc>,
}

impl Source {
    /// Create a new source with a zero score.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_type: SourceType::Website,
            title: None,
            description: None,
            score: 0.0,
            is_fresh: false,
            is_official_campaign: false,
            is_campaign_subpage: false,
            fetched_at: Utc::now(),
        }
    }

    /// Set the source type.
    pub fn with_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the initial score (clamped to `[0, 1]`).
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = clamp_score(score);
        self
    }

    /// Mark as produced by the recency phase.
    pub fn fresh(mut self) -> Self {
        self.is_fresh = true;
        self
    }

    /// Set the fetch timestamp.
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Raise the score to `floor` if it is currently lower.
    ///
    /// Never lowers the score.
    pub fn raise_score_to(&mut self, floor: f32) {
        let floor = clamp_score(floor);
        if floor > self.score {
            self.score = floor;
        }
    }

    /// Explicitly reassign the score (clamped to `[0, 1]`).
    pub fn set_score(&mut self, score: f32) {
        self.score = clamp_score(score);
    }

    /// Flag as an official campaign homepage and pin the score at `floor`.
    pub fn mark_official(&mut self, floor: f32) {
        self.is_official_campaign = true;
        self.raise_score_to(floor);
    }

    /// Dedup key for this source.
    pub fn key(&self) -> String {
        normalize_url(&self.url)
    }

    /// Lowercased host without a leading `www.`.
    pub fn host(&self) -> Option<String> {
        host_of(&self.url)
    }

    /// Fold a duplicate record into this one.
    ///
    /// Keeps the higher score, ORs the boolean flags, and fills in any
    /// metadata this record is missing.
    pub fn merge(&mut self, other: Source) {
        self.raise_score_to(other.score);
        self.is_fresh |= other.is_fresh;
        self.is_official_campaign |= other.is_official_campaign;
        self.is_campaign_subpage |= other.is_campaign_subpage;

        if self.title.is_none() {
            self.title = other.title;
        }
        if self.description.is_none() {
            self.description = other.description;
        }
        if self.source_type == SourceType::Website {
            self.source_type = other.source_type;
        }
    }
}

fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Lowercased host of `url` without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Normalize a URL into its dedup key.
///
/// Lowercases scheme and host, folds `http` into `https`, and drops `www.`,
/// the fragment, default ports, `utm_*` tracking parameters and any
/// trailing slash. Strings that do not parse as URLs are trimmed and
/// lowercased.
pub fn normalize_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return url.trim().trim_end_matches('/').to_ascii_lowercase();
    };

    let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let scheme = match parsed.scheme() {
        "http" => "https",
        other => other,
    };

    let mut key = format!("{}://{}", scheme, host);
    if let Some(port) = parsed.port() {
        key.push_str(&format!(":{}", port));
    }
    key.push_str(parsed.path().trim_end_matches('/'));

    let params: Vec<String> = parsed
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_"))
        .map(|(k, v)| {
            if v.is_empty() {
                k.into_owned()
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect();
    if !params.is_empty() {
        key.push('?');
        key.push_str(&params.join("&"));
    }

    key
}
