//! URL / title heuristics: official-campaign detection, source typing,
//! and domain helpers. Pure functions, no network access.

use url::Url;

use crate::types::source::{host_of, Source, SourceType};

/// Score floor for sources judged to be an official campaign homepage.
pub const OFFICIAL_CAMPAIGN_FLOOR: f32 = 0.98;

/// Floor re-asserted for official sources in the final ranking pass.
pub const FINAL_OFFICIAL_FLOOR: f32 = 0.99;

/// Social platforms. Never treated as an official homepage.
pub const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "fb.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "youtube.com",
    "tiktok.com",
    "linkedin.com",
    "threads.net",
    "reddit.com",
    "bsky.app",
    "truthsocial.com",
    "medium.com",
    "substack.com",
];

/// News outlets.
pub const NEWS_DOMAINS: &[&str] = &[
    "apnews.com",
    "reuters.com",
    "nytimes.com",
    "washingtonpost.com",
    "wsj.com",
    "politico.com",
    "thehill.com",
    "axios.com",
    "cnn.com",
    "foxnews.com",
    "nbcnews.com",
    "cbsnews.com",
    "abcnews.go.com",
    "npr.org",
    "pbs.org",
    "usatoday.com",
    "bloomberg.com",
    "forbes.com",
    "newsweek.com",
    "rollcall.com",
    "stltoday.com",
    "kansascity.com",
    "news.yahoo.com",
];

/// Election reference and data sites.
pub const REFERENCE_DOMAINS: &[&str] = &[
    "ballotpedia.org",
    "wikipedia.org",
    "opensecrets.org",
    "votesmart.org",
    "vote411.org",
    "fec.gov",
    "270towin.com",
    "cookpolitical.com",
];

const CAMPAIGN_TOKENS: &[&str] = &["for", "elect", "vote", "campaign", "donate", "volunteer"];

/// True if `host` is `domain` or a subdomain of it.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn host_in(host: &str, domains: &[&str]) -> bool {
    domains.iter().any(|d| host_matches(host, d))
}

pub fn is_social_host(host: &str) -> bool {
    host_in(host, SOCIAL_DOMAINS)
}

pub fn is_news_host(host: &str) -> bool {
    host_in(host, NEWS_DOMAINS)
}

pub fn is_reference_host(host: &str) -> bool {
    host_in(host, REFERENCE_DOMAINS)
}

/// `.gov` / `.mil` hosts and `state.xx.us` style state domains.
pub fn is_government_host(host: &str) -> bool {
    host.ends_with(".gov")
        || host.ends_with(".mil")
        || host.contains(".gov.")
        || (host.ends_with(".us") && host.split('.').any(|label| label == "state"))
}

/// Registrable domain of a host: the last two labels, or three when the
/// second-level label is a generic one under a country code (`co.uk`).
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }

    let tld = labels[labels.len() - 1];
    let sld = labels[labels.len() - 2];
    let take = if tld.len() == 2 && matches!(sld, "co" | "com" | "org" | "net" | "gov" | "ac" | "edu")
    {
        3
    } else {
        2
    };

    labels[labels.len() - take..].join(".")
}

/// Classify a URL into a broad source type.
pub fn classify_source_type(url: &str) -> SourceType {
    let Some(host) = host_of(url) else {
        return SourceType::Website;
    };

    if is_social_host(&host) {
        SourceType::Social
    } else if is_government_host(&host) {
        SourceType::Government
    } else if is_news_host(&host) || path_of(url).contains("/news/") {
        SourceType::News
    } else {
        SourceType::Website
    }
}

/// Does this URL / title look like a candidate's own campaign homepage?
///
/// Social platforms and known news / reference sites are excluded
/// outright. Otherwise the URL or title must carry a campaign-intent token,
/// the TLD must be `.com` or `.org`, and the URL must not look
/// governmental or newsy.
pub fn looks_official_campaign(url: &str, title: Option<&str>) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };

    if is_social_host(&host) || is_news_host(&host) || is_reference_host(&host) {
        return false;
    }

    if !(host.ends_with(".com") || host.ends_with(".org")) {
        return false;
    }

    let path = path_of(url).to_ascii_lowercase();
    if is_government_host(&host) || path.contains("/news") {
        return false;
    }

    let site_name = registrable_domain(&host);
    let site_name = site_name.split('.').next().unwrap_or("");
    let host_intent = CAMPAIGN_TOKENS.iter().any(|t| site_name.contains(t));
    let path_intent = words(&path).any(|w| CAMPAIGN_TOKENS.contains(&w.as_str()));
    let title_intent = title
        .map(|t| words(t).any(|w| CAMPAIGN_TOKENS.contains(&w.as_str())))
        .unwrap_or(false);

    host_intent || path_intent || title_intent
}

/// Does the source's URL or title mention the candidate?
///
/// Matches the last name in the title or URL, or the concatenated full
/// name in the host (`joshhawley.com`).
pub fn mentions_candidate(source: &Source, candidate: &str) -> bool {
    let tokens: Vec<String> = words(candidate).collect();
    let Some(last_name) = tokens.last() else {
        return false;
    };

    let url = source.url.to_ascii_lowercase();
    let title = source.title.as_deref().unwrap_or("").to_ascii_lowercase();
    let joined = tokens.concat();

    url.contains(&joined)
        || words(&title).any(|w| &w == last_name)
        || words(&url).any(|w| &w == last_name)
}

fn path_of(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default()
}

/// Lowercase alphanumeric words.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}
