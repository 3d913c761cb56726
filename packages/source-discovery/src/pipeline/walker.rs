//! Site walker - expands official campaign homepages into their depth-1
//! policy / news subpages.
//!
//! Fetches share one semaphore across every homepage in a walk, so the
//! number of outbound connections is bounded no matter how many homepages
//! there are. The per-fetch timeout starts once a permit is held.

use futures::future::join_all;
use std::collections::HashSet;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::pipeline::heuristics::{classify_source_type, registrable_domain};
use crate::pipeline::links::extract_links;
use crate::traits::fetcher::{FetchedPage, HtmlFetcher};
use crate::types::config::SiteWalkConfig;
use crate::types::source::{normalize_url, Source};

/// How far below its homepage a subpage scores.
pub const SUBPAGE_SCORE_GAP: f32 = 0.03;

/// Ceiling for subpage scores.
pub const SUBPAGE_SCORE_CAP: f32 = 0.94;

const ALLOW_PREFIXES: &[&str] = &[
    "/issues",
    "/platform",
    "/news",
    "/press",
    "/policies",
    "/media",
    "/updates",
];

const ALLOW_KEYWORDS: &[&str] = &["issue", "policy", "plan", "press", "news", "about"];

const DENY_PATTERNS: &[&str] = &[
    "/sitemap",
    "/subscribe",
    "/merch",
    "/cart",
    "/donation",
    "/donate",
    "/contribute",
    "/checkout",
    "/shop",
    "/store",
    "/login",
    "/account",
    "/privacy",
    "/terms",
    "/wp-admin",
    "/feed",
];

const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".zip", ".mp4", ".mp3", ".xml",
];

/// Score for a subpage of a homepage scoring `homepage_score`.
pub fn subpage_score(homepage_score: f32) -> f32 {
    (homepage_score - SUBPAGE_SCORE_GAP)
        .min(SUBPAGE_SCORE_CAP)
        .max(0.0)
}

/// Whether a link path is worth following.
///
/// Deny patterns win over allow patterns.
pub fn is_walkable_path(path: &str) -> bool {
    let path = path.to_ascii_lowercase();

    if DENY_PATTERNS.iter().any(|p| path.contains(p)) {
        return false;
    }
    if SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }

    ALLOW_PREFIXES.iter().any(|p| path.starts_with(p))
        || ALLOW_KEYWORDS.iter().any(|k| path.contains(k))
}

/// Walk every homepage and return the subpages found.
///
/// A homepage that fails to fetch, times out, is not HTML, or has an empty
/// body contributes nothing; it never affects the other homepages.
pub async fn walk_homepages<F>(
    fetcher: &F,
    homepages: &[Source],
    config: &SiteWalkConfig,
) -> Vec<Source>
where
    F: HtmlFetcher + ?Sized,
{
    if homepages.is_empty() {
        return Vec::new();
    }

    let semaphore = Semaphore::new(config.max_concurrency.max(1));

    info!(
        homepages = homepages.len(),
        max_concurrency = config.max_concurrency,
        "Walking official homepages"
    );

    let tasks = homepages
        .iter()
        .map(|homepage| walk_one(fetcher, homepage, &semaphore, config));
    let subpages: Vec<Source> = join_all(tasks).await.into_iter().flatten().collect();

    info!(
        homepages = homepages.len(),
        subpages = subpages.len(),
        "Site walk completed"
    );

    subpages
}

async fn walk_one<F>(
    fetcher: &F,
    homepage: &Source,
    semaphore: &Semaphore,
    config: &SiteWalkConfig,
) -> Vec<Source>
where
    F: HtmlFetcher + ?Sized,
{
    let Ok(permit) = semaphore.acquire().await else {
        return Vec::new();
    };

    let fetched = tokio::time::timeout(
        config.fetch_timeout,
        fetcher.get_html(&homepage.url, config.fetch_timeout),
    )
    .await;
    drop(permit);

    let page = match fetched {
        Ok(result) => result.and_then(accept_page),
        Err(_) => Err(FetchError::Timeout {
            url: homepage.url.clone(),
        }),
    };
    let page = match page {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %homepage.url, error = %e, "Skipping homepage");
            return Vec::new();
        }
    };

    subpages_from_html(homepage, &page.url, &page.body, config.max_links_per_homepage)
}

/// Reject pages the walker cannot use: non-success statuses, non-HTML
/// content and empty bodies.
fn accept_page(page: FetchedPage) -> FetchResult<FetchedPage> {
    if !page.is_success() {
        return Err(FetchError::Status {
            url: page.url,
            status: page.status,
        });
    }
    if !page.is_html() {
        return Err(FetchError::NotHtml {
            url: page.url,
            content_type: page.content_type.unwrap_or_default(),
        });
    }
    if !page.has_body() {
        return Err(FetchError::EmptyBody { url: page.url });
    }
    Ok(page)
}

/// Turn a homepage's HTML into subpage sources.
///
/// Links resolve against `final_url` (the homepage URL after redirects)
/// when it stays on the homepage's registrable domain, else against the
/// homepage URL. Only links on that domain with walkable paths are kept,
/// in document order, without duplicates, up to `max_links`.
pub fn subpages_from_html(
    homepage: &Source,
    final_url: &str,
    html: &str,
    max_links: usize,
) -> Vec<Source> {
    let Ok(home_url) = Url::parse(&homepage.url) else {
        return Vec::new();
    };
    let Some(home_domain) = home_url.host_str().map(registrable_domain) else {
        return Vec::new();
    };

    let base = match Url::parse(final_url) {
        Ok(url) if url.host_str().map(registrable_domain).as_ref() == Some(&home_domain) => url,
        Ok(url) => {
            debug!(
                homepage = %homepage.url,
                final_url = %url,
                "Homepage redirected off-domain, resolving links against homepage"
            );
            home_url.clone()
        }
        Err(_) => home_url.clone(),
    };

    let home_key = normalize_url(&homepage.url);
    let score = subpage_score(homepage.score);
    let mut seen: HashSet<String> = HashSet::new();
    let mut subpages = Vec::new();

    for link in extract_links(html, &base) {
        if subpages.len() >= max_links {
            break;
        }

        let Some(host) = link.url.host_str() else {
            continue;
        };
        if registrable_domain(host) != home_domain {
            continue;
        }
        if !is_walkable_path(link.url.path()) {
            debug!(url = %link.url, "Skipping link outside path policy");
            continue;
        }

        let url = link.url.to_string();
        if normalize_url(&url) == home_key || !seen.insert(url.clone()) {
            continue;
        }

        let mut subpage = Source::new(url.as_str())
            .with_type(classify_source_type(&url))
            .with_score(score)
            .with_description(format!("Linked from {}", homepage.url));
        if !link.text.is_empty() {
            subpage = subpage.with_title(link.text);
        }
        subpage.is_campaign_subpage = true;
        subpages.push(subpage);
    }

    debug!(
        homepage = %homepage.url,
        subpages = subpages.len(),
        "Extracted subpages"
    );

    subpages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use proptest::prelude::*;
    use std::time::Duration;

    fn homepage(url: &str) -> Source {
        let mut source = Source::new(url).with_title("Josh Hawley for Senate");
        source.mark_official(0.98);
        source
    }

    #[test]
    fn test_path_policy() {
        assert!(is_walkable_path("/issues"));
        assert!(is_walkable_path("/issues/economy"));
        assert!(is_walkable_path("/about"));
        assert!(is_walkable_path("/our-plan"));
        assert!(is_walkable_path("/Press-Releases"));
        assert!(!is_walkable_path("/donate"));
        assert!(!is_walkable_path("/donate/issues"));
        assert!(!is_walkable_path("/sitemap.xml"));
        assert!(!is_walkable_path("/shop"));
        assert!(!is_walkable_path("/events"));
        assert!(!is_walkable_path("/"));
        assert!(!is_walkable_path("/issues/platform.pdf"));
    }

    #[test]
    fn test_issues_about_kept_donate_denied() {
        let html = r#"
            <a href="/issues">Issues</a>
            <a href="/donate">Donate</a>
            <a href="/about">About</a>
        "#;
        let home = homepage("https://joshhawley.com");

        let subpages = subpages_from_html(&home, "https://joshhawley.com", html, 8);

        assert_eq!(subpages.len(), 2);
        assert_eq!(subpages[0].url, "https://joshhawley.com/issues");
        assert_eq!(subpages[1].url, "https://joshhawley.com/about");
        for subpage in &subpages {
            assert!(subpage.is_campaign_subpage);
            assert!(!subpage.is_fresh);
            assert!(!subpage.is_official_campaign);
            assert_eq!(subpage.score, SUBPAGE_SCORE_CAP);
        }
    }

    #[test]
    fn test_cross_domain_duplicate_and_cap() {
        let html = r#"
            <a href="/issues">Issues</a>
            <a href="/issues#economy">Economy</a>
            <a href="https://news.example.com/news/hawley">Coverage</a>
            <a href="https://action.joshhawley.com/press">Press</a>
            <a href="/news">News</a>
            <a href="/policies">Policies</a>
        "#;
        let home = homepage("https://joshhawley.com");

        let subpages = subpages_from_html(&home, "https://www.joshhawley.com/", html, 3);

        let urls: Vec<_> = subpages.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.joshhawley.com/issues",
                "https://action.joshhawley.com/press",
                "https://www.joshhawley.com/news",
            ]
        );
    }

    #[test]
    fn test_redirect_to_donation_platform_yields_no_subpages() {
        let html = r#"
            <a href="https://secure.winred.com/hawley/issues">Issues</a>
            <a href="/about">About</a>
            <a href="https://joshhawley.com/news">News</a>
        "#;
        let home = homepage("https://joshhawley.com");

        let subpages =
            subpages_from_html(&home, "https://secure.winred.com/hawley/donate", html, 8);

        let urls: Vec<_> = subpages.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://joshhawley.com/about", "https://joshhawley.com/news"]
        );
        assert!(subpages.iter().all(|s| !s.url.contains("winred.com")));
    }

    #[test]
    fn test_subpage_title_from_link_text() {
        let html = r#"<a href="/platform"><strong>Our Platform</strong></a>"#;
        let home = homepage("https://kunceforsenate.com");
        let subpages = subpages_from_html(&home, "https://kunceforsenate.com", html, 8);
        assert_eq!(subpages[0].title.as_deref(), Some("Our Platform"));
    }

    #[test]
    fn test_accept_page() {
        let ok = FetchedPage::html("https://a.com", "<html></html>");
        assert!(accept_page(ok).is_ok());

        let gone = FetchedPage::html("https://a.com", "x").with_status(410);
        assert!(matches!(
            accept_page(gone),
            Err(FetchError::Status { status: 410, .. })
        ));

        let json = FetchedPage::html("https://a.com", "{}").with_content_type("application/json");
        assert!(matches!(accept_page(json), Err(FetchError::NotHtml { .. })));

        let blank = FetchedPage::html("https://a.com", "\n  ");
        assert!(matches!(accept_page(blank), Err(FetchError::EmptyBody { .. })));
    }

    #[tokio::test]
    async fn test_walk_isolates_failures() {
        let fetcher = MockFetcher::new()
            .with_page(FetchedPage::html(
                "https://joshhawley.com",
                r#"<a href="/issues">Issues</a>"#,
            ))
            .with_page(
                FetchedPage::html("https://pdfcampaign.com", "%PDF-1.4")
                    .with_content_type("application/pdf"),
            )
            .with_page(FetchedPage::html("https://emptycampaign.com", "   "))
            .fail_url("https://kunceforsenate.com");

        let homepages = vec![
            homepage("https://joshhawley.com"),
            homepage("https://kunceforsenate.com"),
            homepage("https://pdfcampaign.com"),
            homepage("https://emptycampaign.com"),
            homepage("https://missing.com"),
        ];

        let subpages = walk_homepages(&fetcher, &homepages, &SiteWalkConfig::default()).await;

        assert_eq!(subpages.len(), 1);
        assert_eq!(subpages[0].url, "https://joshhawley.com/issues");
        assert_eq!(fetcher.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_walk_respects_global_concurrency() {
        let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(20));
        let mut homepages = Vec::new();
        for i in 0..10 {
            let url = format!("https://candidate{}.com", i);
            fetcher = fetcher.with_page(FetchedPage::html(&url, r#"<a href="/issues">I</a>"#));
            homepages.push(homepage(&url));
        }

        let config = SiteWalkConfig::default().with_max_concurrency(3);
        let subpages = walk_homepages(&fetcher, &homepages, &config).await;

        assert_eq!(subpages.len(), 10);
        assert!(fetcher.max_in_flight() <= 3);
        assert!(fetcher.max_in_flight() >= 1);
    }

    #[tokio::test]
    async fn test_walk_times_out_slow_fetch() {
        let fetcher = MockFetcher::new()
            .with_delay(Duration::from_millis(200))
            .with_page(FetchedPage::html(
                "https://joshhawley.com",
                r#"<a href="/issues">Issues</a>"#,
            ));

        let config = SiteWalkConfig::default().with_fetch_timeout(Duration::from_millis(20));
        let subpages =
            walk_homepages(&fetcher, &[homepage("https://joshhawley.com")], &config).await;

        assert!(subpages.is_empty());
    }

    proptest! {
        #[test]
        fn prop_subpage_scores_below_homepage(home_score in 0.05f32..=1.0) {
            let mut home = Source::new("https://joshhawley.com").with_score(home_score);
            home.is_official_campaign = true;
            let html = r#"<a href="/issues">I</a><a href="/news">N</a><a href="/about">A</a>"#;

            for subpage in subpages_from_html(&home, "https://joshhawley.com", html, 8) {
                prop_assert!(subpage.score < home.score);
                prop_assert!(subpage.score <= SUBPAGE_SCORE_CAP);
            }
        }
    }
}
