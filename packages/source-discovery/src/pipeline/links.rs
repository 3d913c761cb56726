//! Anchor extraction from raw HTML.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("anchor pattern is valid")
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// A resolved anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL, fragment removed.
    pub url: Url,

    /// Visible anchor text, tags stripped and whitespace collapsed.
    pub text: String,
}

/// Extract `<a href>` links in document order.
///
/// Relative hrefs are resolved against `base`. Fragment-only, `mailto:`,
/// `tel:` and `javascript:` links are skipped, as are hrefs that do not
/// resolve to an http(s) URL.
pub fn extract_links(html: &str, base: &Url) -> Vec<ExtractedLink> {
    let mut links = Vec::new();

    for cap in ANCHOR_PATTERN.captures_iter(html) {
        let Some(href) = cap.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };

        let lower = href.to_ascii_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower.starts_with("javascript:")
        {
            continue;
        }

        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);

        let text = cap.get(2).map(|m| anchor_text(m.as_str())).unwrap_or_default();
        links.push(ExtractedLink {
            url: resolved,
            text,
        });
    }

    links
}

fn anchor_text(inner: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(inner, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
