//! Link Classifier: decides whether a discovered URL is worth visiting
//!
//! A URL is in scope when its domain belongs to the job's allowed set and it either
//! contains one of the news keywords or ends in a keyword-led path that does not
//! mention "contact".

use crate::url::extract_domain;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Substrings that mark a URL as news-like content
pub const NEWS_KEYWORDS: &[&str] = &[
    "press release",
    "new",
    "newsroom",
    "newspage",
    "press-release",
    "press",
    "press room",
    "news",
    "news-release",
    "announcement",
    "update",
    "updates",
    "news-research",
    "press-room",
    "results",
    "media",
    "releases",
    "insights",
    "statements",
    "publications",
    "reports",
    "announcements",
    "headlines",
    "bulletin",
    "communique",
    "briefing",
    "digest",
    "gazette",
    "journal",
    "dispatch",
    "news-feed",
    "live-feed",
    "breaking",
    "newsletter",
];

/// Keyword alternation for the path-suffix pattern
const PATH_KEYWORDS: &str = "press|news|newsPage|news-releases|newsroom|press-release|\
announcement|update|updates|news-research|press-room|results|media|releases|insights|\
statements|publications|reports|announcements|headlines|bulletin|communique|briefing|\
digest|gazette|journal|dispatch|news-feed|live-feed|breaking|newsletter";

#[allow(clippy::expect_used)]
static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)({})[a-zA-Z0-9\-/]+/?$", PATH_KEYWORDS))
        .expect("path keyword regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static CONTACT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)contact").expect("contact regex is valid"));

/// Keywords a pagination link must mention to be listed in the filtered link file
const LINK_FILTER_KEYWORDS: &str = "press|news|newsPage|news-releases|newsroom|press-release|\
information|update|updates|news-research|press-room|results|media|releases|insights|\
statements|publications|reports|announcements|headlines|bulletin|communique|briefing|\
digest|gazette|journal|dispatch|news-feed|live-feed|breaking|newsletter";

#[allow(clippy::expect_used)]
static LINK_FILTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", LINK_FILTER_KEYWORDS)).expect("link filter regex is valid")
});

/// True if `link` mentions any news keyword anywhere, ignoring case and domain scope
pub fn mentions_news_keyword(link: &str) -> bool {
    LINK_FILTER_PATTERN.is_match(link)
}

/// Pure, deterministic link predicate
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    path_pattern: &'static Regex,
    exclude_pattern: &'static Regex,
}

impl LinkClassifier {
    pub fn new() -> Self {
        Self {
            path_pattern: &PATH_PATTERN,
            exclude_pattern: &CONTACT_PATTERN,
        }
    }

    /// Returns true if `url` is in scope for a job restricted to `allowed_domains`
    ///
    /// # Rules
    ///
    /// 1. The URL's domain must be in `allowed_domains`
    /// 2. Accept if the lowercased URL contains any of [`NEWS_KEYWORDS`]
    /// 3. Otherwise accept if the URL ends in a keyword-led path and does not contain "contact"
    pub fn should_visit(&self, url: &Url, allowed_domains: &HashSet<String>) -> bool {
        let in_scope = extract_domain(url)
            .map(|domain| allowed_domains.contains(&domain))
            .unwrap_or(false);
        if !in_scope {
            return false;
        }

        let lowered = url.as_str().to_lowercase();
        if NEWS_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            return true;
        }

        self.path_pattern.is_match(url.as_str()) && !self.exclude_pattern.is_match(url.as_str())
    }
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new()
    }
}
