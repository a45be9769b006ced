//! HTML extraction for crawled pages
//!
//! This module turns a fetched HTML document into:
//! - An `ExtractedPage` (heading-to-link map plus cleaned body text)
//! - Outbound link candidates from anchors, card containers and the body text
//! - Pagination candidates for the Pagination Tracker
//!
//! Parsing is synchronous and owns the DOM only for the duration of `parse_page`, so
//! callers can hold the result across await points.

use crate::crawler::pagination::PaginationCandidates;
use crate::url::{normalize_url, resolve_href};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

/// Script/style/markup residue removed from body text, applied in order
const REMOVAL_PATTERNS: &[&str] = &[
    r"(?s)//<!\[CDATA\[.*?\]\]>",
    r"(?s)var .*?;",
    r"(?s)function .*?\}",
    r"(?s)\(function.*?\);",
    r"(?s)formalyze.*?;",
    r"(?s)<!--.*?-->",
    r"(?s)<.*?>",
];

#[allow(clippy::expect_used)]
static REMOVAL_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REMOVAL_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("removal pattern is valid"))
        .collect()
});

#[allow(clippy::expect_used)]
static TEXT_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("text URL regex is valid"));

/// Elements whose text never contributes to the body content
const IGNORED_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

const CARD_LINK_SELECTOR: &str =
    "div.card a[href], div.news-card a[href], div.press-card a[href]";
const NEXT_SELECTOR: &str = r#"a.next[href], a[rel="next"][href], a[aria-label="Next"][href]"#;
const PREVIOUS_SELECTOR: &str =
    r#"a.prev[href], a[rel="prev"][href], a[aria-label="Previous"][href]"#;
const PAGE_NUMBER_SELECTOR: &str = "a.page-numbers[href], a.page-link[href], li.pagination a[href]";
const YEAR_OPTION_SELECTOR: &str = r#"select[id*="year"] option[value]"#;

/// One crawled page as emitted by the Crawl Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// Final URL of the page
    pub url: String,

    /// Heading text mapped to the first link inside the heading, if any
    pub headings: BTreeMap<String, Option<String>>,

    /// Cleaned body text
    pub content: String,
}

/// Everything the Crawl Engine needs from one HTML document
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub page: ExtractedPage,

    /// Targets of `<a href>` elements
    pub anchor_links: Vec<Url>,

    /// Literal URLs found in the cleaned body text
    pub text_links: Vec<Url>,

    /// Anchors inside card-style containers
    pub card_links: Vec<Url>,

    pub pagination: PaginationCandidates,
}

/// Parses an HTML document fetched from `base_url`
///
/// # Example
///
/// ```
/// use press_scout::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><body><h2><a href="/news/1">Q3 results</a></h2><p>Revenue grew.</p></body></html>"#;
/// let base = Url::parse("https://example.com/news").unwrap();
/// let parsed = parse_page(html, &base);
/// assert_eq!(
///     parsed.page.headings.get("Q3 results"),
///     Some(&Some("https://example.com/news/1".to_string()))
/// );
/// assert!(parsed.page.content.contains("Revenue grew."));
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let headings = extract_headings(&document, base_url);
    let content = extract_body_text(&document);
    let text_links = extract_text_links(&content);

    ParsedPage {
        page: ExtractedPage {
            url: base_url.to_string(),
            headings,
            content,
        },
        anchor_links: select_hrefs(&document, "a[href]", base_url),
        text_links,
        card_links: select_hrefs(&document, CARD_LINK_SELECTOR, base_url),
        pagination: extract_pagination(&document, base_url),
    }
}

/// Maps each `h1`..`h6` heading's normalized text to its first link
pub fn extract_headings(document: &Html, base_url: &Url) -> BTreeMap<String, Option<String>> {
    let mut headings = BTreeMap::new();

    let (Ok(heading_selector), Ok(anchor_selector)) = (
        Selector::parse("h1, h2, h3, h4, h5, h6"),
        Selector::parse("a[href]"),
    ) else {
        return headings;
    };

    for heading in document.select(&heading_selector) {
        let text = collapse_whitespace(&heading.text().collect::<Vec<_>>().join(" "));
        if text.is_empty() {
            continue;
        }

        let link = heading
            .select(&anchor_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_href(href, base_url))
            .map(|url| url.to_string());

        headings.insert(text, link);
    }

    headings
}

/// Collects the visible text under `<body>` and strips script/style residue
pub fn extract_body_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };

    let mut fragments = Vec::new();
    for body in document.select(&body_selector) {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };

            let ignored = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|element| IGNORED_TEXT_PARENTS.contains(&element.name()))
                    .unwrap_or(false)
            });
            if ignored {
                continue;
            }

            let normalized = collapse_whitespace(text);
            if !normalized.is_empty() {
                fragments.push(normalized);
            }
        }
    }

    clean_text(&fragments.join(" "))
}

/// Applies the removal patterns in order and trims the result
pub fn clean_text(content: &str) -> String {
    let mut cleaned = content.to_string();
    for regex in REMOVAL_REGEXES.iter() {
        cleaned = regex.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

/// Finds literal http(s) URLs in plain text
fn extract_text_links(text: &str) -> Vec<Url> {
    TEXT_URL_PATTERN
        .find_iter(text)
        .filter_map(|m| normalize_url(m.as_str()).ok())
        .collect()
}

fn extract_pagination(document: &Html, base_url: &Url) -> PaginationCandidates {
    let years = Selector::parse(YEAR_OPTION_SELECTOR)
        .map(|selector| {
            document
                .select(&selector)
                .filter_map(|option| option.value().attr("value"))
                .filter(|value| !value.trim().is_empty())
                .filter_map(|value| resolve_href(value, base_url))
                .collect()
        })
        .unwrap_or_default();

    PaginationCandidates {
        next: select_hrefs(document, NEXT_SELECTOR, base_url).into_iter().next(),
        previous: select_hrefs(document, PREVIOUS_SELECTOR, base_url)
            .into_iter()
            .next(),
        numbered: select_hrefs(document, PAGE_NUMBER_SELECTOR, base_url),
        years,
    }
}

/// Resolves the `href` of every element matching `selector`, in document order
fn select_hrefs(document: &Html, selector: &str, base_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element: ElementRef| element.value().attr("href"))
        .filter_map(|href| resolve_href(href, base_url))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
