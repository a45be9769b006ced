//! Text handling around model calls: chunking, boilerplate stripping, sentinel detection

use regex::Regex;
use std::sync::LazyLock;

/// Reply the model gives when a page has nothing worth extracting
pub const NO_CONTENT_SENTINEL: &str = "NO PRESS RELEASE CONTENT";

/// One or more "Here is/are ...:" preambles at the start of a reply
///
/// Text before the phrase stays on its line and holds no sentence break or colon, so
/// content such as "Revenue rose. There are three drivers:" is never taken.
#[allow(clippy::expect_used)]
static LEADING_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[^\n.:]*?\b(?:here is|here are)\b[^\n:]*:\s*)+")
        .expect("leading phrase regex is valid") // Static pattern, safe to panic
});

/// Splits `text` into ordered, non-overlapping chunks of at most `max_chars` characters
///
/// Splits on character boundaries, never inside a UTF-8 sequence. Empty text yields no
/// chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Removes a leading "Here is/are ...:" preamble and trims the result
///
/// The pattern is applied once. It consumes every consecutive preamble, so a stripped
/// result never starts with another one and stripping twice changes nothing.
pub fn strip_leading_phrase(text: &str) -> String {
    LEADING_PHRASE.replace(text.trim(), "").trim().to_string()
}

/// True when a model reply signals there was nothing to extract
pub fn is_no_content(result: &str) -> bool {
    result.to_uppercase().contains("NO PRESS RELEASE")
}
