//! Bare URL detection over literal text.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static URL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://\S+|[A-Za-z0-9][A-Za-z0-9-]*(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}(?:[/?#]\S*)?)$",
    )
    .unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', '*', '~'];

/// Byte ranges of URL-like words in `text`.
///
/// Only whole whitespace-delimited words are considered, so a URL glued to
/// markup (`(https://…`) is left for the markup to claim.
pub fn find_urls(text: &str) -> Vec<Range<usize>> {
    let mut urls = Vec::new();
    let mut word_start = None;
    for (index, ch) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
        match (ch.is_whitespace(), word_start) {
            (true, Some(start)) => {
                if let Some(url) = url_in_word(&text[start..index]) {
                    urls.push(start..start + url);
                }
                word_start = None;
            }
            (false, None) => word_start = Some(index),
            _ => {}
        }
    }
    urls
}

/// Length of the URL a word consists of, if it is one
fn url_in_word(word: &str) -> Option<usize> {
    let mut trimmed = word.trim_end_matches(TRAILING_PUNCTUATION);
    // An unbalanced closing parenthesis belongs to the surrounding prose
    while trimmed.ends_with(')') && !trimmed.contains('(') {
        trimmed = trimmed[..trimmed.len() - 1].trim_end_matches(TRAILING_PUNCTUATION);
    }
    URL_WORD.is_match(trimmed).then_some(trimmed.len())
}
