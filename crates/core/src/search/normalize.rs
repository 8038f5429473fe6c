//! Query text canonicalization.
//!
//! The service groups results under the normalized form of each query, so
//! this has to produce exactly the same key the service would.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)|\[.*?\]").unwrap());
static HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static THE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bthe\b").unwrap());

/// UTF-8 right single quote decoded as cp1252.
const MISENCODED_APOSTROPHE: &str = "â€™";

/// Normalize a free-text card query.
///
/// Lowercases, drops parenthesized and bracketed parts, turns hyphen runs
/// into spaces, removes the word "the", strips ASCII punctuation and digits,
/// then collapses whitespace. An empty result is valid.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_brackets = BRACKETED.replace_all(&lowered, "");
    let dehyphenated = HYPHENS.replace_all(&without_brackets, " ");
    let without_word = THE_WORD.replace_all(&dehyphenated, "");
    let without_the: &str = without_word.as_ref();
    let without_the = without_the.strip_prefix("the ").unwrap_or(without_the);
    let fixed_quotes = without_the.replace(MISENCODED_APOSTROPHE, "'");

    let stripped: String = fixed_quotes
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_ascii_digit())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
