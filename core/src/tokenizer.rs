use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\p{L}\p{N}_\s]").expect("valid regex");
}

/// Lowercase and replace every character that is not a letter, digit, `_` or whitespace with a space.
///
/// Combining marks and joiners split terms too, so `cafe\u{301}` becomes `cafe`.
pub fn clean_text(text: &str) -> String {
    NON_WORD.replace_all(&text.to_lowercase(), " ").into_owned()
}

/// Normalize text into terms. Used identically for documents and queries.
pub fn normalize(text: &str) -> Vec<String> {
    clean_text(text).split_whitespace().map(str::to_owned).collect()
}

/// Terms joined back with single spaces.
pub fn normalize_to_string(text: &str) -> String {
    normalize(text).join(" ")
}
