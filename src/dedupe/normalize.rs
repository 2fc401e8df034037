//! Text normalization helpers for fuzzy duplicate detection.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a title for comparison: case-folded, punctuation removed,
/// whitespace collapsed. An all-punctuation or empty title normalizes to the
/// empty string, which never matches anything.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let folded: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    WHITESPACE_RUN.replace_all(folded.trim(), " ").into_owned()
}

/// Extract a comparable surname from the first author display string.
///
/// Handles both "Surname, Given" and "Given Surname" forms. Returns `None`
/// when there is no usable author; the conservative choice, since a fuzzy
/// match without author evidence is too risky.
#[must_use]
pub fn first_author_surname(authors: &[String]) -> Option<String> {
    let first = authors.iter().find(|a| !a.trim().is_empty())?;

    let surname = if let Some((family, _)) = first.split_once(',') {
        family.to_string()
    } else {
        first.split_whitespace().last()?.to_string()
    };

    let normalized: String = surname
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Whether two normalized titles refer to the same work: exact equality, or
/// Jaro-Winkler similarity at or above `threshold`. Empty titles never match.
#[must_use]
pub fn titles_match(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    strsim::jaro_winkler(a, b) >= threshold
}
