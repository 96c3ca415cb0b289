use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ExtractionConfig;

const MAX_INSTITUTION_CHARS: usize = 100;
const MAX_AUTHOR_CHARS: usize = 20;

/// First line mentioning an institution keyword, trimmed and cut to 100
/// characters.
pub fn extract_institution(text: &str, config: &ExtractionConfig) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| {
            let lower = line.to_lowercase();
            config
                .institution_keywords
                .iter()
                .any(|k| lower.contains(k.as_str()))
        })
        .map(|line| line.chars().take(MAX_INSTITUTION_CHARS).collect())
}

/// Most recent 19xx/20xx year mentioned in `text`.
pub fn extract_year(text: &str) -> Option<String> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

    YEAR_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u16>().ok())
        .max()
        .map(|y| y.to_string())
}

/// Best-effort first author surname.
///
/// Prefers a `Surname et al` mention; otherwise takes the first name of a
/// line that opens with a comma-separated run of capitalised names.
pub fn extract_author(text: &str) -> Option<String> {
    static ET_AL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+)\s+(?i:et\s+al)\b").unwrap());
    static NAME_LIST_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)(?:,\s*[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)+\s*$")
            .unwrap()
    });

    let raw = ET_AL_RE
        .captures(text)
        .or_else(|| NAME_LIST_RE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())?;

    Some(raw.chars().take(MAX_AUTHOR_CHARS).collect())
}
