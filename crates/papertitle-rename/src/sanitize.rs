use once_cell::sync::Lazy;
use regex::Regex;

/// Used when a title sanitizes down to nothing usable.
pub const FALLBACK_LABEL: &str = "Untitled";

/// Characters that are illegal in file names on common filesystems, and
/// what they become.
const REPLACEMENTS: &[(char, &str)] = &[
    ('<', "("),
    ('>', ")"),
    (':', " -"),
    ('"', ""),
    ('/', "-"),
    ('\\', "-"),
    ('|', "-"),
    ('?', ""),
    ('*', ""),
];

/// Turn a raw title into a safe file stem of at most `max_chars` characters.
///
/// Idempotent: sanitizing an already sanitized stem returns it unchanged.
pub fn sanitize_title(raw: &str, max_chars: usize) -> String {
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\.\s*").unwrap());

    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match REPLACEMENTS.iter().find(|(c, _)| *c == ch) {
            Some((_, rep)) => out.push_str(rep),
            None => out.push(ch),
        }
    }

    let collapsed = WS_RE.replace_all(&out, " ");
    let collapsed = DOT_RE.replace_all(collapsed.trim(), ".");
    let truncated: String = collapsed.chars().take(max_chars).collect();
    finish(&truncated)
}

/// Strip edge underscores/whitespace and substitute the fallback label for
/// stems without a single letter or digit.
pub(crate) fn finish(stem: &str) -> String {
    let trimmed = stem.trim_matches(|c: char| c == '_' || c.is_whitespace());
    if trimmed.chars().any(char::is_alphanumeric) {
        trimmed.to_string()
    } else {
        FALLBACK_LABEL.to_string()
    }
}
