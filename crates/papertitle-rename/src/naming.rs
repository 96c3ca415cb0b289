use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::sanitize::{finish, sanitize_title};

pub const PDF_EXTENSION: &str = ".pdf";

/// Prefix for files whose title could not be determined.
pub const DEFAULT_PREFIX: &str = "Unrecognized";

/// Longest file name most filesystems accept, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Bytes kept free for a `_N` dedup counter.
const COUNTER_RESERVE: usize = 8;

/// `<sanitized title>.pdf`, with the stem cut so the whole name fits in
/// `max_title_length` characters and in [`MAX_FILENAME_BYTES`] once a
/// counter is appended.
pub fn build_filename(title: &str, max_title_length: usize) -> String {
    let budget = max_title_length.saturating_sub(PDF_EXTENSION.len()).max(1);
    let sanitized = sanitize_title(title, max_title_length);
    let stem: String = sanitized.chars().take(budget).collect();
    let stem = truncate_bytes(&stem, MAX_FILENAME_BYTES - PDF_EXTENSION.len() - COUNTER_RESERVE);
    format!("{}{}", finish(stem), PDF_EXTENSION)
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char
/// boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `{prefix}_{YYYYmmdd_HHMMSS}.pdf` for files without a usable title.
pub fn default_filename(prefix: Option<&str>, at: DateTime<Local>) -> String {
    let prefix = prefix
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PREFIX);
    let stem = format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S"));
    format!("{}{}", sanitize_title(&stem, usize::MAX), PDF_EXTENSION)
}

/// Split `name.pdf` into (`name`, `.pdf`). Names without a dot have an
/// empty extension.
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(i) if i > 0 => filename.split_at(i),
        _ => (filename, ""),
    }
}

/// Run-wide count of generated file names.
///
/// The n-th registration of the same name (n >= 2) is suffixed `_{n-1}`.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    counts: HashMap<String, usize>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filename: &str) -> String {
        let count = self.counts.entry(filename.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return filename.to_string();
        }
        let (stem, ext) = split_extension(filename);
        format!("{}_{}{}", stem, *count - 1, ext)
    }

    pub fn count(&self, filename: &str) -> usize {
        self.counts.get(filename).copied().unwrap_or(0)
    }
}

/// Pick a destination in `dir` for `filename` that does not clobber an
/// existing file.
///
/// `base` is the name before [`NameRegistry`] added its counter, if any.
/// `current` is the file being renamed; landing on itself is allowed. On a
/// clash `_1`, `_2`, ... are appended to the stem of `base` until a free
/// name is found, so digits that belong to the title or timestamp survive.
pub fn resolve_collision(dir: &Path, filename: &str, base: &str, current: &Path) -> PathBuf {
    let is_free = |p: &Path| p == current || !p.exists();

    let target = dir.join(filename);
    if is_free(&target) {
        return target;
    }

    let (stem, ext) = split_extension(base);
    let mut counter = 1usize;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, counter, ext));
        if is_free(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn build_filename_appends_extension() {
        assert_eq!(
            build_filename("  Deep Learning for X  ", 150),
            "Deep Learning for X.pdf"
        );
    }

    #[test]
    fn build_filename_respects_budget() {
        let name = build_filename(&"abcdefghij".repeat(30), 150);
        assert_eq!(name.chars().count(), 150);
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn default_filename_uses_prefix_and_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            default_filename(None, at),
            "Unrecognized_20240309_140507.pdf"
        );
        assert_eq!(
            default_filename(Some("Lab: Misc"), at),
            "Lab - Misc_20240309_140507.pdf"
        );
        assert_eq!(
            default_filename(Some("   "), at),
            "Unrecognized_20240309_140507.pdf"
        );
    }

    #[test]
    fn registry_suffixes_repeats() {
        let mut reg = NameRegistry::new();
        assert_eq!(reg.register("A.pdf"), "A.pdf");
        assert_eq!(reg.register("A.pdf"), "A_1.pdf");
        assert_eq!(reg.register("B.pdf"), "B.pdf");
        assert_eq!(reg.register("A.pdf"), "A_2.pdf");
        assert_eq!(reg.count("A.pdf"), 3);
    }

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("a.b.pdf"), ("a.b", ".pdf"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn build_filename_caps_bytes_for_wide_scripts() {
        let name = build_filename(&"深度学习".repeat(50), 150);
        assert!(name.len() + COUNTER_RESERVE <= MAX_FILENAME_BYTES, "{} bytes", name.len());
        assert!(name.ends_with(".pdf"));
        assert!(name.starts_with("深度学习"));
    }

    #[test]
    fn collision_counts_from_registry_base() {
        let dir = tempfile::tempdir().unwrap();
        let me = dir.path().join("incoming.pdf");
        std::fs::write(&me, b"x").unwrap();
        std::fs::write(dir.path().join("Paper_1.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("Paper_2.pdf"), b"x").unwrap();

        let got = resolve_collision(dir.path(), "Paper_1.pdf", "Paper.pdf", &me);
        assert_eq!(got, dir.path().join("Paper_3.pdf"));

        let free = resolve_collision(dir.path(), "Fresh.pdf", "Fresh.pdf", &me);
        assert_eq!(free, dir.path().join("Fresh.pdf"));
    }

    #[test]
    fn collision_keeps_trailing_digits_of_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let me = dir.path().join("incoming.pdf");
        std::fs::write(&me, b"x").unwrap();
        let fallback = "Unrecognized_20240309_140507.pdf";
        std::fs::write(dir.path().join(fallback), b"x").unwrap();
        std::fs::write(dir.path().join("Paper-2.pdf"), b"x").unwrap();

        assert_eq!(
            resolve_collision(dir.path(), fallback, fallback, &me),
            dir.path().join("Unrecognized_20240309_140507_1.pdf")
        );
        assert_eq!(
            resolve_collision(dir.path(), "Paper-2.pdf", "Paper-2.pdf", &me),
            dir.path().join("Paper-2_1.pdf")
        );
    }

    #[test]
    fn renaming_onto_itself_is_not_a_collision() {
        let dir = tempfile::tempdir().unwrap();
        let me = dir.path().join("Same.pdf");
        std::fs::write(&me, b"x").unwrap();
        assert_eq!(resolve_collision(dir.path(), "Same.pdf", "Same.pdf", &me), me);
    }
}
