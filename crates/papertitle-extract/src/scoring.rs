//! Title-likeness scoring for lines of extracted text.
//!
//! A region's text is cut into lines, the first few meaningful ones are
//! scored on length, word count, capitalisation and keyword hits, and the
//! best scoring line is proposed as a title. Nothing here checks whether the
//! proposal is good enough; that is [`is_valid_title`]'s job.

use crate::config::ExtractionConfig;

/// Thresholds and weights for candidate scoring.
///
/// Range checks are strict on both ends (`min < value < max`).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    /// Only this many meaningful lines from the top of a region are scored.
    pub max_candidates: usize,
    /// A line needs at least this many words to be scored at all.
    pub eligible_min_words: usize,
    /// A line must be longer than this to be scored at all.
    pub eligible_min_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub min_words: usize,
    pub max_words: usize,
    pub min_upper_ratio: f32,
    pub max_upper_ratio: f32,
    pub length: i32,
    pub words: i32,
    pub case: i32,
    pub keyword: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            eligible_min_words: 3,
            eligible_min_length: 10,
            min_length: 15,
            max_length: 200,
            min_words: 4,
            max_words: 30,
            min_upper_ratio: 0.2,
            max_upper_ratio: 0.8,
            length: 2,
            words: 2,
            case: 1,
            keyword: 3,
        }
    }
}

/// A scored line.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub text: &'a str,
    pub length: usize,
    pub words: usize,
    pub upper_ratio: f32,
    pub score: i32,
}

/// Lines that are non-empty after trimming and longer than 3 characters.
pub fn meaningful_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| l.chars().count() > 3)
        .collect()
}

pub(crate) fn is_numeric(line: &str) -> bool {
    !line.is_empty() && line.chars().all(char::is_numeric)
}

fn upper_ratio(line: &str, length: usize) -> f32 {
    let upper = line.chars().filter(|c| c.is_uppercase()).count();
    upper as f32 / length.max(1) as f32
}

/// Score one line, or `None` if it carries an exclusion marker or is too
/// short to be considered.
pub fn score_line<'a>(line: &'a str, config: &ExtractionConfig) -> Option<Candidate<'a>> {
    let w = &config.scoring_weights;
    if config.is_excluded(line) {
        return None;
    }
    let length = line.chars().count();
    let words = line.split_whitespace().count();
    if words < w.eligible_min_words || length <= w.eligible_min_length {
        return None;
    }

    let upper_ratio = upper_ratio(line, length);
    let mut score = 0;
    if w.min_length < length && length < w.max_length {
        score += w.length;
    }
    if w.min_words < words && words < w.max_words {
        score += w.words;
    }
    if w.min_upper_ratio < upper_ratio && upper_ratio < w.max_upper_ratio {
        score += w.case;
    }
    if config.has_title_keyword(line) {
        score += w.keyword;
    }

    Some(Candidate {
        text: line,
        length,
        words,
        upper_ratio,
        score,
    })
}

/// Score the leading meaningful lines of `lines`, in order.
pub fn score_candidates<'a>(lines: &[&'a str], config: &ExtractionConfig) -> Vec<Candidate<'a>> {
    lines
        .iter()
        .copied()
        .take(config.scoring_weights.max_candidates)
        .filter_map(|line| score_line(line, config))
        .collect()
}

/// Propose a title from a block of region text.
///
/// Returns the highest scoring candidate (earliest wins ties). When nothing
/// is eligible, falls back to the first of the top five lines that is longer
/// than 15 characters and not purely numeric, then to the first meaningful
/// line.
pub fn propose_title(text: &str, config: &ExtractionConfig) -> Option<String> {
    let lines = meaningful_lines(text);
    if lines.is_empty() {
        return None;
    }

    let candidates = score_candidates(&lines, config);
    let mut best: Option<&Candidate<'_>> = None;
    for c in &candidates {
        if best.is_none_or(|b| c.score > b.score) {
            best = Some(c);
        }
    }
    if let Some(best) = best {
        return Some(best.text.to_string());
    }

    lines
        .iter()
        .take(5)
        .copied()
        .find(|l| l.chars().count() > 15 && !is_numeric(l))
        .or_else(|| lines.first().copied())
        .map(str::to_string)
}

/// Whether a proposed title is plausible enough to use.
///
/// Requires at least 5 characters after trimming, and either a title
/// keyword or at least three words with more than 15 characters.
pub fn is_valid_title(title: &str, config: &ExtractionConfig) -> bool {
    let trimmed = title.trim();
    if trimmed.chars().count() < 5 {
        return false;
    }
    if config.has_title_keyword(trimmed) {
        return true;
    }
    trimmed.split_whitespace().count() >= 3 && trimmed.chars().count() > 15
}
