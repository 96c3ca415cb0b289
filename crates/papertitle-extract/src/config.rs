use regex::Regex;

use papertitle_core::config_file::ConfigFile;

use crate::scoring::ScoringWeights;

pub const DEFAULT_MAX_PAGES: usize = 3;
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 150;

pub const DEFAULT_TITLE_KEYWORDS: &[&str] = &[
    "research",
    "study",
    "investigation",
    "analysis",
    "method",
    "approach",
    "algorithm",
    "model",
    "system",
    "framework",
    "technique",
    "solution",
    "theory",
    "design",
    "implementation",
    "evaluation",
    "comparison",
];

pub const DEFAULT_INSTITUTION_KEYWORDS: &[&str] = &[
    "university",
    "institute",
    "lab",
    "laboratory",
    "school",
    "college",
    "department",
    "center",
    "faculty",
    "academy",
    "research",
    "institute of",
    "university of",
    "dept.",
    "school of",
    "college of",
];

/// Metadata values that mean "no title" (compared lowercase, trimmed).
pub const DEFAULT_PLACEHOLDER_TITLES: &[&str] = &["", "untitled", "unnamed", "no title"];

/// Markers of lines that are not titles: years, volume/page references,
/// links, contact details and section headings.
pub const DEFAULT_EXCLUSION_PATTERN: &str =
    r"(?i)\d{4}|vol\.|no\.|pp\.|et al|DOI|http|www|@|email|abstract|introduction";

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

impl ListOverride<String> {
    /// Build from a config-file pair: `replace` wins over `extend`.
    pub fn from_options(replace: Option<Vec<String>>, extend: Option<Vec<String>>) -> Self {
        match (replace, extend) {
            (Some(v), _) => ListOverride::Replace(v),
            (None, Some(v)) => ListOverride::Extend(v),
            (None, None) => ListOverride::Default,
        }
    }
}

/// A region as fractions of page width/height, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl RegionBox {
    pub const HEADER: RegionBox = RegionBox::new(0.0, 0.0, 1.0, 0.15);
    pub const CONTENT: RegionBox = RegionBox::new(0.1, 0.1, 0.9, 0.8);
    pub const FOOTER: RegionBox = RegionBox::new(0.0, 0.8, 1.0, 1.0);
    pub const FULL: RegionBox = RegionBox::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    fn is_well_formed(&self) -> bool {
        let unit = 0.0..=1.0;
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| unit.contains(v))
            && self.x0 < self.x1
            && self.y0 < self.y1
    }
}

/// Errors from [`ExtractionConfigBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("region {name} is not a box inside the page: {region:?}")]
    Region { name: &'static str, region: RegionBox },
}

/// Configuration for the title extraction pipeline.
///
/// Keyword lists are stored resolved and lowercased. Use
/// [`ExtractionConfigBuilder`] to override defaults.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub(crate) max_pages: usize,
    pub(crate) max_title_length: usize,
    pub(crate) title_keywords: Vec<String>,
    pub(crate) institution_keywords: Vec<String>,
    pub(crate) placeholder_titles: Vec<String>,
    pub(crate) exclusion_patterns: Vec<Regex>,
    pub(crate) header: RegionBox,
    pub(crate) content: RegionBox,
    pub(crate) footer: RegionBox,
    pub(crate) scoring_weights: ScoringWeights,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        // The default pattern is a literal; it always compiles.
        ExtractionConfigBuilder::new()
            .build()
            .unwrap_or_else(|e| unreachable!("default extraction config is valid: {e}"))
    }
}

impl ExtractionConfig {
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn max_title_length(&self) -> usize {
        self.max_title_length
    }

    pub fn title_keywords(&self) -> &[String] {
        &self.title_keywords
    }

    pub fn institution_keywords(&self) -> &[String] {
        &self.institution_keywords
    }

    pub fn scoring_weights(&self) -> &ScoringWeights {
        &self.scoring_weights
    }

    pub(crate) fn has_title_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.title_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    pub(crate) fn is_excluded(&self, line: &str) -> bool {
        self.exclusion_patterns.iter().any(|re| re.is_match(line))
    }

    pub(crate) fn is_placeholder(&self, value: &str) -> bool {
        let lower = value.trim().to_lowercase();
        self.placeholder_titles.iter().any(|p| *p == lower)
    }
}

/// Builder for [`ExtractionConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast if any pattern is invalid or a region box is malformed.
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfigBuilder {
    max_pages: Option<usize>,
    max_title_length: Option<usize>,
    title_keywords: ListOverride<String>,
    institution_keywords: ListOverride<String>,
    placeholder_titles: ListOverride<String>,
    exclusion_patterns: ListOverride<String>,
    header: Option<RegionBox>,
    content: Option<RegionBox>,
    footer: Option<RegionBox>,
    scoring_weights: Option<ScoringWeights>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[extraction]` and `[scoring]` config sections.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let mut builder = Self::new();
        if let Some(e) = &file.extraction {
            builder.max_pages = e.max_pages;
            builder.max_title_length = e.max_title_length;
            builder.title_keywords = ListOverride::from_options(
                e.title_keywords.clone(),
                e.extra_title_keywords.clone(),
            );
            builder.institution_keywords = ListOverride::from_options(
                e.institution_keywords.clone(),
                e.extra_institution_keywords.clone(),
            );
            builder.header = e.header_region.map(RegionBox::from_array);
            builder.content = e.content_region.map(RegionBox::from_array);
            builder.footer = e.footer_region.map(RegionBox::from_array);
        }
        if let Some(s) = &file.scoring {
            let mut w = ScoringWeights::default();
            w.max_candidates = s.max_candidates.unwrap_or(w.max_candidates);
            w.min_length = s.min_length.unwrap_or(w.min_length);
            w.max_length = s.max_length.unwrap_or(w.max_length);
            w.min_words = s.min_words.unwrap_or(w.min_words);
            w.max_words = s.max_words.unwrap_or(w.max_words);
            w.min_upper_ratio = s.min_upper_ratio.unwrap_or(w.min_upper_ratio);
            w.max_upper_ratio = s.max_upper_ratio.unwrap_or(w.max_upper_ratio);
            w.length = s.length_weight.unwrap_or(w.length);
            w.words = s.words_weight.unwrap_or(w.words);
            w.case = s.case_weight.unwrap_or(w.case);
            w.keyword = s.keyword_weight.unwrap_or(w.keyword);
            builder.scoring_weights = Some(w);
        }
        builder
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.max_pages = Some(n);
        self
    }

    pub fn max_title_length(mut self, n: usize) -> Self {
        self.max_title_length = Some(n);
        self
    }

    pub fn title_keywords(mut self, keywords: ListOverride<String>) -> Self {
        self.title_keywords = keywords;
        self
    }

    pub fn add_title_keyword(mut self, keyword: String) -> Self {
        match &mut self.title_keywords {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(keyword),
            ListOverride::Default => self.title_keywords = ListOverride::Extend(vec![keyword]),
        }
        self
    }

    pub fn institution_keywords(mut self, keywords: ListOverride<String>) -> Self {
        self.institution_keywords = keywords;
        self
    }

    pub fn placeholder_titles(mut self, values: ListOverride<String>) -> Self {
        self.placeholder_titles = values;
        self
    }

    pub fn exclusion_patterns(mut self, patterns: ListOverride<String>) -> Self {
        self.exclusion_patterns = patterns;
        self
    }

    pub fn header_region(mut self, region: RegionBox) -> Self {
        self.header = Some(region);
        self
    }

    pub fn content_region(mut self, region: RegionBox) -> Self {
        self.content = Some(region);
        self
    }

    pub fn footer_region(mut self, region: RegionBox) -> Self {
        self.footer = Some(region);
        self
    }

    pub fn scoring_weights(mut self, weights: ScoringWeights) -> Self {
        self.scoring_weights = Some(weights);
        self
    }

    /// Compile all string patterns and produce an [`ExtractionConfig`].
    pub fn build(self) -> Result<ExtractionConfig, ConfigError> {
        let owned = |defaults: &[&str]| -> Vec<String> {
            defaults.iter().map(|s| s.to_string()).collect()
        };
        let lowered = |list: Vec<String>| -> Vec<String> {
            list.into_iter().map(|s| s.to_lowercase()).collect()
        };

        let exclusion_patterns = self
            .exclusion_patterns
            .resolve(&[DEFAULT_EXCLUSION_PATTERN.to_string()])
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let check = |name: &'static str, region: RegionBox| -> Result<RegionBox, ConfigError> {
            if region.is_well_formed() {
                Ok(region)
            } else {
                Err(ConfigError::Region { name, region })
            }
        };

        Ok(ExtractionConfig {
            max_pages: self.max_pages.unwrap_or(DEFAULT_MAX_PAGES).max(1),
            max_title_length: self.max_title_length.unwrap_or(DEFAULT_MAX_TITLE_LENGTH),
            title_keywords: lowered(self.title_keywords.resolve(&owned(DEFAULT_TITLE_KEYWORDS))),
            institution_keywords: lowered(
                self.institution_keywords
                    .resolve(&owned(DEFAULT_INSTITUTION_KEYWORDS)),
            ),
            placeholder_titles: lowered(
                self.placeholder_titles
                    .resolve(&owned(DEFAULT_PLACEHOLDER_TITLES)),
            ),
            exclusion_patterns,
            header: check("header", self.header.unwrap_or(RegionBox::HEADER))?,
            content: check("content", self.content.unwrap_or(RegionBox::CONTENT))?,
            footer: check("footer", self.footer.unwrap_or(RegionBox::FOOTER))?,
            scoring_weights: self.scoring_weights.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papertitle_core::config_file::{ExtractionSection, ScoringSection};

    #[test]
    fn default_config() {
        let config = ExtractionConfig::default();
        assert_eq!(config.max_pages(), 3);
        assert_eq!(config.max_title_length(), 150);
        assert_eq!(config.title_keywords().len(), 17);
        assert_eq!(config.content, RegionBox::CONTENT);
        assert!(config.is_placeholder("  Untitled "));
        assert!(config.is_placeholder(""));
        assert!(!config.is_placeholder("Deep Learning"));
    }

    #[test]
    fn exclusion_markers_are_case_insensitive() {
        let config = ExtractionConfig::default();
        assert!(config.is_excluded("doi:10.1000/xyz"));
        assert!(config.is_excluded("Published 2021"));
        assert!(config.is_excluded("ABSTRACT"));
        assert!(!config.is_excluded("Graph Neural Networks for Molecules"));
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        let result = ExtractionConfigBuilder::new()
            .exclusion_patterns(ListOverride::Extend(vec!["[invalid".into()]))
            .build();
        assert!(matches!(result, Err(ConfigError::Regex(_))));
    }

    #[test]
    fn inverted_region_is_rejected() {
        let result = ExtractionConfigBuilder::new()
            .header_region(RegionBox::new(0.0, 0.5, 1.0, 0.1))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::Region { name: "header", .. })
        ));
    }

    #[test]
    fn keywords_extend_and_lowercase() {
        let config = ExtractionConfigBuilder::new()
            .add_title_keyword("Survey".into())
            .build()
            .unwrap();
        assert!(config.title_keywords().contains(&"survey".to_string()));
        assert!(config.has_title_keyword("A SURVEY of Graphs"));
    }

    #[test]
    fn list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(e.resolve(&defaults).len(), 3);
    }

    #[test]
    fn from_config_file_applies_sections() {
        let file = ConfigFile {
            extraction: Some(ExtractionSection {
                max_pages: Some(1),
                title_keywords: Some(vec!["Survey".into()]),
                content_region: Some([0.0, 0.0, 1.0, 0.5]),
                ..Default::default()
            }),
            scoring: Some(ScoringSection {
                keyword_weight: Some(10),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = ExtractionConfigBuilder::from_config_file(&file)
            .build()
            .unwrap();
        assert_eq!(config.max_pages(), 1);
        assert_eq!(config.title_keywords(), &["survey".to_string()]);
        assert_eq!(config.content, RegionBox::new(0.0, 0.0, 1.0, 0.5));
        assert_eq!(config.scoring_weights().keyword, 10);
        assert_eq!(config.scoring_weights().length, 2);
    }
}
