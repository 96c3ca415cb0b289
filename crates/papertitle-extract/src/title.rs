//! Ordered title strategies.
//!
//! Each strategy looks at the opened document and either settles on a title
//! or passes. [`resolve_title`] runs them in order and stops at the first
//! one that answers.

use once_cell::unsync::OnceCell;

use papertitle_core::{ConfidenceTier, Document, MetadataField};

use crate::config::ExtractionConfig;
use crate::region::{Region, RegionTexts, extract_regions};
use crate::scoring::{is_numeric, is_valid_title, propose_title};

/// A title chosen by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub title: String,
    pub tier: ConfidenceTier,
    /// Where the title came from (`"title"`, `"content"`, ...), for logs.
    pub source: &'static str,
}

/// Inputs shared by every strategy for one document.
///
/// Region text is computed on first use so a metadata hit never scans pages.
pub struct TitleContext<'a> {
    pub doc: &'a Document,
    pub config: &'a ExtractionConfig,
    regions: OnceCell<RegionTexts>,
}

impl<'a> TitleContext<'a> {
    pub fn new(doc: &'a Document, config: &'a ExtractionConfig) -> Self {
        Self {
            doc,
            config,
            regions: OnceCell::new(),
        }
    }

    pub fn regions(&self) -> &RegionTexts {
        self.regions
            .get_or_init(|| extract_regions(self.doc, self.config))
    }

    /// Whether region text has been computed yet.
    pub fn regions_scanned(&self) -> bool {
        self.regions.get().is_some()
    }
}

/// One step of the title fallback chain.
pub trait TitleStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, ctx: &TitleContext<'_>) -> Option<Resolution>;
}

/// Document-information fields, in priority order.
///
/// A non-placeholder `title` is taken as is; the other fields must also
/// pass [`is_valid_title`].
pub struct MetadataStrategy;

const METADATA_ORDER: [MetadataField; 4] = [
    MetadataField::Title,
    MetadataField::Subject,
    MetadataField::Topic,
    MetadataField::Keywords,
];

impl TitleStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn resolve(&self, ctx: &TitleContext<'_>) -> Option<Resolution> {
        METADATA_ORDER.iter().find_map(|field| {
            let value = ctx.doc.metadata(*field)?.trim();
            if ctx.config.is_placeholder(value) {
                return None;
            }
            let accepted = *field == MetadataField::Title || is_valid_title(value, ctx.config);
            accepted.then(|| Resolution {
                title: value.to_string(),
                tier: ConfidenceTier::Metadata,
                source: field.key(),
            })
        })
    }
}

/// Scored candidate lines, region by region.
pub struct ContentStrategy;

const CONTENT_ORDER: [Region; 4] = [Region::Content, Region::Full, Region::Header, Region::Footer];

impl TitleStrategy for ContentStrategy {
    fn name(&self) -> &'static str {
        "content"
    }

    fn resolve(&self, ctx: &TitleContext<'_>) -> Option<Resolution> {
        let regions = ctx.regions();
        CONTENT_ORDER.iter().find_map(|region| {
            let title = propose_title(regions.get(*region), ctx.config)?;
            is_valid_title(&title, ctx.config).then(|| Resolution {
                title,
                tier: ConfidenceTier::Content,
                source: region.name(),
            })
        })
    }
}

/// Longest of the first pooled lines across every region, unvalidated.
pub struct LowConfidenceStrategy;

const POOL_ORDER: [Region; 4] = [Region::Full, Region::Header, Region::Content, Region::Footer];

impl TitleStrategy for LowConfidenceStrategy {
    fn name(&self) -> &'static str {
        "low_confidence"
    }

    fn resolve(&self, ctx: &TitleContext<'_>) -> Option<Resolution> {
        let regions = ctx.regions();
        let pool: Vec<&str> = POOL_ORDER
            .iter()
            .flat_map(|r| regions.get(*r).lines())
            .map(str::trim)
            .filter(|l| l.chars().count() > 5)
            .take(10)
            .filter(|l| !is_numeric(l))
            .collect();

        let mut best: Option<&str> = None;
        for line in pool {
            if best.is_none_or(|b| line.chars().count() > b.chars().count()) {
                best = Some(line);
            }
        }
        best.map(|title| Resolution {
            title: title.to_string(),
            tier: ConfidenceTier::LowConfidence,
            source: "pooled",
        })
    }
}

/// The built-in chain: metadata, content, low confidence.
pub fn default_strategies() -> Vec<Box<dyn TitleStrategy>> {
    vec![
        Box::new(MetadataStrategy),
        Box::new(ContentStrategy),
        Box::new(LowConfidenceStrategy),
    ]
}

/// Run `strategies` in order; the first answer wins.
pub fn resolve_title(
    strategies: &[Box<dyn TitleStrategy>],
    ctx: &TitleContext<'_>,
) -> Option<Resolution> {
    for strategy in strategies {
        if let Some(found) = strategy.resolve(ctx) {
            tracing::debug!(
                path = %ctx.doc.path.display(),
                strategy = strategy.name(),
                source = found.source,
                "title resolved"
            );
            return Some(found);
        }
        tracing::trace!(path = %ctx.doc.path.display(), strategy = strategy.name(), "no title");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use papertitle_core::PageText;

    fn doc_with_lines(lines: &[&str]) -> Document {
        let mut page = PageText::new(600.0, 800.0);
        for (i, text) in lines.iter().enumerate() {
            let y = 150.0 + 20.0 * i as f32;
            page.push_line(text, y, y + 12.0);
        }
        let mut doc = Document::new("paper.pdf");
        doc.push_page(page);
        doc
    }

    #[test]
    fn metadata_title_bypasses_validity() {
        let mut doc = Document::new("x.pdf");
        doc.set_metadata(MetadataField::Title, "  Short  ");
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        let r = MetadataStrategy.resolve(&ctx).unwrap();
        assert_eq!(r.title, "Short");
        assert_eq!(r.tier, ConfidenceTier::Metadata);
        assert!(!ctx.regions_scanned());
    }

    #[test]
    fn metadata_subject_must_be_valid() {
        let mut doc = Document::new("x.pdf");
        doc.set_metadata(MetadataField::Title, "untitled");
        doc.set_metadata(MetadataField::Subject, "misc");
        doc.set_metadata(MetadataField::Keywords, "A Survey of Federated Learning Systems");
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        let r = MetadataStrategy.resolve(&ctx).unwrap();
        assert_eq!(r.source, "keywords");
        assert_eq!(r.title, "A Survey of Federated Learning Systems");
    }

    #[test]
    fn metadata_topic_consulted_before_keywords() {
        let mut doc = Document::new("x.pdf");
        doc.set_metadata(MetadataField::Topic, "Graph Neural Networks in Practice");
        doc.set_metadata(MetadataField::Keywords, "A Survey of Federated Learning Systems");
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        assert_eq!(MetadataStrategy.resolve(&ctx).unwrap().source, "topic");
    }

    #[test]
    fn content_strategy_picks_scored_line() {
        let doc = doc_with_lines(&[
            "Journal of Things",
            "Vol. 3",
            "A Robust Method for Federated Unlearning via Bloom Filters",
            "Jane Doe, John Roe",
        ]);
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        let r = ContentStrategy.resolve(&ctx).unwrap();
        assert_eq!(
            r.title,
            "A Robust Method for Federated Unlearning via Bloom Filters"
        );
        assert_eq!(r.source, "content");
    }

    fn doc_with_spans(lines: &[(&str, f32, f32)]) -> Document {
        let mut page = PageText::new(600.0, 800.0);
        for (text, y0, y1) in lines {
            page.push_line(text, *y0, *y1);
        }
        let mut doc = Document::new("paper.pdf");
        doc.push_page(page);
        doc
    }

    // "Page Two Of" is the only scorable line of the full page and is too
    // short to be valid; the year keeps the real title out of scoring.

    #[test]
    fn content_falls_back_to_header_band() {
        let doc = doc_with_spans(&[
            ("Federated Learning Survey 2024", 10.0, 22.0),
            ("Page Two Of", 700.0, 712.0),
        ]);
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        let r = ContentStrategy.resolve(&ctx).unwrap();
        assert_eq!(r.title, "Federated Learning Survey 2024");
        assert_eq!(r.tier, ConfidenceTier::Content);
        assert_eq!(r.source, "header");
    }

    #[test]
    fn content_falls_back_to_footer_band() {
        let doc = doc_with_spans(&[
            ("Page Two Of", 10.0, 22.0),
            ("Federated Learning Survey 2024", 700.0, 712.0),
        ]);
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        let r = ContentStrategy.resolve(&ctx).unwrap();
        assert_eq!(r.title, "Federated Learning Survey 2024");
        assert_eq!(r.tier, ConfidenceTier::Content);
        assert_eq!(r.source, "footer");
    }

    #[test]
    fn low_confidence_takes_longest_pooled_line() {
        let doc = doc_with_lines(&["abcdef", "123456789", "Hi there you"]);
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        assert!(ContentStrategy.resolve(&ctx).is_none());
        let r = LowConfidenceStrategy.resolve(&ctx).unwrap();
        assert_eq!(r.title, "Hi there you");
        assert_eq!(r.tier, ConfidenceTier::LowConfidence);
    }

    #[test]
    fn chain_stops_at_first_answer() {
        struct Never;
        impl TitleStrategy for Never {
            fn name(&self) -> &'static str {
                "never"
            }
            fn resolve(&self, _ctx: &TitleContext<'_>) -> Option<Resolution> {
                panic!("later strategy must not run");
            }
        }

        let mut doc = Document::new("x.pdf");
        doc.set_metadata(MetadataField::Title, "Deep Learning for X");
        let config = ExtractionConfig::default();
        let ctx = TitleContext::new(&doc, &config);
        let chain: Vec<Box<dyn TitleStrategy>> = vec![Box::new(MetadataStrategy), Box::new(Never)];
        let r = resolve_title(&chain, &ctx).unwrap();
        assert_eq!(r.title, "Deep Learning for X");
    }
}
