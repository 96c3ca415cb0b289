use papertitle_core::{Document, PageText, TextLine};

use crate::config::{ExtractionConfig, RegionBox};

/// A named slice of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Header,
    Content,
    Footer,
    Full,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::Content => "content",
            Region::Footer => "footer",
            Region::Full => "full",
        }
    }
}

/// Accumulated text per region across the pages that were read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionTexts {
    pub header: String,
    pub content: String,
    pub footer: String,
    pub full: String,
}

impl RegionTexts {
    pub fn get(&self, region: Region) -> &str {
        match region {
            Region::Header => &self.header,
            Region::Content => &self.content,
            Region::Footer => &self.footer,
            Region::Full => &self.full,
        }
    }

    fn get_mut(&mut self, region: Region) -> &mut String {
        match region {
            Region::Header => &mut self.header,
            Region::Content => &mut self.content,
            Region::Footer => &mut self.footer,
            Region::Full => &mut self.full,
        }
    }
}

/// Split the first `max_pages` pages of `doc` into region texts.
///
/// Each box is scaled to its own page's size. A line belongs to a region
/// when its vertical extent lies inside the box; within it only glyphs whose
/// origin falls inside the box horizontally are kept. Regions with no text
/// stay empty.
pub fn extract_regions(doc: &Document, config: &ExtractionConfig) -> RegionTexts {
    let mut out = RegionTexts::default();
    let regions = [
        (Region::Full, RegionBox::FULL),
        (Region::Header, config.header),
        (Region::Content, config.content),
        (Region::Footer, config.footer),
    ];

    for page in doc.pages.iter().take(config.max_pages) {
        for (region, frac) in regions {
            let text = crop_page(page, frac);
            if text.is_empty() {
                continue;
            }
            let buf = out.get_mut(region);
            if !buf.is_empty() {
                buf.push('\n');
            }
            buf.push_str(&text);
        }
    }
    out
}

fn crop_page(page: &PageText, frac: RegionBox) -> String {
    let x0 = frac.x0 * page.width;
    let x1 = frac.x1 * page.width;
    let y0 = frac.y0 * page.height;
    let y1 = frac.y1 * page.height;

    page.lines
        .iter()
        .filter(|l| l.bounds.y0 >= y0 && l.bounds.y1 <= y1)
        .map(|l| crop_line(l, x0, x1))
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn crop_line(line: &TextLine, x0: f32, x1: f32) -> String {
    line.chars
        .iter()
        .filter(|c| c.x >= x0 && c.x <= x1)
        .map(|c| c.ch)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use papertitle_core::Rect;

    fn page(lines: &[(&str, f32, f32)]) -> PageText {
        let mut p = PageText::new(600.0, 800.0);
        for (text, y0, y1) in lines {
            p.push_line(text, *y0, *y1);
        }
        p
    }

    #[test]
    fn lines_land_in_their_vertical_bands() {
        let mut doc = Document::new("x.pdf");
        doc.push_page(page(&[
            ("Journal Header", 10.0, 20.0),
            ("Body text line", 200.0, 212.0),
            ("Page footer 1", 700.0, 712.0),
        ]));
        let regions = extract_regions(&doc, &ExtractionConfig::default());
        assert_eq!(regions.header, "Journal Header");
        assert_eq!(regions.footer, "Page footer 1");
        assert!(regions.full.contains("Journal Header"));
        assert!(regions.full.contains("Page footer 1"));
        assert!(!regions.header.contains("Body"));
    }

    #[test]
    fn content_crops_glyphs_horizontally() {
        let mut p = PageText::new(100.0, 100.0);
        // glyphs at x = 0, 10, 20, ... 90; content keeps 10..=90
        p.lines.push(TextLine::from_text(
            "abcdefghij",
            Rect::new(0.0, 30.0, 100.0, 40.0),
        ));
        let mut doc = Document::new("x.pdf");
        doc.push_page(p);
        let regions = extract_regions(&doc, &ExtractionConfig::default());
        assert_eq!(regions.content, "bcdefghij");
        assert_eq!(regions.full, "abcdefghij");
    }

    #[test]
    fn pages_scale_independently_and_respect_max_pages() {
        let mut doc = Document::new("x.pdf");
        doc.push_page(page(&[("first page title", 400.0, 410.0)]));
        let mut small = PageText::new(300.0, 400.0);
        small.push_line("second page body", 200.0, 210.0);
        doc.push_page(small);
        doc.push_page(page(&[("second page body", 10.0, 20.0)]));
        doc.push_page(page(&[("fourth page", 400.0, 410.0)]));

        let regions = extract_regions(&doc, &ExtractionConfig::default());
        assert_eq!(regions.content, "first page title\nsecond page body");
        assert!(!regions.full.contains("fourth page"));
    }

    #[test]
    fn empty_document_yields_empty_regions() {
        let doc = Document::new("x.pdf");
        assert_eq!(
            extract_regions(&doc, &ExtractionConfig::default()),
            RegionTexts::default()
        );
    }
}
