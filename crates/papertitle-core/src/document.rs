//! Backend-neutral view of an opened PDF.

use std::collections::HashMap;
use std::path::PathBuf;

/// Axis-aligned rectangle in page coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A single glyph with the x coordinate of its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedChar {
    pub ch: char,
    pub x: f32,
}

/// One line of text as laid out on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub bounds: Rect,
    pub chars: Vec<PositionedChar>,
}

impl TextLine {
    pub fn new(bounds: Rect, chars: Vec<PositionedChar>) -> Self {
        Self { bounds, chars }
    }

    /// Build a line from plain text, spreading glyph origins evenly across
    /// `bounds`. Used by synthetic documents.
    pub fn from_text(text: &str, bounds: Rect) -> Self {
        let n = text.chars().count().max(1) as f32;
        let step = bounds.width() / n;
        let chars = text
            .chars()
            .enumerate()
            .map(|(i, ch)| PositionedChar {
                ch,
                x: bounds.x0 + step * i as f32,
            })
            .collect();
        Self { bounds, chars }
    }

    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.ch).collect()
    }
}

/// Text of one page together with the page size it was measured against.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageText {
    pub width: f32,
    pub height: f32,
    pub lines: Vec<TextLine>,
}

impl PageText {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            lines: Vec::new(),
        }
    }

    /// Append a centred line of plain text spanning the middle 60% of the
    /// page width at the given vertical span.
    pub fn push_line(&mut self, text: &str, y0: f32, y1: f32) {
        let bounds = Rect::new(self.width * 0.2, y0, self.width * 0.8, y1);
        self.lines.push(TextLine::from_text(text, bounds));
    }

    pub fn full_text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Document-information fields consulted by the title pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Subject,
    Topic,
    Keywords,
    Author,
    CreationDate,
}

impl MetadataField {
    pub fn key(&self) -> &'static str {
        match self {
            MetadataField::Title => "title",
            MetadataField::Subject => "subject",
            MetadataField::Topic => "topic",
            MetadataField::Keywords => "keywords",
            MetadataField::Author => "author",
            MetadataField::CreationDate => "creation_date",
        }
    }
}

/// An opened PDF: metadata plus text for the first pages that were read.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub path: PathBuf,
    pub page_count: usize,
    /// The file was encrypted and opened with the empty password.
    pub encrypted: bool,
    pub metadata: HashMap<String, String>,
    pub pages: Vec<PageText>,
    /// Set when the document opened but reading page text failed.
    pub text_error: Option<String>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn metadata(&self, field: MetadataField) -> Option<&str> {
        self.metadata.get(field.key()).map(String::as_str)
    }

    pub fn set_metadata(&mut self, field: MetadataField, value: impl Into<String>) {
        self.metadata.insert(field.key().to_string(), value.into());
    }

    pub fn push_page(&mut self, page: PageText) {
        self.pages.push(page);
        self.page_count = self.page_count.max(self.pages.len());
    }

    pub fn first_page_text(&self) -> String {
        self.pages
            .first()
            .map(PageText::full_text)
            .unwrap_or_default()
    }
}
