use std::path::Path;

use mupdf::{MetadataName, TextPageFlags};

use papertitle_core::{
    BackendError, Document, MetadataField, PageText, PdfBackend, PositionedChar, Rect, TextLine,
};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// so that the heuristics and the renamer do not transitively depend on it.
///
/// MuPDF's document-information API has no `Topic` key, so documents
/// opened here never carry that field.
#[derive(Debug, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

const METADATA_FIELDS: [(MetadataField, MetadataName); 5] = [
    (MetadataField::Title, MetadataName::Title),
    (MetadataField::Subject, MetadataName::Subject),
    (MetadataField::Keywords, MetadataName::Keywords),
    (MetadataField::Author, MetadataName::Author),
    (MetadataField::CreationDate, MetadataName::CreationDate),
];

impl PdfBackend for MupdfBackend {
    fn open(&self, path: &Path, max_pages: usize) -> Result<Document, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::Open("invalid path encoding".into()))?;

        let mut pdf =
            mupdf::Document::open(path_str).map_err(|e| BackendError::Corrupted(e.to_string()))?;

        let mut doc = Document::new(path);

        if pdf
            .needs_password()
            .map_err(|e| BackendError::Corrupted(e.to_string()))?
        {
            doc.encrypted = true;
            match pdf.authenticate("") {
                Ok(true) => {
                    tracing::debug!(path = %path.display(), "decrypted with empty password");
                }
                _ => return Err(BackendError::Encrypted),
            }
        }

        for (field, name) in METADATA_FIELDS {
            if let Ok(value) = pdf.metadata(name)
                && !value.is_empty()
            {
                doc.set_metadata(field, value);
            }
        }

        let page_count = pdf
            .page_count()
            .map_err(|e| BackendError::Corrupted(e.to_string()))?;
        doc.page_count = usize::try_from(page_count).unwrap_or(0);

        let to_read = doc.page_count.min(max_pages);
        for index in 0..to_read {
            match read_page(&pdf, index as i32) {
                Ok(page) => doc.pages.push(page),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        page = index,
                        error = %e,
                        "page text extraction failed"
                    );
                    doc.text_error = Some(e.to_string());
                    break;
                }
            }
        }

        Ok(doc)
    }
}

fn read_page(pdf: &mupdf::Document, index: i32) -> Result<PageText, mupdf::Error> {
    let page = pdf.load_page(index)?;
    let bounds = page.bounds()?;
    let text_page = page.to_text_page(TextPageFlags::empty())?;

    let mut out = PageText::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);

    // Block/line iteration keeps MuPDF's reading order.
    for block in text_page.blocks() {
        for line in block.lines() {
            let lb = line.bounds();
            let chars: Vec<PositionedChar> = line
                .chars()
                .map(|c| PositionedChar {
                    ch: c.char().unwrap_or('\u{FFFD}'),
                    x: c.origin().x - bounds.x0,
                })
                .collect();
            if chars.is_empty() {
                continue;
            }
            out.lines.push(TextLine::new(
                Rect::new(
                    lb.x0 - bounds.x0,
                    lb.y0 - bounds.y0,
                    lb.x1 - bounds.x0,
                    lb.y1 - bounds.y0,
                ),
                chars,
            ));
        }
    }

    Ok(out)
}
