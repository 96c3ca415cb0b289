use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub mod config_file;
pub mod document;
pub mod mock;

pub use document::{Document, MetadataField, PageText, PositionedChar, Rect, TextLine};

/// Errors surfaced by a [`PdfBackend`] while opening a document.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The file could not be handed to the PDF library at all (bad path, I/O).
    #[error("failed to open PDF: {0}")]
    Open(String),
    /// The document is encrypted and the empty password was rejected.
    #[error("PDF is encrypted and could not be opened with an empty password")]
    Encrypted,
    /// The file is not a parseable PDF.
    #[error("PDF structure is corrupted: {0}")]
    Corrupted(String),
}

/// Trait for PDF backends.
///
/// A backend opens a file and returns a [`Document`]: the metadata
/// dictionary plus positioned text lines for the first `max_pages` pages.
/// Title heuristics never touch the PDF library directly, which keeps them
/// testable against synthetic documents (see [`mock::MockBackend`]).
pub trait PdfBackend: Send + Sync {
    fn open(&self, path: &Path, max_pages: usize) -> Result<Document, BackendError>;
}

/// How confident the pipeline is in a title it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Metadata,
    Content,
    LowConfidence,
}

/// Outcome of title resolution for one document.
///
/// A title exists only in the `Found` variant, so "title present iff the
/// status is metadata/content/low_confidence" holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    Found { title: String, tier: ConfidenceTier },
    Encrypted,
    Corrupted,
    NoTitleFound,
    ExtractionFailed,
}

/// Flat status tag for an extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Metadata,
    Content,
    LowConfidence,
    Encrypted,
    Corrupted,
    NoTitleFound,
    ExtractionFailed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Metadata => "metadata",
            ExtractionStatus::Content => "content",
            ExtractionStatus::LowConfidence => "low_confidence",
            ExtractionStatus::Encrypted => "encrypted",
            ExtractionStatus::Corrupted => "corrupted",
            ExtractionStatus::NoTitleFound => "no_title_found",
            ExtractionStatus::ExtractionFailed => "extraction_failed",
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the title pipeline on one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub outcome: TitleOutcome,
    pub institution: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
}

impl ExtractionResult {
    /// A result with no title and no secondary metadata.
    pub fn new(outcome: TitleOutcome) -> Self {
        Self {
            outcome,
            institution: None,
            author: None,
            year: None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.outcome {
            TitleOutcome::Found { title, .. } => Some(title),
            _ => None,
        }
    }

    pub fn status(&self) -> ExtractionStatus {
        match &self.outcome {
            TitleOutcome::Found { tier, .. } => match tier {
                ConfidenceTier::Metadata => ExtractionStatus::Metadata,
                ConfidenceTier::Content => ExtractionStatus::Content,
                ConfidenceTier::LowConfidence => ExtractionStatus::LowConfidence,
            },
            TitleOutcome::Encrypted => ExtractionStatus::Encrypted,
            TitleOutcome::Corrupted => ExtractionStatus::Corrupted,
            TitleOutcome::NoTitleFound => ExtractionStatus::NoTitleFound,
            TitleOutcome::ExtractionFailed => ExtractionStatus::ExtractionFailed,
        }
    }
}

/// Status recorded for one processed file in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Renamed from a metadata or content title.
    Success,
    /// Renamed from a low-confidence title.
    LowConfidence,
    /// No title found; renamed with the fallback pattern.
    DefaultNamed,
    Encrypted,
    Corrupted,
    RenameFailed,
    ProcessingError,
}

impl FileStatus {
    pub const ALL: [FileStatus; 7] = [
        FileStatus::Success,
        FileStatus::LowConfidence,
        FileStatus::DefaultNamed,
        FileStatus::Encrypted,
        FileStatus::Corrupted,
        FileStatus::RenameFailed,
        FileStatus::ProcessingError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Success => "success",
            FileStatus::LowConfidence => "low_confidence",
            FileStatus::DefaultNamed => "default_named",
            FileStatus::Encrypted => "encrypted",
            FileStatus::Corrupted => "corrupted",
            FileStatus::RenameFailed => "rename_failed",
            FileStatus::ProcessingError => "processing_error",
        }
    }

    /// Whether this status counts as a failure in the run summary.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileStatus::DefaultNamed | FileStatus::RenameFailed | FileStatus::ProcessingError
        )
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the rename report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub original_filename: String,
    /// Directory the file lived in when it was processed.
    pub original_path: String,
    pub extracted_title: Option<String>,
    /// The title as it appears in the new filename (sanitized, no extension).
    pub derived_title: Option<String>,
    pub institution: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
    pub new_filename: String,
    pub status: FileStatus,
    pub timestamp: String,
    pub error_message: Option<String>,
}

/// Counters accumulated during a batch walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub total_files: usize,
    pub pdf_files: usize,
    pub renamed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub encrypted: usize,
    pub corrupted: usize,
}

/// Count records per status, in [`FileStatus::ALL`] order, omitting zeros.
pub fn status_counts(records: &[FileRecord]) -> Vec<(FileStatus, usize)> {
    FileStatus::ALL
        .iter()
        .map(|s| (*s, records.iter().filter(|r| r.status == *s).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}
