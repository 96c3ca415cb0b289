use std::path::Path;

pub mod config;
pub mod extractor;
pub mod region;
pub mod scoring;
pub mod secondary;
pub mod title;

pub use config::{ConfigError, ExtractionConfig, ExtractionConfigBuilder, ListOverride, RegionBox};
pub use extractor::TitleExtractor;
pub use region::{Region, RegionTexts, extract_regions};
pub use scoring::{ScoringWeights, is_valid_title, propose_title};
pub use title::{
    ContentStrategy, LowConfidenceStrategy, MetadataStrategy, Resolution, TitleContext,
    TitleStrategy,
};
// Re-export domain types from core (canonical definitions live there)
pub use papertitle_core::{BackendError, ExtractionResult, PdfBackend, TitleOutcome};

/// Extract a title from a PDF file with the default configuration.
///
/// Pipeline:
/// 1. Open the PDF via `backend` (empty-password decryption included)
/// 2. Try document metadata (title, subject, topic, keywords)
/// 3. Score candidate lines in the content, full, header and footer regions
/// 4. Fall back to the longest leading line, flagged low confidence
/// 5. Derive institution, author and year from the text the title came from
pub fn extract_title(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
) -> Result<ExtractionResult, BackendError> {
    TitleExtractor::new().extract(pdf_path, backend)
}
