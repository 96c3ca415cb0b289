use std::path::Path;

use papertitle_core::{
    BackendError, ConfidenceTier, Document, ExtractionResult, PdfBackend, TitleOutcome,
};

use crate::config::ExtractionConfig;
use crate::secondary::{extract_author, extract_institution, extract_year};
use crate::title::{TitleContext, TitleStrategy, default_strategies, resolve_title};

/// A configurable title extraction pipeline.
///
/// Holds an [`ExtractionConfig`] and the ordered strategy chain. The default
/// constructor uses built-in defaults; use [`TitleExtractor::with_config`] to
/// supply custom regions, keywords and weights.
pub struct TitleExtractor {
    config: ExtractionConfig,
    strategies: Vec<Box<dyn TitleStrategy>>,
}

impl Default for TitleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            config,
            strategies: default_strategies(),
        }
    }

    /// Replace the strategy chain.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn TitleStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Open `path` through `backend` and run the pipeline.
    ///
    /// Encrypted and corrupted files are outcomes, not errors. Only a
    /// failure to hand the file to the backend at all is returned as `Err`.
    pub fn extract(
        &self,
        path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<ExtractionResult, BackendError> {
        let doc = match backend.open(path, self.config.max_pages) {
            Ok(doc) => doc,
            Err(BackendError::Encrypted) => {
                tracing::warn!(path = %path.display(), "encrypted PDF, empty password rejected");
                return Ok(ExtractionResult::new(TitleOutcome::Encrypted));
            }
            Err(BackendError::Corrupted(reason)) => {
                tracing::error!(path = %path.display(), %reason, "PDF appears to be corrupted");
                return Ok(ExtractionResult::new(TitleOutcome::Corrupted));
            }
            Err(e) => return Err(e),
        };
        Ok(self.extract_document(&doc))
    }

    /// Run the pipeline on an already opened document.
    pub fn extract_document(&self, doc: &Document) -> ExtractionResult {
        let ctx = TitleContext::new(doc, &self.config);

        let Some(found) = resolve_title(&self.strategies, &ctx) else {
            let outcome = if doc.text_error.is_some() {
                TitleOutcome::ExtractionFailed
            } else {
                TitleOutcome::NoTitleFound
            };
            tracing::warn!(path = %doc.path.display(), ?outcome, "could not extract a title");
            return ExtractionResult::new(outcome);
        };

        let text = match found.tier {
            ConfidenceTier::Metadata => doc.first_page_text(),
            ConfidenceTier::Content | ConfidenceTier::LowConfidence => ctx.regions().full.clone(),
        };

        tracing::info!(
            path = %doc.path.display(),
            tier = ?found.tier,
            title = %found.title,
            "extracted title"
        );

        ExtractionResult {
            institution: extract_institution(&text, &self.config),
            author: extract_author(&text),
            year: extract_year(&text),
            outcome: TitleOutcome::Found {
                title: found.title,
                tier: found.tier,
            },
        }
    }
}
