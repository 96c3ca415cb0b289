use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use regex::Regex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use papertitle_core::{
    ConfidenceTier, ExtractionResult, FileRecord, FileStatus, PdfBackend, RunStatistics,
    TitleOutcome,
};
use papertitle_extract::TitleExtractor;

use crate::naming::{NameRegistry, build_filename, default_filename, resolve_collision};

/// Files matching any of these are ignored: hidden files, Office lock files
/// and Windows shell droppings.
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[r"^\.", r"^~\$", r"^Thumbs\.db$", r"^desktop\.ini$"];

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("cannot read directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Knobs for a batch run.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub recursive: bool,
    /// Prefix for files without a usable title (default `Unrecognized`).
    pub custom_name: Option<String>,
    /// Compute names and statuses without moving anything.
    pub dry_run: bool,
    /// Upper bound on a generated filename, extension included.
    pub max_title_length: usize,
    pub skip_patterns: Vec<Regex>,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            custom_name: None,
            dry_run: false,
            max_title_length: papertitle_extract::config::DEFAULT_MAX_TITLE_LENGTH,
            skip_patterns: DEFAULT_SKIP_PATTERNS
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
        }
    }
}

impl RenameOptions {
    /// Replace the skip patterns, failing on the first invalid one.
    pub fn with_skip_patterns(mut self, patterns: &[String]) -> Result<Self, regex::Error> {
        self.skip_patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip_patterns.iter().any(|re| re.is_match(name))
    }
}

/// Mutable state of one batch run: counters, report rows and the
/// run-wide name registry.
#[derive(Debug, Default)]
pub struct RunContext {
    pub stats: RunStatistics,
    pub records: Vec<FileRecord>,
    pub names: NameRegistry,
    /// The walk stopped early because the run was cancelled.
    pub interrupted: bool,
}

/// Progress notifications emitted during [`BatchRenamer::run`].
#[derive(Debug)]
pub enum RenameEvent<'a> {
    /// About to process the `index`-th PDF (0-based).
    Processing { index: usize, path: &'a Path },
    /// A PDF has been processed and recorded.
    Finished { index: usize, record: &'a FileRecord },
    /// An entry was ignored (skip pattern or not a PDF).
    Skipped { path: &'a Path },
}

/// Walks a directory tree and renames PDFs after their extracted titles.
pub struct BatchRenamer {
    extractor: TitleExtractor,
    backend: Arc<dyn PdfBackend>,
    options: RenameOptions,
}

impl BatchRenamer {
    pub fn new(extractor: TitleExtractor, backend: Arc<dyn PdfBackend>, options: RenameOptions) -> Self {
        Self {
            extractor,
            backend,
            options,
        }
    }

    pub fn options(&self) -> &RenameOptions {
        &self.options
    }

    /// Process every PDF under `root`.
    ///
    /// Per-file problems become record statuses; only a missing or
    /// unreadable `root` is an error. Cancellation is checked before each
    /// entry and leaves already renamed files in place.
    pub fn run(
        &self,
        root: &Path,
        cancel: &CancellationToken,
        mut progress: impl FnMut(RenameEvent<'_>),
    ) -> Result<RunContext, RenameError> {
        if !root.is_dir() {
            return Err(RenameError::RootNotFound(root.to_path_buf()));
        }
        tracing::info!(
            root = %root.display(),
            recursive = self.options.recursive,
            dry_run = self.options.dry_run,
            "starting batch rename"
        );

        let mut ctx = RunContext::default();
        self.walk(root, &mut ctx, cancel, &mut progress)?;

        if ctx.interrupted {
            tracing::warn!(processed = ctx.records.len(), "run interrupted");
        }
        tracing::info!(
            pdf_files = ctx.stats.pdf_files,
            renamed = ctx.stats.renamed,
            failed = ctx.stats.failed,
            "batch rename finished"
        );
        Ok(ctx)
    }

    fn walk(
        &self,
        dir: &Path,
        ctx: &mut RunContext,
        cancel: &CancellationToken,
        progress: &mut dyn FnMut(RenameEvent<'_>),
    ) -> Result<(), RenameError> {
        let read = fs::read_dir(dir).map_err(|source| RenameError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        // Symlinks are told apart here; `Path::is_dir` would follow them.
        let mut entries: Vec<(PathBuf, bool)> = read
            .filter_map(|e| e.ok())
            .map(|e| {
                let is_link = e.file_type().map(|t| t.is_symlink()).unwrap_or(false);
                (e.path(), is_link)
            })
            .collect();
        entries.sort();

        for (path, is_link) in entries {
            if cancel.is_cancelled() {
                ctx.interrupted = true;
                return Ok(());
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if path.is_dir() {
                if is_link {
                    tracing::debug!(path = %path.display(), "not following directory symlink");
                } else if self.options.is_skipped(&name) {
                    tracing::debug!(path = %path.display(), "skipping directory by pattern");
                    ctx.stats.skipped += 1;
                    progress(RenameEvent::Skipped { path: &path });
                } else if self.options.recursive {
                    if let Err(e) = self.walk(&path, ctx, cancel, progress) {
                        tracing::error!(error = %e, "skipping unreadable directory");
                    }
                    if ctx.interrupted {
                        return Ok(());
                    }
                }
                continue;
            }

            if !path.is_file() {
                continue;
            }
            ctx.stats.total_files += 1;

            if self.options.is_skipped(&name) {
                tracing::debug!(path = %path.display(), "skipping by pattern");
                ctx.stats.skipped += 1;
                progress(RenameEvent::Skipped { path: &path });
                continue;
            }

            if !is_pdf(&path) {
                tracing::debug!(path = %path.display(), "skipping non-PDF file");
                ctx.stats.skipped += 1;
                progress(RenameEvent::Skipped { path: &path });
                continue;
            }

            let index = ctx.stats.pdf_files;
            ctx.stats.pdf_files += 1;
            progress(RenameEvent::Processing { index, path: &path });

            let record = self.process_file(dir, &path, &name, ctx);
            ctx.records.push(record);
            if let Some(record) = ctx.records.last() {
                progress(RenameEvent::Finished { index, record });
            }
        }
        Ok(())
    }

    fn process_file(&self, dir: &Path, path: &Path, name: &str, ctx: &mut RunContext) -> FileRecord {
        let now = Local::now();
        let mut record = FileRecord {
            original_filename: name.to_string(),
            original_path: dir.display().to_string(),
            extracted_title: None,
            derived_title: None,
            institution: None,
            author: None,
            year: None,
            new_filename: name.to_string(),
            status: FileStatus::ProcessingError,
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            error_message: None,
        };

        tracing::info!(path = %path.display(), "processing file");

        let result = match self.extract_guarded(path) {
            Ok(result) => result,
            Err(message) => {
                tracing::error!(path = %path.display(), %message, "processing error");
                record.error_message = Some(message);
                ctx.stats.failed += 1;
                return record;
            }
        };

        record.institution = result.institution.clone();
        record.author = result.author.clone();
        record.year = result.year.clone();

        let (planned, base) = match &result.outcome {
            TitleOutcome::Found { title, tier } => {
                let filename = build_filename(title, self.options.max_title_length);
                record.extracted_title = Some(title.clone());
                record.derived_title = filename
                    .strip_suffix(crate::naming::PDF_EXTENSION)
                    .map(str::to_string);
                record.status = match tier {
                    ConfidenceTier::Metadata | ConfidenceTier::Content => FileStatus::Success,
                    ConfidenceTier::LowConfidence => FileStatus::LowConfidence,
                };
                (ctx.names.register(&filename), filename)
            }
            TitleOutcome::Encrypted => {
                ctx.stats.encrypted += 1;
                record.status = FileStatus::Encrypted;
                return record;
            }
            TitleOutcome::Corrupted => {
                ctx.stats.corrupted += 1;
                record.status = FileStatus::Corrupted;
                return record;
            }
            TitleOutcome::NoTitleFound | TitleOutcome::ExtractionFailed => {
                if result.outcome == TitleOutcome::ExtractionFailed {
                    record.error_message = Some("text extraction failed".to_string());
                }
                record.status = FileStatus::DefaultNamed;
                ctx.stats.failed += 1;
                let filename = default_filename(self.options.custom_name.as_deref(), now);
                (filename.clone(), filename)
            }
        };

        if planned == name {
            return record;
        }

        let target = resolve_collision(dir, &planned, &base, path);
        let target_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(planned);
        record.new_filename = target_name;

        if self.options.dry_run {
            tracing::info!(from = %name, to = %record.new_filename, "dry run, not renaming");
            ctx.stats.renamed += 1;
            return record;
        }

        match fs::rename(path, &target) {
            Ok(()) => {
                tracing::info!(from = %name, to = %record.new_filename, "renamed");
                ctx.stats.renamed += 1;
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "rename failed");
                record.status = FileStatus::RenameFailed;
                record.error_message = Some(format!("rename failed: {}", e));
                record.new_filename = name.to_string();
                ctx.stats.failed += 1;
            }
        }
        record
    }

    /// Run extraction, turning backend errors and panics into messages.
    fn extract_guarded(&self, path: &Path) -> Result<ExtractionResult, String> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.extractor.extract(path, self.backend.as_ref())
        }));
        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(format!("processing failed: {}", e)),
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(format!("processing failed: {}", detail))
            }
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skip_patterns() {
        let opts = RenameOptions::default();
        for name in [".DS_Store", "~$draft.docx", "Thumbs.db", "desktop.ini"] {
            assert!(opts.is_skipped(name), "{name}");
        }
        assert!(!opts.is_skipped("paper.pdf"));
        assert!(!opts.is_skipped("my.Thumbs.db"));
    }

    #[test]
    fn invalid_skip_pattern_is_rejected() {
        let result = RenameOptions::default().with_skip_patterns(&["(".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_pdf(Path::new("a.PDF")));
        assert!(is_pdf(Path::new("dir/a.pdf")));
        assert!(!is_pdf(Path::new("a.pdf.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }
}
