//! In-memory PDF backend for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{BackendError, Document, PdfBackend};

/// What [`MockBackend`] hands back for a given path.
#[derive(Clone, Debug)]
pub enum MockPdf {
    /// Open successfully with this document.
    Ready(Document),
    /// Simulate an encrypted file the empty password cannot unlock.
    Encrypted,
    /// Simulate a structurally broken file.
    Corrupted(String),
    /// Panic inside `open`, as a misbehaving native library might.
    Panic,
}

/// A hand-rolled [`PdfBackend`] serving synthetic documents by path.
///
/// Paths with no registered entry fail with [`BackendError::Open`]. Pages
/// beyond `max_pages` are dropped on open, mirroring a real backend.
#[derive(Default)]
pub struct MockBackend {
    docs: Mutex<HashMap<PathBuf, MockPdf>>,
    fallback: Option<MockPdf>,
    open_count: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for `path`.
    pub fn with(self, path: impl Into<PathBuf>, pdf: MockPdf) -> Self {
        self.insert(path, pdf);
        self
    }

    /// Response used for any path without its own entry.
    pub fn with_fallback(mut self, pdf: MockPdf) -> Self {
        self.fallback = Some(pdf);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, pdf: MockPdf) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(path.into(), pdf);
        }
    }

    /// How many times `open()` has been called.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    fn lookup(&self, path: &Path) -> Option<MockPdf> {
        let docs = self.docs.lock().ok()?;
        docs.get(path).cloned().or_else(|| self.fallback.clone())
    }
}

impl PdfBackend for MockBackend {
    fn open(&self, path: &Path, max_pages: usize) -> Result<Document, BackendError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        match self.lookup(path) {
            Some(MockPdf::Ready(mut doc)) => {
                doc.path = path.to_path_buf();
                doc.page_count = doc.page_count.max(doc.pages.len());
                doc.pages.truncate(max_pages);
                Ok(doc)
            }
            Some(MockPdf::Encrypted) => Err(BackendError::Encrypted),
            Some(MockPdf::Corrupted(msg)) => Err(BackendError::Corrupted(msg)),
            Some(MockPdf::Panic) => panic!("mock backend panic for {}", path.display()),
            None => Err(BackendError::Open(format!(
                "no mock document for {}",
                path.display()
            ))),
        }
    }
}
