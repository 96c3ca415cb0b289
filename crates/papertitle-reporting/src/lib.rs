pub mod corpus;
pub mod export;
pub mod types;

pub use corpus::{CorpusReport, CorpusRow, CorpusStats, scan_corpus};
pub use export::{export_corpus, export_run, render_corpus, render_run};
pub use types::{ExportFormat, ReportError, RunReport};
