//! Inventory of a sorted paper collection.
//!
//! The collection is expected to have one top-level folder per source
//! (`ACM/`, `知网/`, ...), optionally with further sub-folders. Titles are
//! recovered from the file names, so this runs after the renamer.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::ReportError;

/// Top-level folder name to institution label.
const INSTITUTIONS: &[(&str, &str)] = &[
    ("AAAI", "AAAI"),
    ("ACM", "ACM"),
    ("EBSCO", "EBSCO"),
    ("EI", "EI"),
    ("ICML", "ICML"),
    ("Nature", "Nature"),
    ("ScienceDirect", "ScienceDirect"),
    ("知网", "中国知网"),
];

/// Publisher label and the keywords that identify it.
const PUBLISHERS: &[(&str, &[&str])] = &[
    ("AAAI Press", &["AAAI"]),
    ("ACM", &["ACM"]),
    ("EBSCO Publishing", &["EBSCO"]),
    ("Elsevier", &["ScienceDirect", "Elsevier"]),
    ("Engineering Index", &["EI"]),
    ("ICML", &["ICML"]),
    ("Nature Publishing Group", &["Nature"]),
    ("中国知网", &["知网", "CNKI"]),
];

pub const UNKNOWN_PUBLISHER: &str = "Unknown publisher";

/// Top-level folders that never hold papers.
const IGNORED_FOLDERS: &[&str] = &["logs"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusRow {
    pub institution: String,
    pub publisher: String,
    pub title: String,
    pub original_filename: String,
    pub folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total_papers: usize,
    /// `(institution, count)`, most papers first.
    pub institutions: Vec<(String, usize)>,
    /// `(publisher, count)`, most papers first.
    pub publishers: Vec<(String, usize)>,
}

impl CorpusStats {
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total_papers == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total_papers as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub root: String,
    pub rows: Vec<CorpusRow>,
    pub stats: CorpusStats,
}

/// Map a top-level folder to its institution label. Unknown folders keep
/// their own name.
pub fn institution_for(folder: &str) -> Option<&'static str> {
    INSTITUTIONS
        .iter()
        .find(|(name, _)| *name == folder)
        .map(|(_, label)| *label)
}

/// Identify the publisher of a paper from its top-level folder and file name.
///
/// An exact keyword match on the folder wins, then a keyword anywhere in
/// `"{folder} {filename}"`, then the folder's institution label.
pub fn identify_publisher(folder: &str, filename: &str) -> String {
    let folder_lower = folder.to_lowercase();
    let haystack = format!("{} {}", folder, filename).to_lowercase();

    let exact = PUBLISHERS.iter().find(|(_, keywords)| {
        keywords
            .iter()
            .any(|k| k.to_lowercase() == folder_lower)
    });
    if let Some((publisher, _)) = exact {
        return publisher.to_string();
    }

    let contained = PUBLISHERS.iter().find(|(_, keywords)| {
        keywords
            .iter()
            .any(|k| haystack.contains(&k.to_lowercase()))
    });
    if let Some((publisher, _)) = contained {
        return publisher.to_string();
    }

    institution_for(folder)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string())
}

/// Recover a paper title from a renamed file name: drop the extension, a
/// dedup counter, a trailing CJK author name and a trailing year.
pub fn title_from_filename(filename: &str) -> String {
    static COUNTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]\d+$").unwrap());
    static CJK_AUTHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_-][\x{4e00}-\x{9fa5}]+$").unwrap());
    static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_-]\d{4}$").unwrap());

    let split = filename.len().saturating_sub(4);
    let stem = match filename.get(split..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &filename[..split],
        _ => filename,
    };
    let title = COUNTER.replace(stem, "");
    let title = title.trim();
    let title = CJK_AUTHOR.replace(title, "");
    let title = YEAR.replace(&title, "");
    title.trim().to_string()
}

/// Walk the collection under `root` and build the report.
///
/// Fails with [`ReportError::Empty`] when no PDF is found.
pub fn scan_corpus(root: &Path) -> Result<CorpusReport, ReportError> {
    let io_err = |source| ReportError::Io {
        path: root.to_path_buf(),
        source,
    };
    tracing::info!(root = %root.display(), "scanning corpus");

    let mut folders: Vec<_> = fs::read_dir(root)
        .map_err(io_err)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    folders.sort();

    let mut rows = Vec::new();
    for path in folders {
        let folder = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if folder.starts_with('.') || IGNORED_FOLDERS.contains(&folder.as_str()) {
            continue;
        }
        let institution = match institution_for(&folder) {
            Some(label) => label.to_string(),
            None => {
                tracing::warn!(folder = %folder, "unknown institution folder");
                folder.clone()
            }
        };
        tracing::info!(institution = %institution, folder = %folder, "scanning institution");
        scan_folder(&path, &institution, &folder, &mut rows);
    }

    if rows.is_empty() {
        return Err(ReportError::Empty);
    }
    let stats = tally(&rows);
    tracing::info!(papers = stats.total_papers, "corpus scan finished");
    Ok(CorpusReport {
        root: root.display().to_string(),
        rows,
        stats,
    })
}

fn scan_folder(dir: &Path, institution: &str, top_folder: &str, rows: &mut Vec<CorpusRow>) {
    let mut entries: Vec<_> = match fs::read_dir(dir) {
        Ok(read) => read.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(e) => {
            tracing::error!(path = %dir.display(), error = %e, "cannot scan folder");
            return;
        }
    };
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if path.is_dir() {
            let sub = format!("{} - {}", institution, name);
            scan_folder(&path, &sub, top_folder, rows);
        } else if name.to_lowercase().ends_with(".pdf") {
            rows.push(CorpusRow {
                institution: institution.to_string(),
                publisher: identify_publisher(top_folder, &name),
                title: title_from_filename(&name),
                original_filename: name,
                folder: dir.display().to_string(),
            });
            if rows.len() % 10 == 0 {
                tracing::info!(papers = rows.len(), "scan progress");
            }
        }
    }
}

fn tally(rows: &[CorpusRow]) -> CorpusStats {
    let mut institutions: HashMap<&str, usize> = HashMap::new();
    let mut publishers: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *institutions.entry(&row.institution).or_default() += 1;
        *publishers.entry(&row.publisher).or_default() += 1;
    }
    CorpusStats {
        total_papers: rows.len(),
        institutions: sorted_counts(institutions),
        publishers: sorted_counts(publishers),
    }
}

/// Descending by count, ties by name so output is stable.
fn sorted_counts(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}
