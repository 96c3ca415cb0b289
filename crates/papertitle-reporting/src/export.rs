use std::io::Write;
use std::path::Path;

use papertitle_core::{FileRecord, status_counts};

use crate::corpus::CorpusReport;
use crate::types::{ExportFormat, ReportError, RunReport};

/// Write a rename report to `path`.
pub fn export_run(
    report: &RunReport<'_>,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ReportError> {
    let content = render_run(report, format)?;
    write_file(path, &content)?;
    tracing::info!(path = %path.display(), format = %format, "rename report written");
    Ok(())
}

/// Write a corpus report to `path`.
pub fn export_corpus(
    report: &CorpusReport,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ReportError> {
    if report.rows.is_empty() {
        return Err(ReportError::Empty);
    }
    let content = render_corpus(report, format)?;
    write_file(path, &content)?;
    tracing::info!(path = %path.display(), format = %format, "corpus report written");
    Ok(())
}

pub fn render_run(report: &RunReport<'_>, format: ExportFormat) -> Result<String, ReportError> {
    Ok(match format {
        ExportFormat::Json => serde_json::to_string_pretty(report)?,
        ExportFormat::Csv => run_csv(report.records),
        ExportFormat::Markdown => run_markdown(report),
        ExportFormat::Text => run_text(report),
    })
}

pub fn render_corpus(report: &CorpusReport, format: ExportFormat) -> Result<String, ReportError> {
    Ok(match format {
        ExportFormat::Json => serde_json::to_string_pretty(report)?,
        ExportFormat::Csv => corpus_csv(report),
        ExportFormat::Markdown => corpus_markdown(report),
        ExportFormat::Text => corpus_text(report),
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::create(path).map_err(io_err)?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

fn run_csv(records: &[FileRecord]) -> String {
    let mut out = String::from(
        "OriginalFilename,NewFilename,OriginalPath,ExtractedTitle,DerivedTitle,Institution,Author,Year,Status,Timestamp,Error\n",
    );
    for r in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&r.original_filename),
            csv_escape(&r.new_filename),
            csv_escape(&r.original_path),
            csv_escape(opt(&r.extracted_title)),
            csv_escape(opt(&r.derived_title)),
            csv_escape(opt(&r.institution)),
            csv_escape(opt(&r.author)),
            csv_escape(opt(&r.year)),
            r.status.as_str(),
            csv_escape(&r.timestamp),
            csv_escape(opt(&r.error_message)),
        ));
    }
    out
}

fn run_markdown(report: &RunReport<'_>) -> String {
    let s = report.statistics;
    let mut out = String::from("# Rename Results\n\n");
    out.push_str(&format!("Directory: `{}`", report.root));
    if report.dry_run {
        out.push_str(" (dry run)");
    }
    if report.interrupted {
        out.push_str(" **[INTERRUPTED]**");
    }
    out.push_str("\n\n");
    out.push_str(&format!(
        "**{}** files | **{}** PDFs | **{}** renamed | **{}** failed | **{}** skipped | **{}** encrypted | **{}** corrupted\n\n",
        s.total_files, s.pdf_files, s.renamed, s.failed, s.skipped, s.encrypted, s.corrupted,
    ));

    let counts = status_counts(report.records);
    if !counts.is_empty() {
        out.push_str("## By status\n\n| Status | Files |\n|---|---|\n");
        for (status, n) in &counts {
            out.push_str(&format!("| {} | {} |\n", status, n));
        }
        out.push('\n');
    }

    if report.records.is_empty() {
        return out;
    }
    out.push_str("## Files\n\n| Original | New | Status | Title |\n|---|---|---|---|\n");
    for r in report.records {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            md_cell(&r.original_filename),
            md_cell(&r.new_filename),
            r.status,
            md_cell(opt(&r.extracted_title)),
        ));
    }
    let errors: Vec<&FileRecord> = report
        .records
        .iter()
        .filter(|r| r.error_message.is_some())
        .collect();
    if !errors.is_empty() {
        out.push_str("\n## Errors\n\n");
        for r in errors {
            out.push_str(&format!(
                "- **{}**: {}\n",
                r.original_filename,
                opt(&r.error_message)
            ));
        }
    }
    out
}

fn md_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

fn run_text(report: &RunReport<'_>) -> String {
    let s = report.statistics;
    let mut out = String::from("Rename Results\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!("Directory: {}\n", report.root));
    if report.dry_run {
        out.push_str("Mode: dry run (no files moved)\n");
    }
    if report.interrupted {
        out.push_str("Run was interrupted before all files were processed\n");
    }
    out.push_str(&format!(
        "  {} files | {} PDFs | {} renamed | {} failed | {} skipped | {} encrypted | {} corrupted\n",
        s.total_files, s.pdf_files, s.renamed, s.failed, s.skipped, s.encrypted, s.corrupted,
    ));

    let heading = "Summary by status";
    out.push_str(&format!("\n{}\n{}\n", heading, "-".repeat(heading.len())));
    for (status, n) in status_counts(report.records) {
        out.push_str(&format!("  {:<18} {}\n", status.as_str(), n));
    }

    if report.records.is_empty() {
        return out;
    }
    let heading = "Files";
    out.push_str(&format!("\n{}\n{}\n", heading, "-".repeat(heading.len())));
    for (i, r) in report.records.iter().enumerate() {
        out.push_str(&format!(
            "[{}] {} -> {} ({})\n",
            i + 1,
            r.original_filename,
            r.new_filename,
            r.status
        ));
        if let Some(title) = &r.extracted_title {
            out.push_str(&format!("    Title: {}\n", title));
        }
        let extras: Vec<String> = [
            ("Institution", &r.institution),
            ("Author", &r.author),
            ("Year", &r.year),
        ]
        .into_iter()
        .filter_map(|(label, v)| v.as_ref().map(|v| format!("{}: {}", label, v)))
        .collect();
        if !extras.is_empty() {
            out.push_str(&format!("    {}\n", extras.join(" | ")));
        }
        if let Some(err) = &r.error_message {
            out.push_str(&format!("    Error: {}\n", err));
        }
    }
    out
}

fn corpus_csv(report: &CorpusReport) -> String {
    let mut out = String::from("Institution,Publisher,Title,OriginalFilename,Folder\n");
    for row in &report.rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_escape(&row.institution),
            csv_escape(&row.publisher),
            csv_escape(&row.title),
            csv_escape(&row.original_filename),
            csv_escape(&row.folder),
        ));
    }
    out
}

fn corpus_markdown(report: &CorpusReport) -> String {
    let stats = &report.stats;
    let mut out = String::from("# Paper Institution Report\n\n");
    out.push_str(&format!(
        "**{}** papers from **{}** institutions and **{}** publishers\n\n",
        stats.total_papers,
        stats.institutions.len(),
        stats.publishers.len()
    ));
    for (heading, counts) in [
        ("Institutions", &stats.institutions),
        ("Publishers", &stats.publishers),
    ] {
        out.push_str(&format!("## {}\n\n| Name | Papers | Share |\n|---|---|---|\n", heading));
        for (name, n) in counts {
            out.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                md_cell(name),
                n,
                stats.percentage(*n)
            ));
        }
        out.push('\n');
    }
    out.push_str("## Papers\n\n| Institution | Publisher | Title |\n|---|---|---|\n");
    for row in &report.rows {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            md_cell(&row.institution),
            md_cell(&row.publisher),
            md_cell(&row.title)
        ));
    }
    out
}

fn corpus_text(report: &CorpusReport) -> String {
    let stats = &report.stats;
    let mut out = String::from("Paper Institution Report\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!("Directory: {}\n", report.root));
    out.push_str(&format!("  {} papers in total\n", stats.total_papers));

    for (heading, counts) in [
        ("Institution distribution", &stats.institutions),
        ("Publisher distribution", &stats.publishers),
    ] {
        out.push_str(&format!("\n{}\n{}\n", heading, "-".repeat(heading.len())));
        for (name, n) in counts {
            out.push_str(&format!(
                "  {}: {} ({:.1}%)\n",
                name,
                n,
                stats.percentage(*n)
            ));
        }
    }

    let heading = "Papers";
    out.push_str(&format!("\n{}\n{}\n", heading, "-".repeat(heading.len())));
    for row in &report.rows {
        out.push_str(&format!(
            "  [{}] {} ({})\n",
            row.institution, row.title, row.publisher
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use papertitle_core::{FileStatus, RunStatistics};

    use crate::corpus::{CorpusRow, CorpusStats};

    fn record(name: &str, new: &str, status: FileStatus) -> FileRecord {
        FileRecord {
            original_filename: name.to_string(),
            original_path: "/papers".to_string(),
            extracted_title: None,
            derived_title: None,
            institution: None,
            author: None,
            year: None,
            new_filename: new.to_string(),
            status,
            timestamp: "2024-03-09 14:05:07".to_string(),
            error_message: None,
        }
    }

    fn sample_records() -> Vec<FileRecord> {
        let mut ok = record("scan001.pdf", "Deep Learning for X.pdf", FileStatus::Success);
        ok.extracted_title = Some("Deep Learning for X".into());
        ok.derived_title = Some("Deep Learning for X".into());
        ok.year = Some("2023".into());
        let mut broken = record("broken.pdf", "broken.pdf", FileStatus::Corrupted);
        broken.error_message = Some("bad xref, offset 12".into());
        vec![ok, broken]
    }

    fn stats() -> RunStatistics {
        RunStatistics {
            total_files: 3,
            pdf_files: 2,
            renamed: 1,
            failed: 0,
            skipped: 1,
            encrypted: 0,
            corrupted: 1,
        }
    }

    fn corpus() -> CorpusReport {
        CorpusReport {
            root: "/corpus".into(),
            rows: vec![
                CorpusRow {
                    institution: "ACM".into(),
                    publisher: "ACM".into(),
                    title: "Sparse Attention, Revisited".into(),
                    original_filename: "Sparse Attention, Revisited.pdf".into(),
                    folder: "/corpus/ACM".into(),
                },
                CorpusRow {
                    institution: "中国知网".into(),
                    publisher: "中国知网".into(),
                    title: "联邦遗忘学习".into(),
                    original_filename: "联邦遗忘学习_陈萍.pdf".into(),
                    folder: "/corpus/知网".into(),
                },
            ],
            stats: CorpusStats {
                total_papers: 2,
                institutions: vec![("ACM".into(), 1), ("中国知网".into(), 1)],
                publishers: vec![("ACM".into(), 1), ("中国知网".into(), 1)],
            },
        }
    }

    #[test]
    fn csv_escape_quotes_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn run_csv_has_header_and_one_row_per_record() {
        let records = sample_records();
        let csv = run_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("OriginalFilename,NewFilename,"));
        assert!(lines[1].contains(",success,"));
        assert!(lines[2].ends_with("\"bad xref, offset 12\""));
    }

    #[test]
    fn run_json_round_trips_status_names() {
        let records = sample_records();
        let s = stats();
        let report = RunReport {
            root: "/papers".into(),
            dry_run: false,
            interrupted: false,
            statistics: &s,
            records: &records,
        };
        let json = render_run(&report, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["records"][0]["status"], "success");
        assert_eq!(value["records"][1]["status"], "corrupted");
        assert_eq!(value["statistics"]["pdf_files"], 2);
        assert!(value["records"][0]["author"].is_null());
    }

    #[test]
    fn run_text_includes_status_summary() {
        let records = sample_records();
        let s = stats();
        let report = RunReport {
            root: "/papers".into(),
            dry_run: true,
            interrupted: true,
            statistics: &s,
            records: &records,
        };
        let text = render_run(&report, ExportFormat::Text).unwrap();
        assert!(text.starts_with("Rename Results\n"));
        assert!(text.contains("Summary by status\n-----------------\n"));
        assert!(text.contains("  success            1\n"));
        assert!(text.contains("  corrupted          1\n"));
        assert!(text.contains("dry run"));
        assert!(text.contains("interrupted"));
        assert!(text.contains("    Year: 2023\n"));
        assert!(text.contains("    Error: bad xref, offset 12\n"));
    }

    #[test]
    fn run_markdown_lists_errors() {
        let records = sample_records();
        let s = stats();
        let report = RunReport {
            root: "/papers".into(),
            dry_run: false,
            interrupted: false,
            statistics: &s,
            records: &records,
        };
        let md = render_run(&report, ExportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Rename Results\n"));
        assert!(md.contains("| corrupted | 1 |"));
        assert!(md.contains("- **broken.pdf**: bad xref, offset 12"));
        assert!(!md.contains("INTERRUPTED"));
    }

    #[test]
    fn corpus_csv_escapes_titles() {
        let csv = corpus_csv(&corpus());
        assert!(csv.starts_with("Institution,Publisher,Title,"));
        assert!(csv.contains("ACM,ACM,\"Sparse Attention, Revisited\","));
    }

    #[test]
    fn corpus_text_shows_percentages() {
        let text = corpus_text(&corpus());
        assert!(text.contains("  2 papers in total\n"));
        assert!(text.contains("  ACM: 1 (50.0%)\n"));
        assert!(text.contains("Publisher distribution\n"));
        assert!(text.contains("  [中国知网] 联邦遗忘学习 (中国知网)\n"));
    }

    #[test]
    fn corpus_markdown_tables() {
        let md = corpus_markdown(&corpus());
        assert!(md.contains("| 中国知网 | 1 | 50.0% |"));
        assert!(md.contains("| ACM | ACM | Sparse Attention, Revisited |"));
    }

    #[test]
    fn empty_corpus_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = corpus();
        report.rows.clear();
        let err = export_corpus(&report, ExportFormat::Csv, &dir.path().join("out.csv"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Empty));
    }

    #[test]
    fn export_run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let records = sample_records();
        let s = stats();
        let report = RunReport {
            root: "/papers".into(),
            dry_run: false,
            interrupted: false,
            statistics: &s,
            records: &records,
        };
        export_run(&report, ExportFormat::Markdown, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Deep Learning for X.pdf"));
    }

    #[test]
    fn export_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = export_corpus(&corpus(), ExportFormat::Json, &path).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ExportFormat::from_str("JSON").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_str("md").unwrap(), ExportFormat::Markdown);
        assert_eq!(ExportFormat::from_str("text").unwrap(), ExportFormat::Text);
        assert!(ExportFormat::from_str("xlsx").is_err());
        for f in ExportFormat::all() {
            assert_eq!(ExportFormat::from_str(&f.to_string()).unwrap(), *f);
        }
    }
}
