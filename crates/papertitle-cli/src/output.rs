use std::io::Write;

use owo_colors::OwoColorize;
use papertitle_core::{FileRecord, FileStatus, RunStatistics, status_counts};
use papertitle_reporting::CorpusReport;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn print_heading(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Colour `label` by the severity of `status`. Pad before calling, since
/// escape codes count toward a format width.
fn paint_status(label: &str, status: FileStatus, color: ColorMode) -> String {
    if !color.enabled() {
        return label.to_string();
    }
    match status {
        FileStatus::Success => label.green().to_string(),
        FileStatus::LowConfidence | FileStatus::DefaultNamed => label.yellow().to_string(),
        _ => label.red().to_string(),
    }
}

/// Print the end-of-run summary: counters, per-status breakdown and the
/// files that need attention.
pub fn print_summary(
    w: &mut dyn Write,
    stats: &RunStatistics,
    records: &[FileRecord],
    interrupted: bool,
    dry_run: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let title = if dry_run { "SUMMARY (dry run)" } else { "SUMMARY" };
    print_heading(w, title, color)?;

    writeln!(w, "  Total files:  {}", stats.total_files)?;
    writeln!(w, "  PDF files:    {}", stats.pdf_files)?;
    if color.enabled() {
        writeln!(w, "  Renamed:      {}", stats.renamed.green())?;
        writeln!(w, "  Failed:       {}", stats.failed.red())?;
    } else {
        writeln!(w, "  Renamed:      {}", stats.renamed)?;
        writeln!(w, "  Failed:       {}", stats.failed)?;
    }
    writeln!(w, "  Skipped:      {}", stats.skipped)?;
    writeln!(w, "  Encrypted:    {}", stats.encrypted)?;
    writeln!(w, "  Corrupted:    {}", stats.corrupted)?;

    let counts = status_counts(records);
    if !counts.is_empty() {
        writeln!(w)?;
        writeln!(w, "  By status:")?;
        for (status, n) in counts {
            let padded = format!("{:<18}", status.as_str());
            writeln!(w, "    {} {}", paint_status(&padded, status, color), n)?;
        }
    }

    let attention: Vec<&FileRecord> = records
        .iter()
        .filter(|r| r.status != FileStatus::Success)
        .collect();
    if !attention.is_empty() {
        writeln!(w)?;
        writeln!(w, "  Needs attention:")?;
        for r in attention {
            let detail = r.error_message.as_deref().unwrap_or("");
            writeln!(
                w,
                "    [{}] {} -> {} {}",
                paint_status(r.status.as_str(), r.status, color),
                r.original_filename,
                r.new_filename,
                detail
            )?;
        }
    }

    if interrupted {
        writeln!(w)?;
        let msg = "Interrupted: remaining files were left untouched.";
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}

/// Print institution and publisher distributions of a corpus scan.
pub fn print_corpus_summary(
    w: &mut dyn Write,
    report: &CorpusReport,
    color: ColorMode,
) -> std::io::Result<()> {
    let stats = &report.stats;
    print_heading(w, "PAPER INSTITUTION REPORT", color)?;
    writeln!(w, "  Papers: {}", stats.total_papers)?;

    for (heading, counts) in [
        ("Institutions", &stats.institutions),
        ("Publishers", &stats.publishers),
    ] {
        writeln!(w)?;
        if color.enabled() {
            writeln!(w, "  {}:", heading.bold())?;
        } else {
            writeln!(w, "  {}:", heading)?;
        }
        for (name, n) in counts {
            writeln!(w, "    {}: {} ({:.1}%)", name, n, stats.percentage(*n))?;
        }
    }
    Ok(())
}
