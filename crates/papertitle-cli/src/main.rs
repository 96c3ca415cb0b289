use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use papertitle_extract::TitleExtractor;
use papertitle_pdf_mupdf::MupdfBackend;
use papertitle_rename::{BatchRenamer, RenameEvent};
use papertitle_reporting::{ExportFormat, RunReport};

mod logging;
mod output;
mod settings;

use output::ColorMode;

/// Exit status after Ctrl+C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

/// Academic PDF renamer - name papers after their titles
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rename every PDF in a directory after its extracted title
    Rename(RenameArgs),

    /// Summarize a sorted paper collection by institution and publisher
    Report {
        /// Collection root with one folder per source
        root: PathBuf,

        /// Write the report here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format: json, csv, markdown or text (default: from extension, else csv)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        #[command(flatten)]
        log: LogArgs,
    },
}

#[derive(Args, Debug)]
pub(crate) struct RenameArgs {
    /// Directory holding the PDFs
    pub(crate) root: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub(crate) recursive: bool,

    /// Prefix for files without a usable title (default: Unrecognized)
    #[arg(long)]
    pub(crate) custom_name: Option<String>,

    /// Resolve titles and names without moving any file
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Pages scanned for title text
    #[arg(long)]
    pub(crate) max_pages: Option<usize>,

    /// Longest generated file name, extension included
    #[arg(long)]
    pub(crate) max_title_length: Option<usize>,

    /// Write the rename report to this path
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,

    /// Report format: json, csv, markdown or text
    #[arg(long)]
    pub(crate) format: Option<ExportFormat>,

    #[command(flatten)]
    pub(crate) log: LogArgs,

    /// Disable colored output
    #[arg(long)]
    pub(crate) no_color: bool,
}

#[derive(Args, Debug)]
pub(crate) struct LogArgs {
    /// Log filter for console and log file, e.g. `debug` or `papertitle_extract=trace`
    #[arg(long)]
    pub(crate) log_level: Option<String>,

    /// Directory for the run log (default: ./logs)
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long)]
    pub(crate) no_log_file: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let file_config = papertitle_core::config_file::load_config();

    match cli.command {
        Command::Rename(args) => rename(args, file_config).await,
        Command::Report {
            root,
            output,
            format,
            no_color,
            log,
        } => {
            let log_dir = settings::log_dir(&log, &file_config);
            let _guard = logging::init(log.log_level.as_deref(), log_dir.as_deref())?;
            report(&root, output, format, ColorMode(!no_color))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn rename(
    args: RenameArgs,
    file_config: papertitle_core::config_file::ConfigFile,
) -> anyhow::Result<ExitCode> {
    let settings = settings::resolve(&args, &file_config)?;
    let _guard = logging::init(args.log.log_level.as_deref(), settings.log_dir.as_deref())?;
    let color = ColorMode(!args.no_color);

    if !args.root.is_dir() {
        anyhow::bail!("Directory not found: {}", args.root.display());
    }

    let dry_run = settings.rename.dry_run;
    let renamer = BatchRenamer::new(
        TitleExtractor::with_config(settings.extraction),
        Arc::new(MupdfBackend::new()),
        settings.rename,
    );

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let bar = progress_bar();
    let root = args.root.clone();
    let worker_bar = bar.clone();
    let ctx = tokio::task::spawn_blocking(move || {
        renamer.run(&root, &cancel, |event| match event {
            RenameEvent::Processing { path, .. } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                worker_bar.set_message(name);
            }
            RenameEvent::Finished { .. } => worker_bar.inc(1),
            RenameEvent::Skipped { .. } => {}
        })
    })
    .await??;
    bar.finish_and_clear();

    if ctx.stats.pdf_files == 0 && !ctx.interrupted {
        anyhow::bail!("No PDF files found in {}", args.root.display());
    }

    let mut stdout = std::io::stdout();
    output::print_summary(
        &mut stdout,
        &ctx.stats,
        &ctx.records,
        ctx.interrupted,
        dry_run,
        color,
    )?;

    let report_path = settings.report_path.or_else(|| {
        settings.log_dir.as_ref().map(|dir| {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            dir.join(format!(
                "rename_report_{}.{}",
                stamp,
                settings.report_format.extension()
            ))
        })
    });
    if let Some(path) = report_path {
        let report = RunReport {
            root: args.root.display().to_string(),
            dry_run,
            interrupted: ctx.interrupted,
            statistics: &ctx.stats,
            records: &ctx.records,
        };
        papertitle_reporting::export_run(&report, settings.report_format, &path)?;
        writeln!(stdout, "\nReport written to {}", path.display())?;
    }

    if ctx.interrupted {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

fn progress_bar() -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{pos} PDFs, {elapsed}] {msg}")
    {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn report(
    root: &Path,
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let corpus = papertitle_reporting::scan_corpus(root)?;

    let mut stdout = std::io::stdout();
    match output {
        Some(path) => {
            let format = format
                .or_else(|| {
                    path.extension()
                        .and_then(|e| e.to_str())
                        .and_then(|e| e.parse().ok())
                })
                .unwrap_or_default();
            papertitle_reporting::export_corpus(&corpus, format, &path)?;
            output::print_corpus_summary(&mut stdout, &corpus, color)?;
            writeln!(stdout, "\nReport written to {}", path.display())?;
        }
        None => {
            let format = format.unwrap_or(ExportFormat::Text);
            if format == ExportFormat::Text {
                output::print_corpus_summary(&mut stdout, &corpus, color)?;
            } else {
                let rendered = papertitle_reporting::render_corpus(&corpus, format)?;
                stdout.write_all(rendered.as_bytes())?;
            }
        }
    }
    Ok(())
}
