use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Console output stays quiet so it does not fight the progress bar.
const CONSOLE_DEFAULT: &str = "warn";
const FILE_DEFAULT: &str = "info";

/// Install the global subscriber.
///
/// Console logs go to stderr, filtered by `level`, else `RUST_LOG`, else
/// `warn`. With a `log_dir`, everything at `info` (or `level`) is also
/// written to `<log_dir>/papertitle_<timestamp>.log`. The returned guard
/// flushes the file on drop and must be held until exit.
pub fn init(level: Option<&str>, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let console_filter = match level {
        Some(l) => EnvFilter::try_new(l)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(CONSOLE_DEFAULT)),
    };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let name = log_file_name(chrono::Local::now());
            let appender = tracing_appender::rolling::never(dir, &name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::try_new(level.unwrap_or(FILE_DEFAULT))?);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()?;

    if let Some(dir) = log_dir {
        tracing::info!(dir = %dir.display(), "logging to file");
    }
    Ok(guard)
}

fn log_file_name(at: chrono::DateTime<chrono::Local>) -> String {
    format!("papertitle_{}.log", at.format("%Y%m%d_%H%M%S"))
}
