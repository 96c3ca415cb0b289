//! Resolve run settings from CLI flags, `PAPERTITLE_*` environment
//! variables and the TOML config file, in that order of precedence.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use papertitle_core::config_file::ConfigFile;
use papertitle_extract::{ExtractionConfig, ExtractionConfigBuilder};
use papertitle_rename::RenameOptions;
use papertitle_reporting::ExportFormat;

use crate::{LogArgs, RenameArgs};

pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug)]
pub struct Settings {
    pub extraction: ExtractionConfig,
    pub rename: RenameOptions,
    pub log_dir: Option<PathBuf>,
    pub report_format: ExportFormat,
    pub report_path: Option<PathBuf>,
}

/// Resolve settings against the process environment.
pub fn resolve(args: &RenameArgs, file: &ConfigFile) -> anyhow::Result<Settings> {
    resolve_with(args, file, |key| std::env::var(key).ok())
}

pub fn resolve_with(
    args: &RenameArgs,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let rename_file = file.rename.clone().unwrap_or_default();
    let output_file = file.output.clone().unwrap_or_default();

    let mut builder = ExtractionConfigBuilder::from_config_file(file);
    if let Some(n) = args
        .max_pages
        .or(env_parse(&env, "PAPERTITLE_MAX_PAGES")?)
    {
        builder = builder.max_pages(n);
    }
    if let Some(n) = args
        .max_title_length
        .or(env_parse(&env, "PAPERTITLE_MAX_TITLE_LENGTH")?)
    {
        builder = builder.max_title_length(n);
    }
    let extraction = builder.build()?;

    let recursive = args.recursive
        || env_parse::<bool>(&env, "PAPERTITLE_RECURSIVE")?
            .or(rename_file.recursive)
            .unwrap_or(false);
    let custom_name = args
        .custom_name
        .clone()
        .or_else(|| env("PAPERTITLE_CUSTOM_NAME"))
        .or(rename_file.custom_name);

    let mut rename = RenameOptions {
        recursive,
        custom_name,
        dry_run: args.dry_run,
        max_title_length: extraction.max_title_length(),
        ..Default::default()
    };
    if let Some(patterns) = &rename_file.skip_patterns {
        rename = rename
            .with_skip_patterns(patterns)
            .context("invalid skip pattern in config file")?;
    }

    let log_dir = log_dir_with(&args.log, file, &env);

    let report_format = match args.format {
        Some(f) => f,
        None => match env("PAPERTITLE_REPORT_FORMAT").or(output_file.report_format) {
            Some(s) => ExportFormat::from_str(&s).map_err(anyhow::Error::msg)?,
            None => ExportFormat::default(),
        },
    };
    let report_path = args
        .report
        .clone()
        .or_else(|| env("PAPERTITLE_REPORT").map(PathBuf::from))
        .or(output_file.report_path.map(PathBuf::from));

    Ok(Settings {
        extraction,
        rename,
        log_dir,
        report_format,
        report_path,
    })
}

/// Log directory for commands other than `rename`.
pub fn log_dir(log: &LogArgs, file: &ConfigFile) -> Option<PathBuf> {
    log_dir_with(log, file, |key| std::env::var(key).ok())
}

/// `None` with `--no-log-file`, else flag, env, file and default in turn.
pub fn log_dir_with(
    log: &LogArgs,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    if log.no_log_file {
        return None;
    }
    let from_file = file
        .output
        .as_ref()
        .and_then(|o| o.log_dir.as_ref())
        .map(PathBuf::from);
    Some(
        log.log_dir
            .clone()
            .or_else(|| env("PAPERTITLE_LOG_DIR").map(PathBuf::from))
            .or(from_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
    )
}

fn env_parse<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", key, raw, e)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use papertitle_core::config_file::{ExtractionSection, OutputSection, RenameSection};

    fn args() -> RenameArgs {
        RenameArgs {
            root: PathBuf::from("."),
            recursive: false,
            custom_name: None,
            dry_run: false,
            max_pages: None,
            max_title_length: None,
            report: None,
            format: None,
            log: LogArgs {
                log_level: None,
                log_dir: None,
                no_log_file: false,
            },
            no_color: true,
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn file() -> ConfigFile {
        ConfigFile {
            extraction: Some(ExtractionSection {
                max_pages: Some(5),
                max_title_length: Some(120),
                ..Default::default()
            }),
            rename: Some(RenameSection {
                recursive: Some(true),
                custom_name: Some("FromFile".into()),
                skip_patterns: None,
            }),
            output: Some(OutputSection {
                log_dir: Some("/var/log/papertitle".into()),
                report_format: Some("json".into()),
                report_path: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_without_any_source() {
        let s = resolve_with(&args(), &ConfigFile::default(), env_of(&[])).unwrap();
        assert_eq!(s.extraction.max_pages(), 3);
        assert!(!s.rename.recursive);
        assert_eq!(s.rename.custom_name, None);
        assert_eq!(s.log_dir, Some(PathBuf::from(DEFAULT_LOG_DIR)));
        assert_eq!(s.report_format, ExportFormat::Csv);
        assert_eq!(s.report_path, None);
    }

    #[test]
    fn file_values_apply() {
        let s = resolve_with(&args(), &file(), env_of(&[])).unwrap();
        assert_eq!(s.extraction.max_pages(), 5);
        assert_eq!(s.rename.max_title_length, 120);
        assert!(s.rename.recursive);
        assert_eq!(s.rename.custom_name.as_deref(), Some("FromFile"));
        assert_eq!(s.log_dir, Some(PathBuf::from("/var/log/papertitle")));
        assert_eq!(s.report_format, ExportFormat::Json);
    }

    #[test]
    fn env_beats_file_and_cli_beats_env() {
        let env = env_of(&[
            ("PAPERTITLE_MAX_PAGES", "7"),
            ("PAPERTITLE_CUSTOM_NAME", "FromEnv"),
            ("PAPERTITLE_REPORT_FORMAT", "markdown"),
        ]);
        let s = resolve_with(&args(), &file(), &env).unwrap();
        assert_eq!(s.extraction.max_pages(), 7);
        assert_eq!(s.rename.custom_name.as_deref(), Some("FromEnv"));
        assert_eq!(s.report_format, ExportFormat::Markdown);

        let mut cli = args();
        cli.max_pages = Some(1);
        cli.custom_name = Some("FromCli".into());
        cli.format = Some(ExportFormat::Text);
        let s = resolve_with(&cli, &file(), &env).unwrap();
        assert_eq!(s.extraction.max_pages(), 1);
        assert_eq!(s.rename.custom_name.as_deref(), Some("FromCli"));
        assert_eq!(s.report_format, ExportFormat::Text);
    }

    #[test]
    fn invalid_env_number_is_an_error() {
        let err = resolve_with(
            &args(),
            &ConfigFile::default(),
            env_of(&[("PAPERTITLE_MAX_PAGES", "three")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PAPERTITLE_MAX_PAGES"));
    }

    #[test]
    fn no_log_file_disables_log_dir() {
        let mut cli = args();
        cli.log.no_log_file = true;
        let s = resolve_with(&cli, &file(), env_of(&[])).unwrap();
        assert_eq!(s.log_dir, None);
    }

    #[test]
    fn log_dir_precedence_without_rename_args() {
        let mut log = args().log;
        assert_eq!(
            log_dir_with(&log, &ConfigFile::default(), env_of(&[])),
            Some(PathBuf::from(DEFAULT_LOG_DIR))
        );
        assert_eq!(
            log_dir_with(&log, &file(), env_of(&[])),
            Some(PathBuf::from("/var/log/papertitle"))
        );
        let env = env_of(&[("PAPERTITLE_LOG_DIR", "/tmp/env-logs")]);
        assert_eq!(
            log_dir_with(&log, &file(), &env),
            Some(PathBuf::from("/tmp/env-logs"))
        );
        log.log_dir = Some(PathBuf::from("cli-logs"));
        assert_eq!(
            log_dir_with(&log, &file(), &env),
            Some(PathBuf::from("cli-logs"))
        );
        log.no_log_file = true;
        assert_eq!(log_dir_with(&log, &file(), &env), None);
    }

    #[test]
    fn bad_skip_pattern_in_file_fails() {
        let mut cfg = file();
        cfg.rename = Some(RenameSection {
            skip_patterns: Some(vec!["(".into()]),
            ..Default::default()
        });
        assert!(resolve_with(&args(), &cfg, env_of(&[])).is_err());
    }
}
