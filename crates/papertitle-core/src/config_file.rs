use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionSection>,
    pub scoring: Option<ScoringSection>,
    pub rename: Option<RenameSection>,
    pub output: Option<OutputSection>,
}

/// `[extraction]`: pages, lengths, keyword lists and region boxes.
///
/// `title_keywords` / `institution_keywords` replace the built-in lists;
/// the `extra_*` variants extend them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub max_pages: Option<usize>,
    pub max_title_length: Option<usize>,
    pub title_keywords: Option<Vec<String>>,
    pub extra_title_keywords: Option<Vec<String>>,
    pub institution_keywords: Option<Vec<String>>,
    pub extra_institution_keywords: Option<Vec<String>>,
    /// `[x0, y0, x1, y1]` page fractions, origin top-left.
    pub header_region: Option<[f32; 4]>,
    pub content_region: Option<[f32; 4]>,
    pub footer_region: Option<[f32; 4]>,
}

/// `[scoring]`: candidate-line thresholds and weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringSection {
    pub max_candidates: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_words: Option<usize>,
    pub max_words: Option<usize>,
    pub min_upper_ratio: Option<f32>,
    pub max_upper_ratio: Option<f32>,
    pub length_weight: Option<i32>,
    pub words_weight: Option<i32>,
    pub case_weight: Option<i32>,
    pub keyword_weight: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameSection {
    pub recursive: Option<bool>,
    pub custom_name: Option<String>,
    pub skip_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub log_dir: Option<String>,
    pub report_format: Option<String>,
    pub report_path: Option<String>,
}

/// Platform config directory path: `<config_dir>/papertitle/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("papertitle").join("config.toml"))
}

/// Load config by cascading CWD `.papertitle.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".papertitle.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

fn pick<S, T>(
    overlay: Option<&S>,
    base: Option<&S>,
    get: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay.and_then(&get).or_else(|| base.and_then(&get))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (be, oe) = (base.extraction.as_ref(), overlay.extraction.as_ref());
    let (bs, os) = (base.scoring.as_ref(), overlay.scoring.as_ref());
    let (br, or) = (base.rename.as_ref(), overlay.rename.as_ref());
    let (bo, oo) = (base.output.as_ref(), overlay.output.as_ref());

    ConfigFile {
        extraction: Some(ExtractionSection {
            max_pages: pick(oe, be, |e| e.max_pages),
            max_title_length: pick(oe, be, |e| e.max_title_length),
            title_keywords: pick(oe, be, |e| e.title_keywords.clone()),
            extra_title_keywords: pick(oe, be, |e| e.extra_title_keywords.clone()),
            institution_keywords: pick(oe, be, |e| e.institution_keywords.clone()),
            extra_institution_keywords: pick(oe, be, |e| e.extra_institution_keywords.clone()),
            header_region: pick(oe, be, |e| e.header_region),
            content_region: pick(oe, be, |e| e.content_region),
            footer_region: pick(oe, be, |e| e.footer_region),
        }),
        scoring: Some(ScoringSection {
            max_candidates: pick(os, bs, |s| s.max_candidates),
            min_length: pick(os, bs, |s| s.min_length),
            max_length: pick(os, bs, |s| s.max_length),
            min_words: pick(os, bs, |s| s.min_words),
            max_words: pick(os, bs, |s| s.max_words),
            min_upper_ratio: pick(os, bs, |s| s.min_upper_ratio),
            max_upper_ratio: pick(os, bs, |s| s.max_upper_ratio),
            length_weight: pick(os, bs, |s| s.length_weight),
            words_weight: pick(os, bs, |s| s.words_weight),
            case_weight: pick(os, bs, |s| s.case_weight),
            keyword_weight: pick(os, bs, |s| s.keyword_weight),
        }),
        rename: Some(RenameSection {
            recursive: pick(or, br, |r| r.recursive),
            custom_name: pick(or, br, |r| r.custom_name.clone()),
            skip_patterns: pick(or, br, |r| r.skip_patterns.clone()),
        }),
        output: Some(OutputSection {
            log_dir: pick(oo, bo, |o| o.log_dir.clone()),
            report_format: pick(oo, bo, |o| o.report_format.clone()),
            report_path: pick(oo, bo, |o| o.report_path.clone()),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}
