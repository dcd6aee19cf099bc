use crate::error::Error;
use config::{Config, ConfigError, File as ConfigFile};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Manifest output format. CSV is the canonical manifest; JSON-lines mode
/// writes one serialized action per line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_paths: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub dest_root: String,
    #[serde(default = "default_role_suffixes")]
    pub role_suffixes: Vec<String>,
    /// Free-form subcategory name mapped to the extensions it claims,
    /// e.g. `csv_processing = ["csv", "xlsx"]`. Subcategories take
    /// precedence over the built-in category directories for ungrouped files.
    #[serde(default)]
    pub subcategories: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub parallel_moves: bool,
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    #[serde(default)]
    pub report_format: ReportFormat,
}

fn default_role_suffixes() -> Vec<String> {
    ["_analysis.txt", "_transcript.txt", ".srt", ".mp3", ".png", ".jpg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_report_dir() -> String {
    ".".to_string()
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Compile the configured exclusion patterns. A malformed pattern is a
/// configuration error and aborts before any filesystem mutation.
pub fn compile_exclude_patterns(patterns: &[String]) -> Result<Vec<Regex>, Error> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Read an exclusion rule file: one regex per line, blank lines and `#`
/// comments ignored.
pub fn load_exclude_file(path: &Path) -> Result<Vec<String>, Error> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        let mut should_add = true;
        let result_clone = result.clone();

        for res_dir in &result_clone {
            let res_dir_path = Path::new(res_dir);

            if dir_path.starts_with(res_dir_path) {
                should_add = false;
                break;
            }

            if res_dir_path.starts_with(dir_path) {
                result.retain(|x| x != res_dir);
                break;
            }
        }

        if should_add {
            result.push(dir);
        }
    }

    result
}
