//! Run configuration and file filtering rules.
//!
//! Configuration is loaded from a TOML file and layered under command-line
//! overrides. Every section and key is optional; missing values fall back to the
//! documented defaults. Filtering supports several strategies:
//! - Exact filename matching
//! - Glob pattern matching (against the path relative to the source directory)
//! - File extension matching
//! - Regex pattern matching
//! - Include (whitelist) rules that override exclude rules
//!
//! # Configuration File Format
//!
//! ```toml
//! [run]
//! rename = false
//! source_dir = "./files_to_sort"
//! output_dir = "./sorted_files"
//! report_path = "./file_sorting_report.txt"
//!
//! [titles]
//! content_prefix_bytes = 1000
//! min_title_len = 3
//! max_title_len = 100
//! max_name_len = 200
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory scanned for files.
pub const DEFAULT_SOURCE_DIR: &str = "./files_to_sort";
/// Default directory receiving the copies.
pub const DEFAULT_OUTPUT_DIR: &str = "./sorted_files";
/// Default location of the plain-text report.
pub const DEFAULT_REPORT_PATH: &str = "./file_sorting_report.txt";

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// A title or name limit that cannot work (zero, or min above max).
    #[error("Invalid title settings: {0}")]
    InvalidTitleRules(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Complete configuration for one sorting run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    /// Where to read, where to write, and whether to rename.
    pub run: RunSettings,
    /// Limits for title extraction and name sanitizing.
    pub titles: TitleRules,
    /// Which files take part in the run.
    pub filters: FilterRules,
}

/// The four core run values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Name copies after their extracted title instead of keeping the original name.
    pub rename: bool,
    /// Directory scanned recursively for input files.
    pub source_dir: PathBuf,
    /// Directory receiving the copies. Created if missing.
    pub output_dir: PathBuf,
    /// Path of the plain-text report.
    pub report_path: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            rename: false,
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
        }
    }
}

/// Limits applied while extracting titles and building names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleRules {
    /// How many leading bytes of each file are inspected.
    pub content_prefix_bytes: usize,
    /// Shortest first line (in chars) accepted as a title.
    pub min_title_len: usize,
    /// Longest first line (in chars) accepted as a title.
    pub max_title_len: usize,
    /// Maximum length (in chars) of a sanitized name, extension excluded.
    pub max_name_len: usize,
}

impl Default for TitleRules {
    fn default() -> Self {
        Self {
            content_prefix_bytes: 1000,
            min_title_len: 3,
            max_title_len: 100,
            max_name_len: 200,
        }
    }
}

impl TitleRules {
    /// Rejects limits that would make every title or name impossible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content_prefix_bytes == 0 {
            return Err(ConfigError::InvalidTitleRules(
                "content_prefix_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_name_len == 0 {
            return Err(ConfigError::InvalidTitleRules(
                "max_name_len must be greater than zero".to_string(),
            ));
        }
        if self.min_title_len > self.max_title_len {
            return Err(ConfigError::InvalidTitleRules(format!(
                "min_title_len ({}) exceeds max_title_len ({})",
                self.min_title_len, self.max_title_len
            )));
        }
        Ok(())
    }
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Whether to include hidden files and directories (starting with "."). Defaults to false.
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    pub include: IncludeRules,
}

/// Rules for excluding files from the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp", "node_modules/**").
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp", "log").
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    pub patterns: Vec<String>,
}

impl SorterConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.retitlerc.toml` in the current directory
    /// 3. Look for `~/.config/retitle/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be
    /// read, or if any discovered file fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".retitlerc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("retitle")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.titles.validate()?;
        Ok(config)
    }

    /// Compile the filter section into matcher structures.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Compiled filter structures for matching files during enumeration.
///
/// All glob and regex patterns are parsed once up front, so a bad pattern is
/// reported before any file is touched.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file should take part in the run.
    ///
    /// `file_path` is expected to be relative to the source directory.
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_include_patterns(file_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_exclude_patterns(file_path) {
            return false;
        }

        if self.matches_exclude_regex(&file_name) {
            return false;
        }

        true
    }

    /// Check if the walker should enter a directory.
    ///
    /// Hidden directories are skipped unless hidden files are enabled.
    pub fn should_descend(&self, dir_path: &Path) -> bool {
        if self.enable_hidden_files {
            return true;
        }
        !dir_path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
    }

    fn matches_include_patterns(&self, file_path: &Path) -> bool {
        self.include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
    }

    fn matches_exclude_patterns(&self, file_path: &Path) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
    }

    fn matches_exclude_regex(&self, file_name: &str) -> bool {
        self.exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
