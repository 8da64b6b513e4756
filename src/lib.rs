//! retitle - Copy files into one folder, named after the titles inside them
//!
//! This library provides utilities for discovering files, extracting a
//! human-readable title from their content or filename, turning titles into
//! safe and unique file names, copying files into an output directory, and
//! writing a plain-text report of the run. Filtering and limits are
//! configurable via TOML configuration files.

pub mod cli;
pub mod config;
pub mod copier;
pub mod enumerator;
pub mod file_kind;
pub mod logging;
pub mod output;
pub mod report;
pub mod sanitize;
pub mod title;

pub use config::{CompiledFilters, ConfigError, RunSettings, SorterConfig, TitleRules};
pub use copier::{CopyError, FileCopier};
pub use enumerator::FileEnumerator;
pub use file_kind::{ContentKind, KindMapper};
pub use report::{CopyStatus, FileRecord, Reporter, RunSummary};
pub use sanitize::{NameRegistry, NameSanitizer};
pub use title::{ResolvedTitle, TitleResolver, TitleSource};

pub use cli::{Args, RunError, RunOutcome, process_files, run_cli};
