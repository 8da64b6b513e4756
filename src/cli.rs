//! Command-line interface and run pipeline for retitle.
//!
//! This module handles:
//! - Command-line parsing and config overrides
//! - Source directory validation
//! - File enumeration, title resolution and naming
//! - Copying into the output directory
//! - Report generation and the console summary

use crate::config::{ConfigError, RunSettings, SorterConfig};
use crate::copier::{CopyError, FileCopier};
use crate::enumerator::FileEnumerator;
use crate::output::OutputFormatter;
use crate::report::{CopyStatus, FileRecord, ReportContext, Reporter, RunSummary};
use crate::sanitize::{NameRegistry, NameSanitizer, extension_of};
use crate::title::TitleResolver;
use clap::{ArgAction, Parser};
use indicatif::ProgressBar;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Command-line arguments. Every value overrides the configuration file.
#[derive(Debug, Parser)]
#[command(name = "retitle", version)]
#[command(
    about = "Copy files into one folder, naming them after titles found in their content",
    long_about = None
)]
pub struct Args {
    /// Directory to scan recursively.
    pub source: Option<PathBuf>,

    /// Directory receiving the copies.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Path of the plain-text report.
    #[arg(short, long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Name copies after their extracted title.
    #[arg(long)]
    pub rename: bool,

    /// Keep original names even if the config file enables renaming.
    #[arg(long, conflicts_with = "rename")]
    pub keep_names: bool,

    /// Resolve titles and write the report without copying anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (defaults to .retitlerc.toml, then ~/.config/retitle/config.toml).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Loads the configuration file and applies the command-line overrides.
    pub fn load_config(&self) -> Result<SorterConfig, ConfigError> {
        let mut config = SorterConfig::load(self.config.as_deref())?;
        self.apply_overrides(&mut config.run);
        Ok(config)
    }

    /// Applies the command-line values on top of `settings`.
    pub fn apply_overrides(&self, settings: &mut RunSettings) {
        if let Some(source) = &self.source {
            settings.source_dir = source.clone();
        }
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(report) = &self.report {
            settings.report_path = report.clone();
        }
        if self.rename {
            settings.rename = true;
        }
        if self.keep_names {
            settings.rename = false;
        }
    }
}

/// Errors that stop a run before or after the per-file stage.
#[derive(Debug, Error)]
pub enum RunError {
    /// The source directory does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// The source path exists but is not a directory.
    #[error("Source path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Output and source are the same directory.
    #[error("Output directory must differ from the source directory: {}", .0.display())]
    OutputIsSource(PathBuf),
    /// Configuration or filter compilation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The output directory could not be prepared.
    #[error(transparent)]
    Output(#[from] CopyError),
    /// Existing output entries could not be listed.
    #[error("Failed to read output directory {}: {source}", .path.display())]
    OutputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The report could not be written.
    #[error("Failed to write report {}: {source}", .path.display())]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<FileRecord>,
    pub summary: RunSummary,
}

/// Runs the full pipeline: process every file, write the report, print a summary.
///
/// Per-file copy failures do not make the run fail; they are listed in the report
/// and counted in the returned summary.
///
/// # Examples
///
/// ```no_run
/// use retitle::cli::run_cli;
/// use retitle::config::SorterConfig;
///
/// let mut config = SorterConfig::default();
/// config.run.rename = true;
/// match run_cli(&config, false) {
///     Ok(outcome) => println!("{} files processed", outcome.summary.total),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(config: &SorterConfig, dry_run: bool) -> Result<RunOutcome, RunError> {
    let settings = &config.run;
    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            settings.source_dir.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Sorting contents of: {}",
            settings.source_dir.display()
        ));
    }

    let records = process_files(config, dry_run)?;
    let summary = RunSummary::from_records(&records);

    let context = ReportContext {
        source_dir: &settings.source_dir,
        output_dir: &settings.output_dir,
        report_path: &settings.report_path,
        renamed: settings.rename,
        dry_run,
    };
    Reporter::write(&records, &context).map_err(|source| RunError::ReportWriteFailed {
        path: settings.report_path.clone(),
        source,
    })?;

    OutputFormatter::summary_table(
        "Title source",
        &[
            ("content", summary.from_content),
            ("filename", summary.from_filename),
        ],
        summary.total,
    );
    println!();

    if summary.failed > 0 {
        OutputFormatter::warning(&format!(
            "{} of {} files could not be copied. See the report for details.",
            summary.failed, summary.total
        ));
    }
    if dry_run {
        OutputFormatter::dry_run_notice("No files were copied.");
        OutputFormatter::plain("Run again without --dry-run to copy the files.");
    } else {
        OutputFormatter::success(&format!(
            "Sorted files located in: {}",
            settings.output_dir.display()
        ));
    }
    OutputFormatter::success(&format!(
        "Report available at: {}",
        settings.report_path.display()
    ));

    Ok(RunOutcome { records, summary })
}

/// Processes every file under the source directory and returns one record per file.
///
/// This is the pipeline without the report and console summary:
/// 1. Validates the source directory
/// 2. Compiles the filter rules
/// 3. Enumerates files in a stable order, skipping the output directory and report
/// 4. Creates the output directory (unless `dry_run`)
/// 5. Resolves a title and assigns a unique output name for each file
/// 6. Copies each file (unless `dry_run`), isolating failures per file
pub fn process_files(config: &SorterConfig, dry_run: bool) -> Result<Vec<FileRecord>, RunError> {
    let settings = &config.run;
    validate_source(&settings.source_dir)?;
    if same_directory(&settings.source_dir, &settings.output_dir) {
        return Err(RunError::OutputIsSource(settings.output_dir.clone()));
    }

    let filters = config.compile_filters()?;
    let files = FileEnumerator::new(&settings.source_dir, &filters)
        .exclude(&settings.output_dir)
        .exclude(&settings.report_path)
        .files();
    info!(count = files.len(), source = %settings.source_dir.display(), "files discovered");

    if !dry_run {
        FileCopier::ensure_output_dir(&settings.output_dir)?;
    }
    let mut registry = NameRegistry::from_existing(&settings.output_dir).map_err(|source| {
        RunError::OutputUnreadable {
            path: settings.output_dir.clone(),
            source,
        }
    })?;
    if let Some(report_name) = report_name_in(&settings.output_dir, &settings.report_path) {
        debug!(name = %report_name, "reserving report name in output directory");
        registry.register(&report_name);
    }

    let progress = OutputFormatter::create_progress_bar(files.len() as u64);
    let mut pipeline = Pipeline {
        settings,
        resolver: TitleResolver::new(config.titles.clone()),
        sanitizer: NameSanitizer::new(config.titles.max_name_len),
        registry,
        dry_run,
        progress: &progress,
    };

    let records = files.iter().map(|path| pipeline.process(path)).collect();
    progress.finish_and_clear();
    Ok(records)
}

/// Per-run state shared by every file.
struct Pipeline<'a> {
    settings: &'a RunSettings,
    resolver: TitleResolver,
    sanitizer: NameSanitizer,
    registry: NameRegistry,
    dry_run: bool,
    progress: &'a ProgressBar,
}

impl Pipeline<'_> {
    fn process(&mut self, path: &Path) -> FileRecord {
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.progress.set_message(original_name.clone());

        let resolved = self.resolver.resolve(path);

        let (final_name, output_name) = if self.settings.rename {
            let name =
                self.sanitizer
                    .assign(&resolved.title, &extension_of(path), &mut self.registry);
            (Some(name.clone()), name)
        } else {
            (None, self.registry.claim_original(&original_name))
        };

        let status = if self.dry_run {
            CopyStatus::Planned
        } else {
            match FileCopier::copy_with_record(&self.settings.output_dir, path, &output_name) {
                Ok(operation) => {
                    info!(
                        from = %operation.original_path.display(),
                        to = %operation.new_path.display(),
                        bytes = operation.bytes,
                        "copied"
                    );
                    CopyStatus::Copied(operation.new_path)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "copy failed");
                    self.progress
                        .suspend(|| OutputFormatter::error(&format!("{}", e)));
                    CopyStatus::Failed(e.to_string())
                }
            }
        };

        self.progress.inc(1);
        FileRecord {
            original_path: path.to_path_buf(),
            extracted_title: resolved.title,
            title_source: resolved.source,
            final_name,
            output_name,
            status,
        }
    }
}

fn validate_source(source_dir: &Path) -> Result<(), RunError> {
    if !source_dir.exists() {
        return Err(RunError::SourceNotFound(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(RunError::SourceNotDirectory(source_dir.to_path_buf()));
    }
    Ok(())
}

/// The report's file name, if the report is written straight into `output_dir`.
fn report_name_in(output_dir: &Path, report_path: &Path) -> Option<String> {
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !same_directory(parent, output_dir) {
        return None;
    }
    report_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TitleRules;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["retitle"]).unwrap();
        assert!(args.source.is_none());
        assert!(!args.rename);
        assert!(!args.dry_run);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_full() {
        let args = Args::try_parse_from([
            "retitle", "docs", "-o", "out", "--report", "r.txt", "--rename", "--dry-run", "-vv",
        ])
        .unwrap();
        assert_eq!(args.source, Some(PathBuf::from("docs")));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.report, Some(PathBuf::from("r.txt")));
        assert!(args.rename);
        assert!(args.dry_run);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_rename_conflicts_with_keep_names() {
        let result = Args::try_parse_from(["retitle", "--rename", "--keep-names"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply_on_top_of_settings() {
        let args = Args::try_parse_from(["retitle", "in", "--keep-names"]).unwrap();
        let mut settings = RunSettings {
            rename: true,
            ..RunSettings::default()
        };
        args.apply_overrides(&mut settings);

        assert_eq!(settings.source_dir, PathBuf::from("in"));
        assert_eq!(settings.output_dir, RunSettings::default().output_dir);
        assert!(!settings.rename);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let mut config = SorterConfig::default();
        config.run.source_dir = PathBuf::from("/non/existent/source");
        let result = process_files(&config, true);
        assert!(matches!(result, Err(RunError::SourceNotFound(_))));
    }

    #[test]
    fn test_report_name_reserved_only_inside_output_dir() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.path().join("out");
        std::fs::create_dir(&output).expect("Failed to create output dir");

        assert_eq!(
            report_name_in(&output, &output.join("report.txt")),
            Some("report.txt".to_string())
        );
        assert_eq!(
            report_name_in(&output, &output.join("nested").join("r.txt")),
            None
        );
        assert_eq!(report_name_in(&output, &temp_dir.path().join("report.txt")), None);
    }

    #[test]
    fn test_failed_copy_does_not_stop_later_files() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.path().join("out");
        std::fs::create_dir(&output).expect("Failed to create output dir");
        let present = temp_dir.path().join("present.txt");
        std::fs::write(&present, "# Present\n").expect("Failed to write file");

        let settings = RunSettings {
            rename: true,
            source_dir: temp_dir.path().to_path_buf(),
            output_dir: output.clone(),
            report_path: temp_dir.path().join("report.txt"),
        };
        let progress = ProgressBar::hidden();
        let mut pipeline = Pipeline {
            settings: &settings,
            resolver: TitleResolver::new(TitleRules::default()),
            sanitizer: NameSanitizer::new(200),
            registry: NameRegistry::new(),
            dry_run: false,
            progress: &progress,
        };

        let vanished = pipeline.process(&temp_dir.path().join("vanished_notes.txt"));
        let copied = pipeline.process(&present);

        assert!(matches!(vanished.status, CopyStatus::Failed(_)));
        assert_eq!(vanished.extracted_title, "Vanished Notes");
        assert!(!output.join("Vanished Notes.txt").exists());
        assert_eq!(
            copied.status,
            CopyStatus::Copied(output.join("Present.txt"))
        );
    }

    #[test]
    fn test_run_error_messages() {
        let err = RunError::SourceNotFound(PathBuf::from("missing"));
        assert_eq!(err.to_string(), "Source directory not found: missing");

        let err = RunError::from(ConfigError::InvalidGlobPattern("[x".to_string()));
        assert_eq!(
            err.to_string(),
            "Invalid glob pattern '[x': expected *.ext or dir/**"
        );
    }
}
