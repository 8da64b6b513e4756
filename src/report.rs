//! Per-file records and the plain-text run report.
//!
//! [`Reporter::render`] is a pure function of the records, the run context and a
//! timestamp; [`Reporter::write`] stamps the current local time and writes the
//! result to disk.

use crate::title::TitleSource;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 80;
const TITLE_WIDTH: usize = 40;
const FILENAME_WIDTH: usize = 30;
const SOURCE_WIDTH: usize = 10;
const LABEL_WIDTH: usize = 26;

/// What happened to a file's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyStatus {
    /// Copied to the given path.
    Copied(PathBuf),
    /// The copy failed; the reason is kept for the report.
    Failed(String),
    /// Dry run: the name was assigned but nothing was written.
    Planned,
}

/// Everything known about one input file after processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Where the file was found.
    pub original_path: PathBuf,
    /// The resolved title.
    pub extracted_title: String,
    /// Where the title came from.
    pub title_source: TitleSource,
    /// The title-based name, present only when renaming is enabled.
    pub final_name: Option<String>,
    /// The name the copy carries in the output directory.
    pub output_name: String,
    /// Outcome of the copy.
    pub status: CopyStatus,
}

/// Counts derived from a run's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub from_content: usize,
    pub from_filename: usize,
    pub copied: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_records(records: &[FileRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.title_source {
                TitleSource::Content => summary.from_content += 1,
                TitleSource::Filename => summary.from_filename += 1,
            }
            match record.status {
                CopyStatus::Copied(_) => summary.copied += 1,
                CopyStatus::Failed(_) => summary.failed += 1,
                CopyStatus::Planned => {}
            }
        }
        summary
    }
}

/// Run-level facts printed in the report header.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub source_dir: &'a Path,
    pub output_dir: &'a Path,
    pub report_path: &'a Path,
    pub renamed: bool,
    pub dry_run: bool,
}

/// Renders and writes the run report.
pub struct Reporter;

impl Reporter {
    /// Renders the report text.
    pub fn render(
        records: &[FileRecord],
        context: &ReportContext<'_>,
        generated_at: DateTime<Local>,
    ) -> String {
        let summary = RunSummary::from_records(records);
        let heavy_rule = "=".repeat(RULE_WIDTH);
        let light_rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        push_line(&mut out, &heavy_rule);
        push_line(&mut out, "SORTED FILES REPORT");
        push_line(&mut out, &heavy_rule);
        push_line(
            &mut out,
            &format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        );
        out.push('\n');

        push_line(&mut out, "SUMMARY");
        push_line(&mut out, &light_rule);
        push_field(&mut out, "Total Files:", summary.total);
        push_field(&mut out, "Titles from Content:", summary.from_content);
        push_field(&mut out, "Titles from Filename:", summary.from_filename);
        push_field(&mut out, "Files Renamed:", yes_no(context.renamed));
        push_field(&mut out, "Files Copied:", summary.copied);
        push_field(&mut out, "Copy Failures:", summary.failed);
        push_field(&mut out, "Source Directory:", context.source_dir.display());
        push_field(&mut out, "Output Directory:", context.output_dir.display());
        if context.dry_run {
            push_field(&mut out, "Mode:", "Dry run (no files copied)");
        }
        out.push('\n');

        push_line(&mut out, "DETAILED FILE LIST");
        push_line(&mut out, &light_rule);
        push_row(&mut out, "Title", "Filename", "Source");
        push_line(&mut out, &light_rule);
        for record in records {
            push_row(
                &mut out,
                &clip(&record.extracted_title, TITLE_WIDTH),
                &clip(&record.output_name, FILENAME_WIDTH),
                record.title_source.as_str(),
            );
        }
        push_line(&mut out, &light_rule);

        let failures: Vec<_> = records
            .iter()
            .filter_map(|record| match &record.status {
                CopyStatus::Failed(reason) => Some((&record.original_path, reason)),
                _ => None,
            })
            .collect();
        if !failures.is_empty() {
            out.push('\n');
            push_line(&mut out, "FAILED COPIES");
            push_line(&mut out, &light_rule);
            for (path, reason) in failures {
                push_line(&mut out, &format!("{}: {}", path.display(), reason));
            }
            push_line(&mut out, &light_rule);
        }

        out.push('\n');
        push_line(
            &mut out,
            &format!("Report saved to: {}", context.report_path.display()),
        );
        out
    }

    /// Renders the report with the current local time and writes it to
    /// `context.report_path`, creating parent directories as needed.
    pub fn write(records: &[FileRecord], context: &ReportContext<'_>) -> io::Result<()> {
        let text = Self::render(records, context, Local::now());
        if let Some(parent) = context.report_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(context.report_path, text)
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_field(out: &mut String, label: &str, value: impl std::fmt::Display) {
    push_line(out, &format!("{label:<LABEL_WIDTH$}{value}"));
}

fn push_row(out: &mut String, title: &str, filename: &str, source: &str) {
    let row = format!(
        "{title:<TITLE_WIDTH$} {filename:<FILENAME_WIDTH$} {source:<SOURCE_WIDTH$}"
    );
    push_line(out, row.trim_end());
}

/// Cuts `text` to `width` characters, marking the cut with `...`.
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(title: &str, source: TitleSource, name: &str, status: CopyStatus) -> FileRecord {
        FileRecord {
            original_path: PathBuf::from(format!("src/{name}")),
            extracted_title: title.to_string(),
            title_source: source,
            final_name: None,
            output_name: name.to_string(),
            status,
        }
    }

    fn context<'a>(report_path: &'a Path) -> ReportContext<'a> {
        ReportContext {
            source_dir: Path::new("./files_to_sort"),
            output_dir: Path::new("./sorted_files"),
            report_path,
            renamed: true,
            dry_run: false,
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record("A", TitleSource::Content, "A.txt", CopyStatus::Copied("o/A.txt".into())),
            record("B", TitleSource::Filename, "B.txt", CopyStatus::Failed("denied".into())),
            record("C", TitleSource::Content, "C.txt", CopyStatus::Planned),
        ];
        let summary = RunSummary::from_records(&records);
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                from_content: 2,
                from_filename: 1,
                copied: 1,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_render_layout() {
        let records = vec![
            record(
                "Annual Report 2024",
                TitleSource::Content,
                "Annual Report 2024.md",
                CopyStatus::Copied("o/Annual Report 2024.md".into()),
            ),
            record(
                "Important Data Backup",
                TitleSource::Filename,
                "Important Data Backup.txt",
                CopyStatus::Copied("o/Important Data Backup.txt".into()),
            ),
        ];
        let report_path = PathBuf::from("./file_sorting_report.txt");
        let text = Reporter::render(&records, &context(&report_path), fixed_time());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "SORTED FILES REPORT");
        assert_eq!(lines[3], "Generated on: 2024-01-15 09:30:00");
        assert!(text.contains("Total Files:              2\n"));
        assert!(text.contains("Titles from Content:      1\n"));
        assert!(text.contains("Titles from Filename:     1\n"));
        assert!(text.contains("Files Renamed:            Yes\n"));
        assert!(text.contains("Source Directory:         ./files_to_sort\n"));
        assert!(text.contains("Output Directory:         ./sorted_files\n"));
        assert!(!text.contains("Mode:"));
        assert!(!text.contains("FAILED COPIES"));
        assert!(text.ends_with("Report saved to: ./file_sorting_report.txt\n"));

        let header = format!("{:<40} {:<30} Source", "Title", "Filename");
        assert!(lines.contains(&header.as_str()));
        let row = format!(
            "{:<40} {:<30} content",
            "Annual Report 2024", "Annual Report 2024.md"
        );
        assert!(lines.contains(&row.as_str()));
    }

    #[test]
    fn test_rows_keep_processing_order() {
        let records = vec![
            record("Zeta", TitleSource::Content, "z.txt", CopyStatus::Planned),
            record("Alpha", TitleSource::Content, "a.txt", CopyStatus::Planned),
        ];
        let report_path = PathBuf::from("r.txt");
        let text = Reporter::render(&records, &context(&report_path), fixed_time());
        let zeta = text.find("Zeta").unwrap();
        let alpha = text.find("Alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_long_values_are_clipped() {
        let long_title = "T".repeat(60);
        let long_name = format!("{}.txt", "n".repeat(40));
        let records = vec![record(
            &long_title,
            TitleSource::Content,
            &long_name,
            CopyStatus::Planned,
        )];
        let report_path = PathBuf::from("r.txt");
        let text = Reporter::render(&records, &context(&report_path), fixed_time());

        let clipped_title = format!("{}...", "T".repeat(37));
        let clipped_name = format!("{}...", "n".repeat(27));
        let row = format!("{clipped_title:<40} {clipped_name:<30} content");
        assert!(text.lines().any(|line| line == row));
    }

    #[test]
    fn test_clip_counts_chars() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip(&"é".repeat(12), 10), format!("{}...", "é".repeat(7)));
    }

    #[test]
    fn test_failures_and_dry_run_sections() {
        let records = vec![record(
            "Broken",
            TitleSource::Filename,
            "broken.txt",
            CopyStatus::Failed("permission denied".into()),
        )];
        let report_path = PathBuf::from("r.txt");
        let mut ctx = context(&report_path);
        ctx.dry_run = true;
        ctx.renamed = false;
        let text = Reporter::render(&records, &ctx, fixed_time());

        assert!(text.contains("Files Renamed:            No\n"));
        assert!(text.contains("Copy Failures:            1\n"));
        assert!(text.contains("Mode:                     Dry run (no files copied)\n"));
        assert!(text.contains("FAILED COPIES\n"));
        assert!(text.contains("src/broken.txt: permission denied\n"));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report_path = temp_dir.path().join("reports").join("run.txt");
        let records = vec![record("A", TitleSource::Content, "A.txt", CopyStatus::Planned)];

        Reporter::write(&records, &context(&report_path)).expect("Failed to write report");
        let text = fs::read_to_string(&report_path).expect("Failed to read report");
        assert!(text.starts_with(&"=".repeat(80)));
        assert!(text.contains("Total Files:              1\n"));
    }
}
