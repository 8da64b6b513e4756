/// Copying files into the output directory.
///
/// This module creates the output directory and copies each input file into it
/// under its assigned name. Every copy is independent: a failure is returned to the
/// caller for that file alone and never aborts the run.
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Records a single completed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOperation {
    /// The path the file was read from.
    pub original_path: PathBuf,
    /// The path of the new copy.
    pub new_path: PathBuf,
    /// Number of bytes copied.
    pub bytes: u64,
}

/// Errors that can occur while copying files.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Failed to create the output directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The output path exists but is not a directory.
    #[error("Output path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// Refused to overwrite an existing file.
    #[error("Destination {} already exists", .0.display())]
    DestinationExists(PathBuf),
    /// The copy itself failed (permissions, disk full, source vanished, ...).
    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for copy operations.
pub type CopyResult<T> = Result<T, CopyError>;

/// Copies files into a flat output directory.
pub struct FileCopier;

impl FileCopier {
    /// Creates the output directory (and parents) if it does not exist yet.
    pub fn ensure_output_dir(output_dir: &Path) -> CopyResult<()> {
        if output_dir.exists() {
            if !output_dir.is_dir() {
                return Err(CopyError::NotADirectory(output_dir.to_path_buf()));
            }
            return Ok(());
        }

        fs::create_dir_all(output_dir).map_err(|e| CopyError::DirectoryCreationFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })
    }

    /// Copies `file_path` into `output_dir` as `file_name` and records the operation.
    ///
    /// The destination must not exist yet. The source's modification time is
    /// carried over when the platform allows it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use retitle::copier::FileCopier;
    /// use std::path::Path;
    ///
    /// let result = FileCopier::copy_with_record(
    ///     Path::new("/path/to/output"),
    ///     Path::new("/path/to/source/notes_2024.txt"),
    ///     "Meeting Notes.txt",
    /// );
    ///
    /// match result {
    ///     Ok(op) => println!("Copied {} to {}", op.original_path.display(), op.new_path.display()),
    ///     Err(e) => eprintln!("Copy failed: {}", e),
    /// }
    /// ```
    pub fn copy_with_record(
        output_dir: &Path,
        file_path: &Path,
        file_name: &str,
    ) -> CopyResult<CopyOperation> {
        let destination = output_dir.join(file_name);
        if destination.exists() {
            return Err(CopyError::DestinationExists(destination));
        }

        let bytes = match fs::copy(file_path, &destination) {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_partial(&destination);
                return Err(CopyError::CopyFailed {
                    from: file_path.to_path_buf(),
                    to: destination,
                    source: e,
                });
            }
        };

        if let Err(e) = preserve_modified_time(file_path, &destination) {
            debug!(path = %destination.display(), error = %e, "could not preserve modification time");
        }

        Ok(CopyOperation {
            original_path: file_path.to_path_buf(),
            new_path: destination,
            bytes,
        })
    }
}

/// Removes whatever a failed copy left at `destination`.
///
/// Only called after the destination was checked to be free, so anything there
/// was written by the failed copy.
fn discard_partial(destination: &Path) {
    match fs::remove_file(destination) {
        Ok(()) => debug!(path = %destination.display(), "removed partial copy"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %destination.display(), error = %e, "could not remove partial copy"),
    }
}

fn preserve_modified_time(source: &Path, destination: &Path) -> io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    OpenOptions::new()
        .write(true)
        .open(destination)?
        .set_modified(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_ensure_output_dir_creates_nested_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.path().join("a").join("b");

        FileCopier::ensure_output_dir(&output).expect("Failed to create output dir");
        assert!(output.is_dir());

        // Second call is a no-op.
        FileCopier::ensure_output_dir(&output).expect("Existing dir should be accepted");
    }

    #[test]
    fn test_ensure_output_dir_rejects_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.path().join("not_a_dir");
        fs::write(&output, "x").expect("Failed to write file");

        let result = FileCopier::ensure_output_dir(&output);
        assert!(matches!(result, Err(CopyError::NotADirectory(_))));
    }

    #[test]
    fn test_copy_with_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes_2024.txt");
        fs::write(&source, "test content").expect("Failed to write test file");
        let output = temp_dir.path().join("out");
        fs::create_dir(&output).expect("Failed to create output dir");

        let op = FileCopier::copy_with_record(&output, &source, "Meeting Notes.txt")
            .expect("Failed to copy file");

        assert_eq!(op.original_path, source);
        assert_eq!(op.new_path, output.join("Meeting Notes.txt"));
        assert_eq!(op.bytes, 12);
        assert!(source.exists(), "source must be left in place");
        assert_eq!(
            fs::read_to_string(&op.new_path).expect("Failed to read copy"),
            "test content"
        );
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("old.txt");
        fs::write(&source, "old").expect("Failed to write test file");
        let past = SystemTime::now() - Duration::from_secs(86_400);
        OpenOptions::new()
            .write(true)
            .open(&source)
            .and_then(|f| f.set_modified(past))
            .expect("Failed to set mtime");

        let output = temp_dir.path().join("out");
        fs::create_dir(&output).expect("Failed to create output dir");
        let op = FileCopier::copy_with_record(&output, &source, "old.txt").expect("copy");

        let copied = fs::metadata(&op.new_path).and_then(|m| m.modified()).expect("mtime");
        let original = fs::metadata(&source).and_then(|m| m.modified()).expect("mtime");
        assert_eq!(copied, original);
    }

    #[test]
    fn test_copy_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        fs::write(&source, "new").expect("Failed to write test file");
        let output = temp_dir.path().join("out");
        fs::create_dir(&output).expect("Failed to create output dir");
        fs::write(output.join("a.txt"), "existing").expect("Failed to write existing");

        let result = FileCopier::copy_with_record(&output, &source, "a.txt");
        assert!(matches!(result, Err(CopyError::DestinationExists(_))));
        assert_eq!(
            fs::read_to_string(output.join("a.txt")).expect("read"),
            "existing"
        );
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = FileCopier::copy_with_record(
            temp_dir.path(),
            Path::new("/non/existent/file.txt"),
            "file.txt",
        );
        assert!(matches!(result, Err(CopyError::CopyFailed { .. })));
        assert!(!temp_dir.path().join("file.txt").exists());
    }

    #[test]
    fn test_discard_partial_removes_leftover() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let leftover = temp_dir.path().join("half.bin");
        fs::write(&leftover, [0u8; 16]).expect("Failed to write leftover");

        discard_partial(&leftover);
        assert!(!leftover.exists());

        // Nothing to remove is not an error.
        discard_partial(&leftover);
    }
}
