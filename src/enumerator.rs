//! Recursive, deterministic file discovery.

use crate::config::CompiledFilters;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Lists the files under a source root.
///
/// Entries are visited in file-name order at every level, so the output order is
/// stable for a given directory state. Paths that must never be picked up (the
/// output directory and the report file when they live inside the source tree)
/// are registered with [`FileEnumerator::exclude`].
pub struct FileEnumerator<'a> {
    root: &'a Path,
    filters: &'a CompiledFilters,
    excluded: Vec<PathBuf>,
}

impl<'a> FileEnumerator<'a> {
    pub fn new(root: &'a Path, filters: &'a CompiledFilters) -> Self {
        Self {
            root,
            filters,
            excluded: Vec::new(),
        }
    }

    /// Skips `path` (and everything below it) if it lies inside the root.
    pub fn exclude(mut self, path: &Path) -> Self {
        if let Some(relative) = relative_to_root(self.root, path)
            && !relative.as_os_str().is_empty()
        {
            debug!(path = %relative.display(), "excluding from enumeration");
            self.excluded.push(relative);
        }
        self
    }

    /// Walks the tree and returns the matching files in enumeration order.
    pub fn files(&self) -> Vec<PathBuf> {
        WalkDir::new(self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.should_visit(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.filters.should_include(self.relative(entry.path())))
            .map(DirEntry::into_path)
            .collect()
    }

    fn should_visit(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let relative = self.relative(entry.path());
        if self
            .excluded
            .iter()
            .any(|excluded| relative.starts_with(excluded))
        {
            return false;
        }
        if entry.file_type().is_dir() {
            return self.filters.should_descend(relative);
        }
        true
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.root).unwrap_or(path)
    }
}

/// Expresses `path` relative to `root`, resolving symlinks and `..` on both sides.
///
/// Works for paths that do not exist yet as long as their parent does.
fn relative_to_root(root: &Path, path: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let full = match path.canonicalize() {
        Ok(full) => full,
        Err(_) => {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            parent.canonicalize().ok()?.join(path.file_name()?)
        }
    };
    full.strip_prefix(&root).ok().map(Path::to_path_buf)
}
