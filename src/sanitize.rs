//! Filename sanitizing and collision resolution.
//!
//! [`NameSanitizer`] turns a title into a name that is safe on Linux, macOS and
//! Windows. [`NameRegistry`] tracks every name handed out in the output directory
//! during a run and resolves clashes with `_1`, `_2`, ... suffixes.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Characters rejected by at least one common filesystem.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Windows device names that cannot be used as a file stem.
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
    "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Stem used when a title sanitizes to nothing.
const FALLBACK_STEM: &str = "untitled";

/// Names already taken in the output directory, scoped to one run.
///
/// Comparison is case-insensitive so that the result is also collision-free on
/// case-insensitive filesystems.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: HashSet<String>,
}

impl NameRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every entry already present in `dir`.
    ///
    /// A missing directory yields an empty registry.
    pub fn from_existing(dir: &Path) -> io::Result<Self> {
        let mut registry = Self::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(registry),
            Err(e) => return Err(e),
        };
        for entry in entries {
            let entry = entry?;
            registry.register(&entry.file_name().to_string_lossy());
        }
        Ok(registry)
    }

    /// Returns true if `name` is already taken.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Marks `name` as taken. Returns false if it already was.
    pub fn register(&mut self, name: &str) -> bool {
        self.names.insert(name.to_lowercase())
    }

    /// Number of names taken.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no name has been taken.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Claims `stem + extension`, or the first free `stem_N + extension`.
    ///
    /// When a suffix is needed the stem is shortened so that stem and suffix
    /// together stay within `max_stem_chars`. The chosen name is registered before
    /// it is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use retitle::sanitize::NameRegistry;
    ///
    /// let mut registry = NameRegistry::new();
    /// assert_eq!(registry.claim("Notes", ".txt", 200), "Notes.txt");
    /// assert_eq!(registry.claim("Notes", ".txt", 200), "Notes_1.txt");
    /// assert_eq!(registry.claim("Notes", ".txt", 200), "Notes_2.txt");
    /// ```
    pub fn claim(&mut self, stem: &str, extension: &str, max_stem_chars: usize) -> String {
        let mut candidate = format!("{stem}{extension}");
        let mut counter: usize = 1;
        while self.contains(&candidate) {
            let suffix = format!("_{counter}");
            let room = max_stem_chars.saturating_sub(suffix.len());
            let base = truncate_chars(stem, room).trim_end();
            candidate = format!("{base}{suffix}{extension}");
            counter += 1;
        }
        self.register(&candidate);
        candidate
    }

    /// Claims an unchanged original file name, suffixing it only on collision.
    pub fn claim_original(&mut self, file_name: &str) -> String {
        let (stem, extension) = split_name(file_name);
        self.claim(stem, extension, usize::MAX)
    }
}

/// Builds safe, length-bounded file names from titles.
#[derive(Debug, Clone, Copy)]
pub struct NameSanitizer {
    max_len: usize,
}

impl NameSanitizer {
    /// Creates a sanitizer that caps stems at `max_len` characters.
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Sanitizes a title into a file stem (no extension).
    ///
    /// # Examples
    ///
    /// ```
    /// use retitle::sanitize::NameSanitizer;
    ///
    /// let sanitizer = NameSanitizer::new(200);
    /// assert_eq!(sanitizer.sanitize("Q4: Review / Plan?"), "Q4 Review Plan");
    /// assert_eq!(sanitizer.sanitize("***"), "untitled");
    /// ```
    pub fn sanitize(&self, title: &str) -> String {
        let cleaned: String = title
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .filter(|c| !INVALID_CHARS.contains(c))
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        let trimmed = collapsed.trim_start_matches(['.', ' ']);
        let truncated = truncate_chars(trimmed, self.max_len);

        let mut stem = truncated.trim_end_matches(['.', ' ']).to_string();
        if stem.is_empty() {
            stem = FALLBACK_STEM.to_string();
        }
        if is_reserved(&stem) {
            stem.push('_');
        }
        stem
    }

    /// Sanitizes `title`, appends `extension` and claims a unique name in `registry`.
    ///
    /// # Examples
    ///
    /// ```
    /// use retitle::sanitize::{NameRegistry, NameSanitizer};
    ///
    /// let sanitizer = NameSanitizer::new(200);
    /// let mut registry = NameRegistry::new();
    /// assert_eq!(sanitizer.assign("Notes", ".txt", &mut registry), "Notes.txt");
    /// assert_eq!(sanitizer.assign("Notes", ".txt", &mut registry), "Notes_1.txt");
    /// ```
    pub fn assign(&self, title: &str, extension: &str, registry: &mut NameRegistry) -> String {
        let stem = self.sanitize(title);
        registry.claim(&stem, &sanitize_extension(extension), self.max_len)
    }
}

/// Applies the stem's character rules to an extension (with its dot).
///
/// Returns an empty string when nothing but the dot survives.
fn sanitize_extension(extension: &str) -> String {
    let body: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace() && !INVALID_CHARS.contains(c))
        .collect();
    let body = body.trim_end_matches('.');
    if body.is_empty() {
        String::new()
    } else {
        format!(".{body}")
    }
}

/// Returns the extension of `path` including its leading dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Splits a file name into stem and extension (with dot).
///
/// A leading dot does not start an extension, and neither does a trailing one.
pub fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(idx) if idx + 1 == file_name.len() => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn is_reserved(stem: &str) -> bool {
    RESERVED_STEMS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}
