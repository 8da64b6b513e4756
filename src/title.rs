//! Title extraction from file content and file names.
//!
//! A [`TitleResolver`] reads a capped prefix of each file and runs an ordered list
//! of content matchers over it. The first matcher that produces a non-empty title
//! wins. When no matcher fires, or the file is not text-like, the title is derived
//! from the file name instead.
//!
//! # Examples
//!
//! ```
//! use retitle::config::TitleRules;
//! use retitle::title::{TitleResolver, TitleSource};
//! use std::path::Path;
//!
//! let resolver = TitleResolver::new(TitleRules::default());
//!
//! let resolved = resolver.resolve_prefix(Path::new("notes.md"), b"# Weekly Sync\n\nbody");
//! assert_eq!(resolved.title, "Weekly Sync");
//! assert_eq!(resolved.source, TitleSource::Content);
//!
//! let resolved = resolver.resolve_prefix(Path::new("my_doc_2024-01-15.txt"), b"");
//! assert_eq!(resolved.title, "My Doc");
//! assert_eq!(resolved.source, TitleSource::Filename);
//! ```

use crate::config::TitleRules;
use crate::file_kind::{ContentKind, KindMapper};
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

static MARKDOWN_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("valid markdown h1 regex"));
static TITLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Title:[ \t]*(.+)$").expect("valid title prefix regex"));
static HTML_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid html title regex")
});
static HTML_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("valid html h1 regex"));
static UNDERLINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([^\n]*\S[^\n]*)\n=+[ \t]*\r?$").expect("valid underline regex")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid html tag regex"));

/// Where a title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleSource {
    /// Extracted from the file's content.
    Content,
    /// Derived from the file name.
    Filename,
}

impl TitleSource {
    /// The lowercase tag used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleSource::Content => "content",
            TitleSource::Filename => "filename",
        }
    }
}

impl fmt::Display for TitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A title together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub title: String,
    pub source: TitleSource,
}

/// A content matcher: inspects decoded text and returns a title if its pattern applies.
pub type Matcher = fn(&str, &TitleRules) -> Option<String>;

/// Content matchers in priority order.
pub const MATCHERS: &[(&str, Matcher)] = &[
    ("markdown-h1", markdown_h1),
    ("title-prefix", title_prefix),
    ("html-title", html_title),
    ("html-h1", html_h1),
    ("underlined", underlined),
    ("first-line", first_line),
];

/// Resolves titles for files, one at a time.
#[derive(Debug, Clone)]
pub struct TitleResolver {
    rules: TitleRules,
    kinds: KindMapper,
}

impl TitleResolver {
    /// Creates a resolver with the standard kind table.
    pub fn new(rules: TitleRules) -> Self {
        Self {
            rules,
            kinds: KindMapper::default(),
        }
    }

    /// Reads the prefix of `path` and resolves its title.
    ///
    /// Read failures never propagate: they are logged and the filename path is used.
    pub fn resolve(&self, path: &Path) -> ResolvedTitle {
        let prefix = match read_prefix(path, self.rules.content_prefix_bytes) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read file content");
                Vec::new()
            }
        };
        self.resolve_prefix(path, &prefix)
    }

    /// Resolves a title from an already-read prefix.
    pub fn resolve_prefix(&self, path: &Path, prefix: &[u8]) -> ResolvedTitle {
        if let Some(title) = self.title_from_content(path, prefix) {
            return ResolvedTitle {
                title,
                source: TitleSource::Content,
            };
        }

        let title = title_from_filename(path);
        if !title.is_empty() {
            return ResolvedTitle {
                title,
                source: TitleSource::Filename,
            };
        }

        ResolvedTitle {
            title: literal_stem(path),
            source: TitleSource::Filename,
        }
    }

    /// Runs the content matchers if the prefix is text-like and valid UTF-8.
    pub fn title_from_content(&self, path: &Path, prefix: &[u8]) -> Option<String> {
        let extension = path.extension().and_then(|e| e.to_str());
        let kind = self.kinds.classify(extension, prefix);
        if kind == ContentKind::Binary {
            debug!(path = %path.display(), kind = kind.label(), "skipping content matchers");
            return None;
        }

        let Some(text) = decode_prefix(prefix) else {
            debug!(path = %path.display(), "content is not valid UTF-8");
            return None;
        };

        title_from_text(text, &self.rules)
    }
}

/// Runs every matcher over `text` in priority order and returns the first hit.
pub fn title_from_text(text: &str, rules: &TitleRules) -> Option<String> {
    MATCHERS.iter().find_map(|(name, matcher)| {
        let title = matcher(text, rules)?;
        debug!(matcher = name, title = %title, "content matcher hit");
        Some(title)
    })
}

/// `# Heading` at the start of a line.
pub fn markdown_h1(text: &str, _rules: &TitleRules) -> Option<String> {
    first_capture(&MARKDOWN_H1, text, |raw| raw.trim().to_string())
}

/// `Title: ...` at the start of a line (case-sensitive).
pub fn title_prefix(text: &str, _rules: &TitleRules) -> Option<String> {
    first_capture(&TITLE_PREFIX, text, |raw| raw.trim().to_string())
}

/// Inner text of the first `<title>` element.
pub fn html_title(text: &str, _rules: &TitleRules) -> Option<String> {
    first_capture(&HTML_TITLE, text, clean_inline_html)
}

/// Inner text of the first `<h1>` element.
pub fn html_h1(text: &str, _rules: &TitleRules) -> Option<String> {
    first_capture(&HTML_H1, text, clean_inline_html)
}

/// A line followed by a line of `=` characters.
pub fn underlined(text: &str, _rules: &TitleRules) -> Option<String> {
    first_capture(&UNDERLINED, text, |raw| raw.trim().to_string())
}

/// The first non-empty line, if it passes [`looks_like_title`].
pub fn first_line(text: &str, rules: &TitleRules) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    looks_like_title(line, rules).then(|| line.to_string())
}

/// Heuristic for accepting a bare first line as a title.
///
/// The line must be between `min_title_len` and `max_title_len` characters, contain
/// at least one letter, and must not open with a comment or markup marker.
pub fn looks_like_title(line: &str, rules: &TitleRules) -> bool {
    let len = line.chars().count();
    if len < rules.min_title_len || len > rules.max_title_len {
        return false;
    }
    if !line.chars().any(char::is_alphabetic) {
        return false;
    }
    !(line.starts_with(['/', '*', '#', '<', '[', '{']) || line.starts_with("--"))
}

/// Derives a title from the file name.
///
/// Drops the extension, splits on `_`, `-`, `.` and whitespace, removes date
/// tokens, trims numeric tokens from both ends and title-cases what remains.
/// Returns an empty string when nothing is left.
pub fn title_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let tokens: Vec<&str> = stem
        .split(|c: char| matches!(c, '_' | '-' | '.') || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect();

    let mut tokens = strip_dates(&tokens);
    while tokens.first().is_some_and(|token| is_numeric(token)) {
        tokens.remove(0);
    }
    while tokens.last().is_some_and(|token| is_numeric(token)) {
        tokens.pop();
    }

    tokens
        .iter()
        .map(|token| title_case(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn literal_stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_prefix(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(limit);
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Decodes a byte prefix as UTF-8.
///
/// A multi-byte sequence cut off by the prefix limit is dropped. Any other
/// invalid sequence, or a NUL byte, marks the content as undecodable.
fn decode_prefix(bytes: &[u8]) -> Option<&str> {
    if bytes.contains(&0) {
        return None;
    }
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&bytes[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };
    Some(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn first_capture(regex: &Regex, text: &str, clean: impl Fn(&str) -> String) -> Option<String> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean(m.as_str()))
        .find(|title| !title.is_empty())
}

fn clean_inline_html(raw: &str) -> String {
    let stripped = HTML_TAG.replace_all(raw, "");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn strip_dates<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let [year, month, day, ..] = &tokens[i..]
            && is_date(year, month, day)
        {
            i += 3;
            continue;
        }
        if is_compact_date(tokens[i]) {
            i += 1;
            continue;
        }
        kept.push(tokens[i]);
        i += 1;
    }
    kept
}

fn is_date(year: &str, month: &str, day: &str) -> bool {
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return false;
    }
    if !(is_numeric(year) && is_numeric(month) && is_numeric(day)) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12)) && matches!(day.parse::<u8>(), Ok(1..=31))
}

// YYYYMMDD
fn is_compact_date(token: &str) -> bool {
    token.len() == 8 && is_numeric(token) && is_date(&token[..4], &token[4..6], &token[6..])
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
