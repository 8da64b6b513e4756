/// Content-kind classification for deciding whether a file is worth reading for a title.
///
/// Files are classified from two signals: magic bytes sniffed from the start of the
/// file (via `infer`) and the file extension. Only text-like files are handed to the
/// content matchers; everything else goes straight to the filename fallback.
///
/// # Examples
///
/// ```
/// use retitle::file_kind::{ContentKind, KindMapper};
///
/// let mapper = KindMapper::default();
/// assert_eq!(mapper.extension_to_kind("md"), Some(ContentKind::Text));
/// assert_eq!(mapper.extension_to_kind("PNG"), Some(ContentKind::Binary));
/// assert_eq!(mapper.extension_to_kind("xyz"), None);
/// ```
use infer::MatcherType;
use std::collections::HashMap;

/// Broad classification of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Plain text, markup or source code; eligible for content matching.
    Text,
    /// Images, archives, office documents and other binary formats.
    Binary,
    /// Neither signal was conclusive; UTF-8 decoding decides.
    Unknown,
}

impl ContentKind {
    /// Short label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Binary => "binary",
            ContentKind::Unknown => "unknown",
        }
    }
}

/// Maps file extensions and sniffed magic bytes to a [`ContentKind`].
#[derive(Debug, Clone)]
pub struct KindMapper {
    extension_map: HashMap<String, ContentKind>,
}

impl KindMapper {
    /// Creates a new `KindMapper` with the standard extension table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        const TEXT: &[&str] = &[
            // Prose and markup
            "txt", "text", "md", "markdown", "rst", "adoc", "org", "tex", "html", "htm",
            "xhtml", "xml", "nfo", "log",
            // Data
            "csv", "tsv", "json", "yaml", "yml", "toml", "ini", "cfg", "conf",
            // Source code
            "py", "rs", "c", "h", "cpp", "hpp", "java", "js", "ts", "go", "rb", "sh",
            "bash", "sql", "css",
        ];
        const BINARY: &[&str] = &[
            // Images
            "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "ico", "heic",
            // Audio and video
            "mp3", "wav", "ogg", "flac", "aac", "m4a", "mp4", "mkv", "avi", "mov", "webm",
            // Documents with binary containers
            "pdf", "doc", "docx", "odt", "rtf", "xls", "xlsx", "ods", "ppt", "pptx", "odp",
            "epub",
            // Archives
            "zip", "rar", "7z", "tar", "gz", "bz2", "xz",
            // Fonts and executables
            "ttf", "otf", "woff", "woff2", "exe", "dll", "so", "bin",
        ];

        for ext in TEXT {
            self.add_extension_mapping(ext, ContentKind::Text);
        }
        for ext in BINARY {
            self.add_extension_mapping(ext, ContentKind::Binary);
        }
    }

    /// Adds a file extension to kind mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, kind: ContentKind) {
        self.extension_map.insert(ext.to_lowercase(), kind);
    }

    /// Maps a file extension (without the dot, any case) to a kind.
    pub fn extension_to_kind(&self, ext: &str) -> Option<ContentKind> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Sniffs magic bytes. Returns `None` when `infer` recognises nothing.
    pub fn sniff(&self, prefix: &[u8]) -> Option<ContentKind> {
        infer::get(prefix).map(|kind| match kind.matcher_type() {
            MatcherType::Text => ContentKind::Text,
            _ => ContentKind::Binary,
        })
    }

    /// Determines the kind of a file from its extension and leading bytes.
    ///
    /// Magic bytes win over the extension, so a PNG saved as `notes.txt` is still
    /// binary. A recognised binary extension is trusted even when sniffing finds
    /// nothing (many binary formats have no magic number `infer` knows about).
    ///
    /// # Examples
    ///
    /// ```
    /// use retitle::file_kind::{ContentKind, KindMapper};
    ///
    /// let mapper = KindMapper::default();
    /// assert_eq!(mapper.classify(Some("txt"), b"hello"), ContentKind::Text);
    /// assert_eq!(mapper.classify(Some("txt"), b"%PDF-1.4\n"), ContentKind::Binary);
    /// assert_eq!(mapper.classify(None, b"hello"), ContentKind::Unknown);
    /// ```
    pub fn classify(&self, ext: Option<&str>, prefix: &[u8]) -> ContentKind {
        if let Some(ContentKind::Binary) = self.sniff(prefix) {
            return ContentKind::Binary;
        }

        if let Some(extension) = ext
            && let Some(kind) = self.extension_to_kind(extension)
        {
            return kind;
        }

        self.sniff(prefix).unwrap_or(ContentKind::Unknown)
    }
}

impl Default for KindMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    #[test]
    fn test_extension_to_kind_case_insensitive() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.extension_to_kind("MD"), Some(ContentKind::Text));
        assert_eq!(mapper.extension_to_kind("Pdf"), Some(ContentKind::Binary));
    }

    #[test]
    fn test_magic_bytes_override_text_extension() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.classify(Some("txt"), PNG_HEADER), ContentKind::Binary);
    }

    #[test]
    fn test_binary_extension_without_magic() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.classify(Some("docx"), b"plain"), ContentKind::Binary);
    }

    #[test]
    fn test_sniffed_html_is_text() {
        let mapper = KindMapper::default();
        let html = b"<!DOCTYPE html><html><head><title>x</title></head></html>";
        assert_eq!(mapper.classify(None, html), ContentKind::Text);
    }

    #[test]
    fn test_unknown_extension_and_no_magic() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.classify(Some("weird"), b"abc"), ContentKind::Unknown);
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapper = KindMapper::default();
        mapper.add_extension_mapping("note", ContentKind::Text);
        assert_eq!(mapper.extension_to_kind("note"), Some(ContentKind::Text));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ContentKind::Text.label(), "text");
        assert_eq!(ContentKind::Binary.label(), "binary");
        assert_eq!(ContentKind::Unknown.label(), "unknown");
    }
}
