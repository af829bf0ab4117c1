//! Documents and the chunks cut from them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Detected type of a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// PDF file
    Pdf,
    /// Markdown file
    #[serde(rename = "md")]
    Markdown,
    /// Plain text (also the fallback for unknown extensions)
    #[serde(rename = "txt")]
    Text,
}

impl DocumentKind {
    /// Detect the kind from a path's extension (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use readlab_domain::DocumentKind;
    ///
    /// assert_eq!(DocumentKind::from_path("papers/attention.PDF"), DocumentKind::Pdf);
    /// assert_eq!(DocumentKind::from_path("notes.markdown"), DocumentKind::Markdown);
    /// assert_eq!(DocumentKind::from_path("README"), DocumentKind::Text);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("md") | Some("markdown") => DocumentKind::Markdown,
            _ => DocumentKind::Text,
        }
    }

    /// Short name used in metadata records
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Markdown => "md",
            DocumentKind::Text => "txt",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source document after extraction
///
/// The source path is the document's identity. Documents are never
/// mutated after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source path (stable, unique key)
    pub source_path: String,

    /// Detected document type
    pub kind: DocumentKind,

    /// Length of the extracted text in characters
    pub char_len: usize,
}

impl Document {
    /// Describe an extracted document
    pub fn new(source_path: impl Into<String>, text: &str) -> Self {
        let source_path = source_path.into();
        let kind = DocumentKind::from_path(&source_path);
        Self {
            source_path,
            kind,
            char_len: text.chars().count(),
        }
    }
}

/// A contiguous, overlapping slice of a document's text
///
/// `start` and `end` are character offsets (not bytes) into the original
/// text, half-open: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within its document, starting at 0
    pub index: usize,

    /// First character offset covered by the chunk
    pub start: usize,

    /// One past the last character offset covered by the chunk
    pub end: usize,

    /// The characters of `[start, end)`
    pub text: String,
}

impl Chunk {
    /// Number of characters in the chunk
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the chunk covers no characters
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(DocumentKind::from_path("a/b/paper.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path("notes.md"), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_path("notes.txt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_path("data.csv"), DocumentKind::Text);
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(serde_json::to_string(&DocumentKind::Markdown).unwrap(), "\"md\"");
        assert_eq!(serde_json::to_string(&DocumentKind::Pdf).unwrap(), "\"pdf\"");
        let kind: DocumentKind = serde_json::from_str("\"txt\"").unwrap();
        assert_eq!(kind, DocumentKind::Text);
    }

    #[test]
    fn test_document_counts_characters() {
        let doc = Document::new("über.txt", "größe");
        assert_eq!(doc.char_len, 5);
        assert_eq!(doc.kind, DocumentKind::Text);
    }

    #[test]
    fn test_chunk_len() {
        let chunk = Chunk { index: 0, start: 10, end: 25, text: "x".repeat(15) };
        assert_eq!(chunk.len(), 15);
        assert!(!chunk.is_empty());
    }
}
