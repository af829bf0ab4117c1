//! Structured summaries - the unit of truth of the pipeline

use serde::{Deserialize, Serialize};

/// The durable structured record for one document
///
/// `source_path` identifies the record: re-processing a document
/// overwrites its summary, never duplicates it. `generated_at` is the
/// persisted timestamp used to pick the newest record when duplicates
/// show up in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Document title
    pub title: String,

    /// Authors in publication order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Venue (journal, conference) if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    /// Publication year if known
    #[serde(default)]
    pub year: Option<i32>,

    /// One-paragraph takeaway
    pub tl_dr: String,

    /// Claimed contributions
    #[serde(default)]
    pub contributions: Vec<String>,

    /// Methods used
    #[serde(default)]
    pub methods: Vec<String>,

    /// Key results
    #[serde(default)]
    pub results: Vec<String>,

    /// Stated or observed limitations
    #[serde(default)]
    pub limitations: Vec<String>,

    /// Topic tags; case-insensitively unique, the first one is the primary tag
    #[serde(default)]
    pub tags: Vec<String>,

    /// Literal quotes from the source text
    #[serde(default)]
    pub quotes: Vec<String>,

    /// Cited references
    #[serde(default)]
    pub references: Vec<String>,

    /// Identity of the summarized document
    pub source_path: String,

    /// When the summary completed validation (ms since Unix epoch)
    #[serde(default)]
    pub generated_at: u64,

    /// Model that produced the summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Summary {
    /// Create an empty summary for a document
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            authors: Vec::new(),
            venue: None,
            year: None,
            tl_dr: String::new(),
            contributions: Vec::new(),
            methods: Vec::new(),
            results: Vec::new(),
            limitations: Vec::new(),
            tags: Vec::new(),
            quotes: Vec::new(),
            references: Vec::new(),
            source_path: source_path.into(),
            generated_at: 0,
            model: None,
        }
    }

    /// The primary tag (first non-blank tag), if any
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
    }

    /// Whether every textual field is empty
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.tl_dr.trim().is_empty()
            && self.contributions.is_empty()
            && self.methods.is_empty()
            && self.results.is_empty()
            && self.limitations.is_empty()
            && self.tags.is_empty()
            && self.quotes.is_empty()
    }
}

/// The structured result of summarizing a single chunk
///
/// Partials are ephemeral: they exist only between the map step and the
/// reduce step of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialSummary {
    /// Index of the chunk this partial was produced from
    pub chunk_index: usize,

    /// Title, if the chunk revealed one
    pub title: Option<String>,

    /// Authors, if the chunk revealed them
    pub authors: Vec<String>,

    /// Venue, if the chunk revealed one
    pub venue: Option<String>,

    /// Year, if the chunk revealed one
    pub year: Option<i32>,

    /// Chunk-level takeaway
    pub tl_dr: String,

    /// Contributions found in the chunk
    pub contributions: Vec<String>,

    /// Methods found in the chunk
    pub methods: Vec<String>,

    /// Results found in the chunk
    pub results: Vec<String>,

    /// Limitations found in the chunk
    pub limitations: Vec<String>,

    /// Tags suggested for the chunk
    pub tags: Vec<String>,

    /// Quotes, already verified against the chunk text
    pub quotes: Vec<String>,

    /// References found in the chunk
    pub references: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_tag_skips_blank() {
        let mut summary = Summary::new("p.pdf");
        summary.tags = vec!["  ".to_string(), "NLP".to_string(), "AI".to_string()];
        assert_eq!(summary.primary_tag(), Some("NLP"));
    }

    #[test]
    fn test_new_summary_is_empty() {
        let summary = Summary::new("p.pdf");
        assert!(summary.is_empty());
        assert_eq!(summary.primary_tag(), None);
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "title": "Attention",
            "tl_dr": "Transformers work.",
            "source_path": "papers/attention.pdf"
        }"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.title, "Attention");
        assert_eq!(summary.generated_at, 0);
        assert!(summary.authors.is_empty());
        assert!(summary.model.is_none());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let json = r#"{"title": "Attention", "source_path": "a.pdf"}"#;
        assert!(serde_json::from_str::<Summary>(json).is_err());
    }
}
