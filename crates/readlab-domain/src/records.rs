//! Side records persisted next to summaries

use crate::{DocumentKind, Summary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a document was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Reading raw text out of the source file
    Extract,
    /// Splitting the text into chunks
    Chunk,
    /// Map/reduce summarization and validation
    Summarize,
    /// Writing results to the store
    Persist,
}

impl PipelineStage {
    /// Stage name as written in error records
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Extract => "extract",
            PipelineStage::Chunk => "chunk",
            PipelineStage::Summarize => "summarize",
            PipelineStage::Persist => "persist",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Written when a document fails irrecoverably in any stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Identity of the failed document
    pub source_path: String,

    /// Stage that failed
    pub stage: PipelineStage,

    /// Machine-readable error kind (e.g. "schema_validation", "timeout")
    pub kind: String,

    /// Human-readable message
    pub message: String,

    /// Generation attempts spent before giving up (0 outside generation)
    #[serde(default)]
    pub attempts: u32,

    /// When the failure was recorded (ms since Unix epoch)
    pub recorded_at: u64,
}

/// Metadata written next to each extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractMetadata {
    /// Identity of the document
    pub source_path: String,

    /// Detected document type
    pub kind: DocumentKind,

    /// Length of the cleaned text in characters
    pub char_len: usize,

    /// Number of chunks the text was split into
    pub chunk_count: usize,

    /// When extraction happened (ms since Unix epoch)
    pub extracted_at: u64,
}

/// A persisted summary file that could not be read back
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedEntry {
    /// File that failed to load
    pub path: PathBuf,

    /// Why it failed
    pub reason: String,
}

/// Everything a store found when loading its summaries
#[derive(Debug, Clone, Default)]
pub struct SummaryLoad {
    /// Summaries that parsed
    pub summaries: Vec<Summary>,

    /// Entries that were skipped
    pub malformed: Vec<MalformedEntry>,
}
