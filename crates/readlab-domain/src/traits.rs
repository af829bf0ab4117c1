//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline logic and
//! infrastructure. Implementations live in other crates.

use crate::{ErrorRecord, ExtractMetadata, GenerationError, GenerationRequest, GenerationResponse, Summary, SummaryLoad};
use std::path::Path;

/// Trait for the text-generation service
///
/// Implemented by the infrastructure layer (readlab-llm). Calls are
/// synchronous; async callers run them on a blocking task.
pub trait Generator {
    /// Error type for generation calls
    type Error: Into<GenerationError> + std::fmt::Display;

    /// Name of the model behind this generator
    fn model_name(&self) -> &str;

    /// Send one request and return the raw outcome
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Self::Error>;
}

/// Trait for persisting pipeline output
///
/// Implemented by the infrastructure layer (readlab-store). Every method
/// takes `&self`: each write targets a file keyed by the document's
/// identity, so concurrent document pipelines never contend for a file.
pub trait SummaryStore {
    /// Error type for store operations
    type Error;

    /// Persist cleaned text and its metadata
    fn put_extract(&self, meta: &ExtractMetadata, text: &str) -> Result<(), Self::Error>;

    /// Read back the cleaned text of a document, if stored
    fn load_extract(&self, source_path: &str) -> Result<Option<String>, Self::Error>;

    /// Persist a validated summary, replacing any previous one
    fn put_summary(&self, summary: &Summary) -> Result<(), Self::Error>;

    /// Persist an error record for a failed document
    fn put_error(&self, record: &ErrorRecord) -> Result<(), Self::Error>;

    /// Remove a stale error record after the document succeeded
    fn clear_error(&self, source_path: &str) -> Result<(), Self::Error>;

    /// Load every persisted summary, reporting unreadable entries separately
    fn load_summaries(&self) -> Result<SummaryLoad, Self::Error>;
}

/// Trait for pulling raw text out of a source document
///
/// Implemented by the pipeline's extraction adapters.
pub trait TextExtractor {
    /// Error type for extraction
    type Error: std::fmt::Display;

    /// Extract the raw text of the document at `path`
    fn extract(&self, path: &Path) -> Result<String, Self::Error>;
}
