//! readlab Domain Layer
//!
//! This crate contains the data model of the reading pipeline and the trait
//! interfaces that the infrastructure crates implement. Apart from serde it
//! has no external dependencies and no I/O.
//!
//! ## Key Concepts
//!
//! - **Document**: a source file identified by its path
//! - **Chunk**: an overlapping, size-bounded character span of a document
//! - **PartialSummary**: what the generator said about one chunk
//! - **Summary**: the durable structured record per document
//! - **ErrorRecord**: why a document produced no summary
//!
//! ## Architecture
//!
//! ```text
//! TextExtractor → Chunker → Generator (map/reduce) → SummaryStore → Aggregator
//! ```
//!
//! Everything that talks to the outside world (files, HTTP, models) is
//! behind a trait in [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod generation;
pub mod records;
pub mod summary;
pub mod traits;

// Re-exports for convenience
pub use document::{Chunk, Document, DocumentKind};
pub use generation::{GenerationError, GenerationRequest, GenerationResponse};
pub use records::{ErrorRecord, ExtractMetadata, MalformedEntry, PipelineStage, SummaryLoad};
pub use summary::{PartialSummary, Summary};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Returns 0 if the system clock is set before the epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
