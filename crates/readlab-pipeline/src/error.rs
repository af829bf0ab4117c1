//! Error types for the pipeline

use readlab_aggregator::AggregatorError;
use readlab_summarizer::SummarizerError;
use thiserror::Error;

/// Errors that abort a whole run
///
/// Anything that goes wrong with a single document is recorded as that
/// document's outcome instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The storage root could not be opened
    #[error("Storage error: {0}")]
    Store(String),

    /// The digest could not be produced
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregatorError),
}

impl From<SummarizerError> for PipelineError {
    fn from(err: SummarizerError) -> Self {
        match err {
            SummarizerError::Config(msg) => PipelineError::Config(msg),
        }
    }
}

/// Raw text could not be read from a source document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The file could not be read
    #[error("Failed to read {path}: {message}")]
    Read {
        /// File that failed
        path: String,
        /// Underlying I/O error
        message: String,
    },

    /// The PDF parser rejected the file
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

impl ExtractionError {
    /// Machine-readable kind written to error records
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Read { .. } => "io",
            ExtractionError::Pdf(_) => "pdf",
        }
    }
}
