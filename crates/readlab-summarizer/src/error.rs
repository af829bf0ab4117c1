//! Error types for the Summarizer

use readlab_domain::{ErrorRecord, PipelineStage};
use std::fmt;
use thiserror::Error;

/// Errors raised before any document is processed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummarizerError {
    /// Invalid configuration (e.g. overlap >= max_chars)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Category of a per-document summarization failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Generation calls kept timing out
    Timeout,
    /// Rate limits, 5xx or network failures outlasted the retries
    Transient,
    /// The generation service rejected the request for good
    Fatal,
    /// Responses kept failing schema validation
    SchemaValidation,
    /// The model refused or answered with something unusable
    Unrecoverable,
    /// A worker task panicked or was cancelled
    Internal,
}

impl FailureKind {
    /// Machine-readable name written to error records
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Transient => "transient",
            FailureKind::Fatal => "fatal",
            FailureKind::SchemaValidation => "schema_validation",
            FailureKind::Unrecoverable => "unrecoverable",
            FailureKind::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document that could not be summarized
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} failed ({kind}) after {attempts} attempt(s): {message}")]
pub struct SummarizationFailure {
    /// Stage that failed
    pub stage: PipelineStage,

    /// Failure category
    pub kind: FailureKind,

    /// Generation attempts spent on the failing request
    pub attempts: u32,

    /// Last error message
    pub message: String,
}

impl SummarizationFailure {
    /// Build a failure in the summarize stage
    pub fn new(kind: FailureKind, attempts: u32, message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Summarize,
            kind,
            attempts,
            message: message.into(),
        }
    }

    /// Convert into a persistable error record
    pub fn to_record(&self, source_path: &str, recorded_at: u64) -> ErrorRecord {
        ErrorRecord {
            source_path: source_path.to_string(),
            stage: self.stage,
            kind: self.kind.as_str().to_string(),
            message: self.message.clone(),
            attempts: self.attempts,
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = SummarizationFailure::new(FailureKind::SchemaValidation, 3, "missing field 'tl_dr'");
        assert_eq!(
            failure.to_string(),
            "summarize failed (schema_validation) after 3 attempt(s): missing field 'tl_dr'"
        );
    }

    #[test]
    fn test_failure_to_record() {
        let failure = SummarizationFailure::new(FailureKind::Timeout, 3, "generation timed out");
        let record = failure.to_record("p1.pdf", 99);
        assert_eq!(record.kind, "timeout");
        assert_eq!(record.stage, PipelineStage::Summarize);
        assert_eq!(record.attempts, 3);
        assert_eq!(record.recorded_at, 99);
    }
}
