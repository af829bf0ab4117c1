//! The boundary with the external text-generation service

use serde_json::Value;
use std::fmt;

/// A single request to the generation service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instructions
    pub system: String,

    /// User prompt
    pub prompt: String,

    /// Name of the declared output shape (e.g. "partial_summary")
    pub schema_name: String,

    /// Declared output shape as JSON Schema
    pub schema: Value,

    /// Set on retries after the previous response failed validation
    pub strict: bool,
}

impl GenerationRequest {
    /// Create a request for the given schema
    pub fn new(
        system: impl Into<String>,
        prompt: impl Into<String>,
        schema_name: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            schema_name: schema_name.into(),
            schema,
            strict: false,
        }
    }

    /// The same request, flagged for strict conformance
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// What came back from the generation service
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    /// A payload the service already parsed as JSON
    Structured(Value),

    /// Free text that may or may not contain JSON
    Raw(String),

    /// The model declined to answer
    Refused(String),
}

/// Failure of a single generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The call did not finish in time
    Timeout,

    /// A failure that may succeed on retry (rate limit, 5xx, network)
    Transient(String),

    /// A failure that will not go away on retry (auth, bad request)
    Fatal(String),
}

impl GenerationError {
    /// Whether retrying the same request can help
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Timeout | GenerationError::Transient(_))
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Timeout => write!(f, "generation timed out"),
            GenerationError::Transient(msg) => write!(f, "transient generation error: {}", msg),
            GenerationError::Fatal(msg) => write!(f, "generation failed: {}", msg),
        }
    }
}

impl std::error::Error for GenerationError {}
