//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generation provider error
    #[error("Provider error: {0}")]
    Llm(#[from] readlab_llm::LlmError),

    /// Summarizer setup error
    #[error("Summarizer error: {0}")]
    Summarizer(#[from] readlab_summarizer::SummarizerError),

    /// Pipeline error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] readlab_pipeline::PipelineError),

    /// Digest could not be produced
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] readlab_aggregator::AggregatorError),

    /// Summary store error
    #[error("Store error: {0}")]
    Store(#[from] readlab_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
