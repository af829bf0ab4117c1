//! Aggregator error types

use thiserror::Error;

/// Errors that abort an aggregation run
///
/// Malformed stored summaries are not errors: they are skipped and
/// counted in the report.
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// The store could not be listed
    #[error("Store error: {0}")]
    Store(String),

    /// The digest could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
