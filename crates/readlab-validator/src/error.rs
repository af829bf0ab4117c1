//! Validator error types

use thiserror::Error;

/// Errors raised while setting up validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidatorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
