//! Configuration for the Summarizer

use crate::error::SummarizerError;
use crate::retry::BackoffPolicy;
use readlab_validator::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for chunking, generation and retries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Maximum chunk size (characters)
    pub max_chars: usize,

    /// Characters shared by consecutive chunks
    pub overlap: usize,

    /// Attempts per generation request, first try included
    pub max_attempts: u32,

    /// Maximum time for a single generation call (seconds)
    pub generation_timeout_secs: u64,

    /// Backoff before the first retry of a transient failure (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound on any single backoff (milliseconds)
    pub max_backoff_ms: u64,

    /// Final tl_dr length bound (characters)
    pub tl_dr_max_chars: usize,

    /// Generation requests allowed in flight at once, across all documents
    pub generation_concurrency: usize,

    /// Bounds applied by the validator
    pub validation: ValidationConfig,
}

impl Default for SummarizerConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_chars: 6000,
            overlap: 400,
            max_attempts: 3,
            generation_timeout_secs: 120,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10_000,
            tl_dr_max_chars: 600,
            generation_concurrency: 4,
            validation: ValidationConfig::default(),
        }
    }
}

impl SummarizerConfig {
    /// Aggressive preset: smaller chunks, shorter timeouts, fewer attempts
    pub fn aggressive() -> Self {
        Self {
            max_chars: 3000,
            overlap: 200,
            max_attempts: 2,
            generation_timeout_secs: 60,
            initial_backoff_ms: 500,
            max_backoff_ms: 4000,
            tl_dr_max_chars: 400,
            generation_concurrency: 8,
            validation: ValidationConfig::strict(),
        }
    }

    /// Lenient preset: larger chunks, longer timeouts, more attempts
    pub fn lenient() -> Self {
        Self {
            max_chars: 12_000,
            overlap: 800,
            max_attempts: 5,
            generation_timeout_secs: 300,
            initial_backoff_ms: 2000,
            max_backoff_ms: 30_000,
            tl_dr_max_chars: 1000,
            generation_concurrency: 2,
            validation: ValidationConfig::permissive(),
        }
    }

    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Backoff policy derived from the retry settings
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(self.initial_backoff_ms),
            max: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SummarizerError> {
        if self.max_chars == 0 {
            return Err(SummarizerError::Config("max_chars must be greater than 0".to_string()));
        }
        if self.overlap == 0 || self.overlap >= self.max_chars {
            return Err(SummarizerError::Config(format!(
                "overlap must satisfy 0 < overlap < max_chars (got overlap={}, max_chars={})",
                self.overlap, self.max_chars
            )));
        }
        if self.max_attempts == 0 {
            return Err(SummarizerError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.generation_timeout_secs == 0 {
            return Err(SummarizerError::Config(
                "generation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(SummarizerError::Config(
                "initial_backoff_ms cannot exceed max_backoff_ms".to_string(),
            ));
        }
        if self.tl_dr_max_chars == 0 {
            return Err(SummarizerError::Config("tl_dr_max_chars must be greater than 0".to_string()));
        }
        if self.generation_concurrency == 0 {
            return Err(SummarizerError::Config(
                "generation_concurrency must be at least 1".to_string(),
            ));
        }
        self.validation
            .validate()
            .map_err(|e| SummarizerError::Config(e.to_string()))
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, SummarizerError> {
        toml::from_str(toml_str).map_err(|e| SummarizerError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, SummarizerError> {
        toml::to_string_pretty(self)
            .map_err(|e| SummarizerError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
