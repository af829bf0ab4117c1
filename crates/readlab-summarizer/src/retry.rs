//! Bounded retry state machine for generation requests

use crate::error::{FailureKind, SummarizationFailure};
use readlab_domain::GenerationError;
use std::time::Duration;

/// Exponential backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial: Duration,

    /// Upper bound on any delay
    pub max: Duration,
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based): `initial * 2^(attempt-1)`, capped
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(10),
        }
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// The call exceeded its timeout
    Timeout,

    /// Retryable service failure
    Transient(String),

    /// Non-retryable service failure
    Fatal(String),

    /// The response did not match the declared shape
    Schema(String),

    /// The response can never become a summary
    Unrecoverable(String),
}

impl AttemptError {
    fn kind(&self) -> FailureKind {
        match self {
            AttemptError::Timeout => FailureKind::Timeout,
            AttemptError::Transient(_) => FailureKind::Transient,
            AttemptError::Fatal(_) => FailureKind::Fatal,
            AttemptError::Schema(_) => FailureKind::SchemaValidation,
            AttemptError::Unrecoverable(_) => FailureKind::Unrecoverable,
        }
    }

    fn message(&self) -> String {
        match self {
            AttemptError::Timeout => "generation timed out".to_string(),
            AttemptError::Transient(msg)
            | AttemptError::Fatal(msg)
            | AttemptError::Schema(msg)
            | AttemptError::Unrecoverable(msg) => msg.clone(),
        }
    }
}

impl From<GenerationError> for AttemptError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Timeout => AttemptError::Timeout,
            GenerationError::Transient(msg) => AttemptError::Transient(msg),
            GenerationError::Fatal(msg) => AttemptError::Fatal(msg),
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// Try again after `delay`, with a stricter prompt when `strict`
    Retry {
        /// Wait before the next attempt
        delay: Duration,
        /// Whether the next request must be flagged strict
        strict: bool,
    },

    /// Stop and report the failure
    GiveUp(SummarizationFailure),
}

/// Retry bookkeeping for one generation request
///
/// `attempt` counts attempts made so far. Each failed attempt is fed to
/// [`RetryState::record`], which decides the next step.
///
/// # Examples
///
/// ```
/// use readlab_summarizer::{AttemptError, BackoffPolicy, NextStep, RetryState};
/// use std::time::Duration;
///
/// let mut state = RetryState::new(3, BackoffPolicy::default());
/// state.begin_attempt();
/// assert_eq!(
///     state.record(AttemptError::Schema("missing tl_dr".into())),
///     NextStep::Retry { delay: Duration::ZERO, strict: true }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    last_error: Option<AttemptError>,
    strict: bool,
    backoff: BackoffPolicy,
}

impl RetryState {
    /// Fresh state allowing `max_attempts` attempts (at least one)
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
            strict: false,
            backoff,
        }
    }

    /// Mark the start of an attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Attempts made so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempt bound
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Most recent failure, if any
    pub fn last_error(&self) -> Option<&AttemptError> {
        self.last_error.as_ref()
    }

    /// Whether the next request must be flagged strict
    ///
    /// Sticky: once a schema failure happened, later attempts stay strict.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Record a failed attempt and decide what happens next
    pub fn record(&mut self, error: AttemptError) -> NextStep {
        let step = match &error {
            AttemptError::Fatal(_) | AttemptError::Unrecoverable(_) => NextStep::GiveUp(self.failure(&error)),
            _ if self.attempt >= self.max_attempts => NextStep::GiveUp(self.failure(&error)),
            AttemptError::Schema(_) => {
                self.strict = true;
                NextStep::Retry {
                    delay: Duration::ZERO,
                    strict: true,
                }
            }
            AttemptError::Timeout | AttemptError::Transient(_) => NextStep::Retry {
                delay: self.backoff.delay(self.attempt),
                strict: self.strict,
            },
        };
        self.last_error = Some(error);
        step
    }

    fn failure(&self, error: &AttemptError) -> SummarizationFailure {
        SummarizationFailure::new(error.kind(), self.attempt, error.message())
    }
}
