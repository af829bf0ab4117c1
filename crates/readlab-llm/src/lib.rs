//! readlab LLM Provider Layer
//!
//! Pluggable implementations of the `Generator` trait from `readlab-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//!
//! `LlmConfig` selects and builds one of them from configuration.
//!
//! Providers make exactly one attempt per call. Retries, backoff and
//! timeouts belong to the caller (see `readlab-summarizer`).
//!
//! # Examples
//!
//! ```
//! use readlab_llm::MockProvider;
//! use readlab_domain::traits::Generator;
//! use readlab_domain::{GenerationRequest, GenerationResponse};
//!
//! let provider = MockProvider::new(r#"{"tl_dr": "ok"}"#);
//! let request = GenerationRequest::new("sys", "prompt", "tl_dr", serde_json::json!({}));
//! let response = provider.generate(&request).unwrap();
//! assert_eq!(response, GenerationResponse::Raw(r#"{"tl_dr": "ok"}"#.to_string()));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod openai;

use readlab_domain::traits::Generator;
use readlab_domain::{GenerationError, GenerationRequest, GenerationResponse};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use config::{ConfiguredProvider, LlmConfig, ProviderKind};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response envelope from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The request timed out
    #[error("Request timed out")]
    Timeout,

    /// Credentials missing or rejected
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider settings are unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout => GenerationError::Timeout,
            LlmError::Communication(_) | LlmError::RateLimitExceeded | LlmError::InvalidResponse(_) => {
                GenerationError::Transient(e.to_string())
            }
            LlmError::Authentication(_)
            | LlmError::ModelNotAvailable(_)
            | LlmError::Config(_)
            | LlmError::Other(_) => {
                GenerationError::Fatal(e.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

/// Map a non-success HTTP status to an error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Authentication(format!("HTTP {}: {}", status, body)),
        404 => LlmError::ModelNotAvailable(model.to_string()),
        408 => LlmError::Timeout,
        429 => LlmError::RateLimitExceeded,
        500..=599 => LlmError::Communication(format!("HTTP {}: {}", status, body)),
        _ => LlmError::Other(format!("HTTP {}: {}", status, body)),
    }
}

/// Turn model text into a response, keeping it structured when it parses
pub(crate) fn into_response(text: String) -> GenerationResponse {
    match serde_json::from_str::<serde_json::Value>(text.trim()) {
        Ok(value) if value.is_object() => GenerationResponse::Structured(value),
        _ => GenerationResponse::Raw(text),
    }
}

/// Drive an async HTTP call from the synchronous `Generator` interface
///
/// Must be called from a blocking thread (e.g. inside
/// `tokio::task::spawn_blocking`) when a runtime is running.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, LlmError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map(|rt| rt.block_on(future))
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e))),
    }
}

/// One scripted outcome of the mock
#[derive(Debug, Clone)]
enum Scripted {
    Respond(GenerationResponse),
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<Scripted>,
    rules: Vec<(String, Scripted)>,
    requests: Vec<GenerationRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// Outcomes are resolved in this order:
/// 1. the next entry of the scripted queue (`push_*`), consumed once;
/// 2. the first rule whose needle occurs in the prompt (`respond_when`);
/// 3. the default response.
///
/// Every request is recorded so tests can inspect prompts and the strict
/// flag afterwards.
///
/// # Examples
///
/// ```
/// use readlab_llm::MockProvider;
/// use readlab_domain::traits::Generator;
/// use readlab_domain::{GenerationRequest, GenerationResponse};
///
/// let provider = MockProvider::new("default");
/// provider.push_raw("first");
/// provider.respond_when("CHUNK 2/", "second chunk");
///
/// let req = |p: &str| GenerationRequest::new("s", p, "x", serde_json::json!({}));
/// assert_eq!(provider.generate(&req("a")).unwrap(), GenerationResponse::Raw("first".into()));
/// assert_eq!(provider.generate(&req("CHUNK 2/3")).unwrap(), GenerationResponse::Raw("second chunk".into()));
/// assert_eq!(provider.generate(&req("b")).unwrap(), GenerationResponse::Raw("default".into()));
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: GenerationResponse,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a mock that answers every prompt with the given raw text
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            default_response: GenerationResponse::Raw(response.into()),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock whose default answer is a structured payload
    pub fn structured(value: serde_json::Value) -> Self {
        Self {
            default_response: GenerationResponse::Structured(value),
            ..Self::new("")
        }
    }

    /// Override the reported model name
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a raw text response for the next call
    pub fn push_raw(&self, text: impl Into<String>) {
        self.push_response(GenerationResponse::Raw(text.into()));
    }

    /// Queue any response for the next call
    pub fn push_response(&self, response: GenerationResponse) {
        self.state().queue.push_back(Scripted::Respond(response));
    }

    /// Queue an error for the next call
    pub fn push_error(&self, error: LlmError) {
        self.state().queue.push_back(Scripted::Fail(error));
    }

    /// Answer every prompt containing `needle` with the given raw text
    pub fn respond_when(&self, needle: impl Into<String>, text: impl Into<String>) {
        self.state()
            .rules
            .push((needle.into(), Scripted::Respond(GenerationResponse::Raw(text.into()))));
    }

    /// Fail every prompt containing `needle` with the given error
    pub fn fail_when(&self, needle: impl Into<String>, error: LlmError) {
        self.state().rules.push((needle.into(), Scripted::Fail(error)));
    }

    /// Number of times `generate` was called
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.state().requests.clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        self.state().requests.clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl Generator for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Self::Error> {
        let mut state = self.state();
        state.requests.push(request.clone());

        let scripted = match state.queue.pop_front() {
            Some(next) => next,
            None => state
                .rules
                .iter()
                .find(|(needle, _)| request.prompt.contains(needle.as_str()))
                .map(|(_, outcome)| outcome.clone())
                .unwrap_or_else(|| Scripted::Respond(self.default_response.clone())),
        };

        match scripted {
            Scripted::Respond(response) => Ok(response),
            Scripted::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new("system", prompt, "test", json!({"type": "object"}))
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate(&request("any prompt")).unwrap();
        assert_eq!(result, GenerationResponse::Raw("Test response".to_string()));
    }

    #[test]
    fn test_mock_provider_queue_is_consumed_in_order() {
        let provider = MockProvider::new("fallback");
        provider.push_raw("one");
        provider.push_error(LlmError::RateLimitExceeded);
        provider.push_raw("two");

        assert_eq!(provider.generate(&request("p")).unwrap(), GenerationResponse::Raw("one".into()));
        assert_eq!(provider.generate(&request("p")).unwrap_err(), LlmError::RateLimitExceeded);
        assert_eq!(provider.generate(&request("p")).unwrap(), GenerationResponse::Raw("two".into()));
        assert_eq!(provider.generate(&request("p")).unwrap(), GenerationResponse::Raw("fallback".into()));
    }

    #[test]
    fn test_mock_provider_rules_match_substring() {
        let provider = MockProvider::default();
        provider.respond_when("hello", "world");
        provider.fail_when("bad", LlmError::Other("boom".into()));

        assert_eq!(provider.generate(&request("say hello")).unwrap(), GenerationResponse::Raw("world".into()));
        assert!(provider.generate(&request("a bad prompt")).is_err());
        assert_eq!(
            provider.generate(&request("unknown")).unwrap(),
            GenerationResponse::Raw("Default mock response".into())
        );
    }

    #[test]
    fn test_mock_provider_records_requests() {
        let provider = MockProvider::new("x");
        provider.generate(&request("first")).unwrap();
        provider.generate(&request("second").strict()).unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].strict);
        assert!(requests[1].strict);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate(&request("test")).unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_structured_default() {
        let provider = MockProvider::structured(json!({"tl_dr": "done"}));
        match provider.generate(&request("p")).unwrap() {
            GenerationResponse::Structured(v) => assert_eq!(v["tl_dr"], "done"),
            other => panic!("Expected structured response, got {:?}", other),
        }
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(GenerationError::from(LlmError::Timeout), GenerationError::Timeout);
        assert!(matches!(
            GenerationError::from(LlmError::RateLimitExceeded),
            GenerationError::Transient(_)
        ));
        assert!(matches!(
            GenerationError::from(LlmError::Authentication("no key".into())),
            GenerationError::Fatal(_)
        ));
    }

    #[test]
    fn test_into_response() {
        assert!(matches!(into_response(r#" {"a": 1} "#.into()), GenerationResponse::Structured(_)));
        assert!(matches!(into_response("```json\n{}\n```".into()), GenerationResponse::Raw(_)));
        assert!(matches!(into_response("[1, 2]".into()), GenerationResponse::Raw(_)));
    }

    #[test]
    fn test_status_mapping() {
        use reqwest::StatusCode;
        assert_eq!(status_error(StatusCode::TOO_MANY_REQUESTS, String::new(), "m"), LlmError::RateLimitExceeded);
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, String::new(), "llama3"),
            LlmError::ModelNotAvailable("llama3".into())
        );
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "oops".into(), "m"),
            LlmError::Communication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LlmError::Authentication(_)
        ));
    }
}
