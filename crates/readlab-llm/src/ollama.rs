//! Ollama Provider Implementation
//!
//! Talks to a local Ollama instance through `POST /api/generate`. The
//! request's JSON Schema is passed as Ollama's `format` so the model is
//! constrained to the declared shape.
//!
//! # Examples
//!
//! ```no_run
//! use readlab_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1");
//! ```

use crate::{block_on, into_response, status_error, LlmError};
use readlab_domain::traits::Generator;
use readlab_domain::{GenerationRequest, GenerationResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default HTTP timeout for a single request
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local LLM inference
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'a serde_json::Value,
    stream: bool,
    options: OllamaOptions,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom HTTP timeout
    pub fn with_timeout(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.2,
            client,
        }
    }

    /// Create a provider against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Send one request to Ollama
    pub async fn generate_async(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = OllamaGenerateRequest {
            model: &self.model,
            system: &request.system,
            prompt: &request.prompt,
            format: &request.schema,
            stream: false,
            options: OllamaOptions {
                temperature: if request.strict { 0.0 } else { self.temperature },
            },
        };

        debug!(model = %self.model, schema = %request.schema_name, strict = request.strict, "Sending Ollama request");

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, text, &self.model));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(into_response(parsed.response))
    }
}

impl Generator for OllamaProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Self::Error> {
        block_on(self.generate_async(request))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model_name(), "llama3.1");
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model, "mistral");
    }

    #[test]
    fn test_request_body_carries_schema() {
        let schema = json!({"type": "object", "required": ["tl_dr"]});
        let body = OllamaGenerateRequest {
            model: "m",
            system: "s",
            prompt: "p",
            format: &schema,
            stream: false,
            options: OllamaOptions { temperature: 0.2 },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["format"]["required"][0], "tl_dr");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let provider = OllamaProvider::with_timeout("http://127.0.0.1:9", "m", Duration::from_millis(500));
        let request = GenerationRequest::new("s", "p", "x", json!({}));
        assert!(provider.generate(&request).is_err());
    }
}
