//! Provider selection from configuration

use crate::{ollama, openai, LlmError, MockProvider, OllamaProvider, OpenAiProvider};
use readlab_domain::traits::Generator;
use readlab_domain::{GenerationRequest, GenerationResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default model for the Ollama provider
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Which generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    #[serde(rename = "openai")]
    OpenAi,
    /// Canned responses, no network
    Mock,
}

impl ProviderKind {
    /// Name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(LlmError::Config(format!("unknown provider '{}'", other))),
        }
    }
}

/// Settings for the generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend to use
    pub provider: ProviderKind,

    /// Base URL; each provider has its own default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model name; each provider has its own default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key (OpenAI); usually taken from `OPENAI_API_KEY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature for non-strict requests
    pub temperature: f32,

    /// Completion token limit (OpenAI)
    pub max_tokens: u32,

    /// HTTP timeout per request (seconds)
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            endpoint: None,
            model: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 1200,
            timeout_secs: ollama::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Apply `OPENAI_MODEL`, `OPENAI_API_KEY`, `TEMPERATURE` and `MAX_TOKENS`
    /// from the process environment
    pub fn apply_env(&mut self) -> Result<(), LlmError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider == ProviderKind::OpenAi {
            if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
                self.model = Some(model);
            }
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup("TEMPERATURE") {
            self.temperature = raw
                .trim()
                .parse()
                .map_err(|_| LlmError::Config(format!("TEMPERATURE is not a number: '{}'", raw)))?;
        }
        if let Some(raw) = lookup("MAX_TOKENS") {
            self.max_tokens = raw
                .trim()
                .parse()
                .map_err(|_| LlmError::Config(format!("MAX_TOKENS is not an integer: '{}'", raw)))?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LlmError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::Config(format!(
                "temperature must be within [0, 2] (got {})",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(LlmError::Config("max_tokens must be greater than 0".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(LlmError::Config("timeout_secs must be greater than 0".to_string()));
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(LlmError::Config("model must not be empty".to_string()));
        }
        Ok(())
    }

    /// Model that `build` will use
    pub fn effective_model(&self) -> String {
        match (&self.model, self.provider) {
            (Some(model), _) => model.clone(),
            (None, ProviderKind::Ollama) => DEFAULT_OLLAMA_MODEL.to_string(),
            (None, ProviderKind::OpenAi) => openai::DEFAULT_MODEL.to_string(),
            (None, ProviderKind::Mock) => "mock".to_string(),
        }
    }

    /// Build the configured provider
    pub fn build(&self) -> Result<ConfiguredProvider, LlmError> {
        self.validate()?;
        let timeout = Duration::from_secs(self.timeout_secs);
        let model = self.effective_model();

        let provider = match self.provider {
            ProviderKind::Ollama => {
                let endpoint = self.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT);
                ConfiguredProvider::Ollama(
                    OllamaProvider::with_timeout(endpoint, model, timeout).with_temperature(self.temperature),
                )
            }
            ProviderKind::OpenAi => {
                let endpoint = self.endpoint.as_deref().unwrap_or(openai::DEFAULT_ENDPOINT);
                if self.api_key.is_none() && endpoint.trim_end_matches('/') == openai::DEFAULT_ENDPOINT {
                    return Err(LlmError::Config("OPENAI_API_KEY is required for the OpenAI API".to_string()));
                }
                ConfiguredProvider::OpenAi(
                    OpenAiProvider::with_timeout(endpoint, model, self.api_key.clone(), timeout)
                        .with_temperature(self.temperature)
                        .with_max_tokens(self.max_tokens),
                )
            }
            ProviderKind::Mock => ConfiguredProvider::Mock(offline_mock()),
        };
        Ok(provider)
    }
}

/// Mock that answers every request with one object valid for both the
/// partial-summary and the tl_dr schema
fn offline_mock() -> MockProvider {
    MockProvider::structured(serde_json::json!({
        "title": "",
        "authors": [],
        "year": null,
        "venue": null,
        "tl_dr": "Offline placeholder summary.",
        "contributions": ["Placeholder contribution"],
        "methods": ["Placeholder method"],
        "results": ["Placeholder result"],
        "limitations": ["Generated without a language model"],
        "tags": ["Offline"],
        "quotes": [],
        "references": []
    }))
}

/// A provider chosen at runtime
#[derive(Debug, Clone)]
pub enum ConfiguredProvider {
    /// Ollama backend
    Ollama(OllamaProvider),
    /// OpenAI-compatible backend
    OpenAi(OpenAiProvider),
    /// Offline mock
    Mock(MockProvider),
}

impl Generator for ConfiguredProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        match self {
            ConfiguredProvider::Ollama(p) => p.model_name(),
            ConfiguredProvider::OpenAi(p) => p.model_name(),
            ConfiguredProvider::Mock(p) => p.model_name(),
        }
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Self::Error> {
        match self {
            ConfiguredProvider::Ollama(p) => p.generate(request),
            ConfiguredProvider::OpenAi(p) => p.generate(request),
            ConfiguredProvider::Mock(p) => p.generate(request),
        }
    }
}
