//! OpenAI-compatible chat completions provider
//!
//! Requests JSON-object output via `response_format`. Servers that reject
//! that field get one more try without it; the prompt still asks for JSON
//! and the validator extracts it from free text.

use crate::{block_on, into_response, status_error, LlmError};
use readlab_domain::traits::Generator;
use readlab_domain::{GenerationRequest, GenerationResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat completions provider
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider for the given endpoint and model
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(endpoint, model, api_key, Duration::from_secs(120))
    }

    /// Create a provider with a custom HTTP timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature: 0.2,
            max_tokens: 1200,
            client,
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest, json_mode: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: if request.strict { 0.0 } else { self.temperature },
            max_tokens: self.max_tokens,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<Result<ChatResponse, (reqwest::StatusCode, String)>, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let mut builder = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Ok(Err((status, text)));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(Ok(parsed))
    }

    /// Send one request to the chat completions API
    pub async fn generate_async(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        if self.api_key.is_none() && self.endpoint == DEFAULT_ENDPOINT {
            return Err(LlmError::Authentication("OPENAI_API_KEY is not set".to_string()));
        }

        debug!(model = %self.model, schema = %request.schema_name, strict = request.strict, "Sending chat completion");

        let parsed = match self.send(&self.build_body(request, true)).await? {
            Ok(parsed) => parsed,
            Err((status, text)) if status == reqwest::StatusCode::BAD_REQUEST && text.contains("response_format") => {
                warn!(model = %self.model, "Server rejected response_format, retrying without it");
                self.send(&self.build_body(request, false))
                    .await?
                    .map_err(|(status, text)| status_error(status, text, &self.model))?
            }
            Err((status, text)) => return Err(status_error(status, text, &self.model)),
        };

        interpret(parsed)
    }
}

fn interpret(parsed: ChatResponse) -> Result<GenerationResponse, LlmError> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Ok(GenerationResponse::Refused(refusal));
    }
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Ok(GenerationResponse::Refused("content filtered".to_string()));
    }

    let content = choice.message.content.unwrap_or_default();
    Ok(into_response(content))
}

impl Generator for OpenAiProvider {
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

    fn response(json: serde_json::Value) -> ChatResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_body_json_mode() {
        let provider = OpenAiProvider::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, Some("k".into()));
        let request = GenerationRequest::new("sys", "user", "tl_dr", json!({}));

        let body = serde_json::to_value(provider.build_body(&request, true)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");

        let plain = serde_json::to_value(provider.build_body(&request, false)).unwrap();
        assert!(plain.get("response_format").is_none());
    }

    #[test]
    fn test_strict_requests_use_zero_temperature() {
        let provider = OpenAiProvider::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, None).with_temperature(0.7);
        let request = GenerationRequest::new("s", "p", "x", json!({})).strict();
        let body = serde_json::to_value(provider.build_body(&request, true)).unwrap();
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn test_interpret_structured_content() {
        let parsed = response(json!({
            "choices": [{"message": {"content": "{\"tl_dr\": \"x\"}"}, "finish_reason": "stop"}]
        }));
        assert!(matches!(interpret(parsed).unwrap(), GenerationResponse::Structured(_)));
    }

    #[test]
    fn test_interpret_refusal() {
        let parsed = response(json!({
            "choices": [{"message": {"content": null, "refusal": "I can't help with that"}}]
        }));
        assert_eq!(
            interpret(parsed).unwrap(),
            GenerationResponse::Refused("I can't help with that".into())
        );
    }

    #[test]
    fn test_interpret_no_choices() {
        let parsed = response(json!({"choices": []}));
        assert!(matches!(interpret(parsed), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_missing_key_against_openai_is_fatal() {
        let provider = OpenAiProvider::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, None);
        let request = GenerationRequest::new("s", "p", "x", json!({}));
        assert!(matches!(provider.generate(&request), Err(LlmError::Authentication(_))));
    }
}
