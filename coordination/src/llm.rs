//! Generative-AI gateway client
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. Two call shapes
//! are supported: plain completion (analysis summaries) and forced
//! function-call mode (structured test plans).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Errors from AI gateway calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("AI request failed: {0}")]
    RequestFailed(String),

    #[error("AI gateway error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Model returned no tool call")]
    MissingToolCall,

    #[error("AI gateway not configured")]
    NotConfigured,
}

/// Model family selectable by callers of the test runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    #[default]
    Claude,
    Gemini,
    Deepseek,
}

impl ModelChoice {
    /// Gateway model identifier.
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Claude => "anthropic/claude-sonnet-4",
            Self::Gemini => "google/gemini-2.5-flash",
            Self::Deepseek => "deepseek/deepseek-chat",
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claude => write!(f, "claude"),
            Self::Gemini => write!(f, "gemini"),
            Self::Deepseek => write!(f, "deepseek"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A function the model is forced to call.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Abstraction over chat-completion backends.
///
/// `GatewayClient` implements this over HTTP; tests supply scripted models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Plain completion; returns the assistant message text.
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Forced tool call; returns the parsed arguments object.
    async fn call_tool(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tool: &ToolSpec,
    ) -> Result<Value, LlmError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Full chat-completions URL.
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI-compatible gateway client.
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn post(&self, body: Value) -> Result<Value, LlmError> {
        let start = Instant::now();
        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        debug!(
            model = body["model"].as_str().unwrap_or(""),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "AI gateway call completed"
        );
        Ok(json)
    }
}

#[async_trait]
impl LanguageModel for GatewayClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });
        let resp = self.post(body).await?;
        extract_content(&resp)
    }

    async fn call_tool(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tool: &ToolSpec,
    ) -> Result<Value, LlmError> {
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "tools": [{
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            }],
            "tool_choice": { "type": "function", "function": { "name": tool.name } },
        });
        let resp = self.post(body).await?;
        extract_tool_arguments(&resp)
    }
}

/// Assistant text from a chat-completions response.
pub fn extract_content(resp: &Value) -> Result<String, LlmError> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError("empty completion".to_string()))
}

/// Parsed arguments of the first tool call in a chat-completions response.
///
/// Gateways send arguments either as a JSON-encoded string or inline.
pub fn extract_tool_arguments(resp: &Value) -> Result<Value, LlmError> {
    match &resp["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"] {
        Value::String(raw) => {
            serde_json::from_str(raw).map_err(|e| LlmError::ParseError(e.to_string()))
        }
        obj @ Value::Object(_) => Ok(obj.clone()),
        _ => Err(LlmError::MissingToolCall),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_choice_parses_lowercase() {
        let c: ModelChoice = serde_json::from_value(json!("gemini")).unwrap();
        assert_eq!(c, ModelChoice::Gemini);
        assert_eq!(ModelChoice::default(), ModelChoice::Claude);
        assert_eq!(ModelChoice::Deepseek.model_id(), "deepseek/deepseek-chat");
    }

    #[test]
    fn test_extract_tool_arguments_from_string() {
        let resp = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {
                            "name": "create_test_plan",
                            "arguments": "{\"goal\":\"g\",\"steps\":[\"s\"]}"
                        }
                    }]
                }
            }]
        });
        let args = extract_tool_arguments(&resp).unwrap();
        assert_eq!(args["goal"], "g");
    }

    #[test]
    fn test_extract_tool_arguments_inline_object() {
        let resp = json!({
            "choices": [{ "message": { "tool_calls": [{ "function": { "arguments": {"goal": "x"} } }] } }]
        });
        assert_eq!(extract_tool_arguments(&resp).unwrap()["goal"], "x");
    }

    #[test]
    fn test_missing_tool_call() {
        let resp = json!({ "choices": [{ "message": { "content": "sure!" } }] });
        assert!(matches!(
            extract_tool_arguments(&resp),
            Err(LlmError::MissingToolCall)
        ));
    }

    #[test]
    fn test_malformed_arguments_are_parse_errors() {
        let resp = json!({
            "choices": [{ "message": { "tool_calls": [{ "function": { "arguments": "{not json" } }] } }]
        });
        assert!(matches!(
            extract_tool_arguments(&resp),
            Err(LlmError::ParseError(_))
        ));
    }

    #[test]
    fn test_extract_content_rejects_blank() {
        let resp = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert!(extract_content(&resp).is_err());
        let resp = json!({ "choices": [{ "message": { "content": " ok " } }] });
        assert_eq!(extract_content(&resp).unwrap(), "ok");
    }
}
