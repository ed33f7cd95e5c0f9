//! OpenAI-compatible Chat Completions client (non-streaming).

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::tools::ToolDefinition;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Standard User-Agent header for roost API requests.
pub const USER_AGENT: &str = concat!("roost/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// # Errors
/// Returns an error when neither source provides a key.
pub fn resolve_api_key(
    config_api_key: Option<&str>,
    env_var: &str,
    config_section: &str,
) -> Result<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    std::env::var(env_var).context(format!(
        "No API key available. Set {env_var} or api_key in [{config_section}]."
    ))
}

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error when the resolved URL is not well-formed.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of provider errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Failed to parse the response body
    Parse,
    /// API-level error returned by the provider (e.g., overloaded)
    ApiError,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::HttpStatus => write!(f, "http_status"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Parse => write!(f, "parse"),
            ProviderErrorKind::ApiError => write!(f, "api_error"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error category
    pub kind: ProviderErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
    /// HTTP status when the error came off the wire
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Creates an HTTP status error, surfacing the API's own message when
    /// the body carries an `{"error": {"message": ...}}` payload.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = (!body.is_empty()).then(|| body.to_string());
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(error_obj) = json.get("error")
            && let Some(msg) = error_obj.get("message").and_then(|v| v.as_str())
        {
            return Self {
                kind: ProviderErrorKind::HttpStatus,
                message: format!("HTTP {status}: {msg}"),
                details,
                status: Some(status),
            };
        }
        Self {
            kind: ProviderErrorKind::HttpStatus,
            message: format!("HTTP {status}"),
            details,
            status: Some(status),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Parse, message)
    }

    /// Creates an API error (error payload delivered with a success status).
    pub fn api_error(error_type: &str, message: &str) -> Self {
        Self::new(
            ProviderErrorKind::ApiError,
            format!("{error_type}: {message}"),
        )
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ProviderErrorKind::Timeout => true,
            ProviderErrorKind::HttpStatus => self
                .status
                .is_some_and(|s| s == 429 || (500..600).contains(&s)),
            ProviderErrorKind::Parse | ProviderErrorKind::ApiError => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

fn classify_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// One message in the Chat Completions conversation array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<AssistantToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant turn carrying tool invocations, replayed verbatim so the
    /// follow-up tool results can reference their call IDs.
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<AssistantToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, kept as a string per the wire format.
    pub arguments: String,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// One non-streaming model turn.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Assistant text, empty when the turn is tool calls only.
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatToolDefinition<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatToolDefinition<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatToolFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ChatToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<AssistantToolCall>,
}

// ============================================================================
// Client
// ============================================================================

/// OpenAI-compatible chat completions configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl OpenAiConfig {
    /// Builds provider configuration from the loaded config file plus the
    /// `OPENAI_API_KEY` / `OPENAI_BASE_URL` environment.
    ///
    /// # Errors
    /// Returns an error when no API key is available or the base URL is
    /// malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = resolve_api_key(
            config.providers.openai.api_key.as_deref(),
            "OPENAI_API_KEY",
            "providers.openai",
        )?;
        let base_url = resolve_base_url(
            config.providers.openai.base_url.as_deref(),
            "OPENAI_BASE_URL",
            DEFAULT_OPENAI_BASE_URL,
            "OpenAI",
        )?;
        Ok(Self {
            api_key,
            base_url,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

/// Non-streaming OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Sends one conversation turn and returns the model's reply.
    ///
    /// # Errors
    /// Returns a classified [`ProviderError`] for transport failures,
    /// non-success statuses, and unparseable bodies.
    pub async fn send_messages(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        system: Option<&str>,
    ) -> ProviderResult<Completion> {
        let mut request_messages: Vec<&ChatMessage> = Vec::with_capacity(messages.len() + 1);
        let system_message = system.map(ChatMessage::system);
        if let Some(sys) = &system_message {
            request_messages.push(sys);
        }
        request_messages.extend(messages);

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: request_messages,
            tools: (!tools.is_empty()).then(|| {
                tools
                    .iter()
                    .map(|t| ChatToolDefinition {
                        tool_type: "function",
                        function: ChatToolFunction {
                            name: &t.name,
                            description: &t.description,
                            parameters: &t.input_schema,
                        },
                    })
                    .collect()
            }),
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}{}", self.config.base_url, CHAT_COMPLETIONS_PATH);
        let response = self
            .http
            .post(&url)
            .headers(build_headers(&self.config.api_key))
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status.as_u16(), &error_body));
        }

        let body = response.text().await.map_err(classify_reqwest_error)?;

        // Some gateways deliver API-level errors with a 200 status.
        if let Ok(json) = serde_json::from_str::<Value>(&body)
            && let Some(error_obj) = json.get("error")
        {
            let error_type = error_obj
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("api_error");
            let message = error_obj
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Provider returned an error payload");
            return Err(ProviderError::api_error(error_type, message));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("Invalid chat completion body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::parse("Chat completion returned no choices"))?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            tool_calls: choice
                .message
                .tool_calls
                .into_iter()
                .map(|call| ToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
            finish_reason: choice.finish_reason,
        })
    }
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert(
        "user-agent",
        HeaderValue::from_str(USER_AGENT).unwrap_or_else(|_| HeaderValue::from_static("roost")),
    );
    headers
}
