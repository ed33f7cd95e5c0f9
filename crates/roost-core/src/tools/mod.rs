//! Tool system for agentic capabilities.
//!
//! This module provides a registry of the externally hosted tools the agent
//! can call, along with schema definitions for the Chat Completions API.
//! Every tool resolves to a JSON envelope: `{"ok": true, "data": ...}` on
//! success, `{"ok": false, "error": {...}}` on failure.

pub mod calendar;
pub mod composio;
pub mod twitter;
pub mod web_search;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use composio::ComposioClient;

// ============================================================================
// Serde helpers for LLM-resilient deserialization
// ============================================================================

/// Serde helper that accepts either a JSON array of strings or a single string.
///
/// LLMs sometimes send `"search_queries": "single query"` instead of
/// `"search_queries": ["single query"]`. This module gracefully coerces
/// a bare string into a one-element `Vec<String>`.
pub(crate) mod string_or_vec {
    use serde::{Deserialize, Deserializer, de};

    /// Deserializes a `Vec<String>` that also accepts a single string.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrVec {
            String(String),
            Vec(Vec<String>),
        }

        let value: Option<StringOrVec> = Option::deserialize(deserializer)?;
        match value {
            None => Ok(None),
            Some(StringOrVec::String(s)) => {
                if s.is_empty() { Ok(None) } else { Ok(Some(vec![s])) }
            }
            Some(StringOrVec::Vec(v)) => {
                for item in &v {
                    if item.is_empty() {
                        return Err(de::Error::custom("array contains empty string"));
                    }
                }
                if v.is_empty() { Ok(None) } else { Ok(Some(v)) }
            }
        }
    }
}

/// Serde helper that accepts either a JSON boolean or a boolean-like string.
///
/// LLMs sometimes send `"exclude_replies": "true"` instead of
/// `"exclude_replies": true`.
pub(crate) mod bool_or_string {
    use serde::{Deserialize, Deserializer, de};

    /// Deserializes a `bool` that also accepts string values like
    /// `"true"`, `"false"`, `"1"`, `"0"`, `"yes"`, `"no"`.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum BoolOrString {
            Bool(bool),
            String(String),
        }

        match BoolOrString::deserialize(deserializer)? {
            BoolOrString::Bool(v) => Ok(v),
            BoolOrString::String(raw) => {
                let normalized = raw.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    "true" | "1" | "yes" | "y" | "on" => Ok(true),
                    "false" | "0" | "no" | "n" | "off" | "" => Ok(false),
                    _ => Err(de::Error::custom(format!(
                        "expected boolean or boolean-like string, got '{raw}'"
                    ))),
                }
            }
        }
    }
}

// ============================================================================
// Definitions and outputs
// ============================================================================

/// Tool definition for the Chat Completions API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Error details for failed tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub code: String,
    pub message: String,
    /// Optional additional context for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Structured envelope for tool outputs.
///
/// - Success: `{"ok": true, "data": { ... }}`
/// - Failure: `{"ok": false, "error": { "code": "...", "message": "...", "details": ... }}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Success { ok: bool, data: Value },
    Failure { ok: bool, error: ToolError },
}

impl Serialize for ToolOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        match self {
            ToolOutput::Success { ok, data } => {
                let mut state = serializer.serialize_struct("ToolOutput", 2)?;
                state.serialize_field("ok", ok)?;
                state.serialize_field("data", data)?;
                state.end()
            }
            ToolOutput::Failure { ok, error } => {
                let mut state = serializer.serialize_struct("ToolOutput", 2)?;
                state.serialize_field("ok", ok)?;
                state.serialize_field("error", error)?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ToolOutput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawToolOutput {
            ok: bool,
            #[serde(default)]
            data: Option<Value>,
            #[serde(default)]
            error: Option<ToolError>,
        }

        let raw = RawToolOutput::deserialize(deserializer)?;
        if raw.ok {
            Ok(ToolOutput::Success {
                ok: true,
                data: raw.data.unwrap_or(Value::Null),
            })
        } else {
            Ok(ToolOutput::Failure {
                ok: false,
                error: raw.error.unwrap_or(ToolError {
                    code: "unknown".to_string(),
                    message: "Unknown error".to_string(),
                    details: None,
                }),
            })
        }
    }
}

impl ToolOutput {
    /// Creates a successful tool output.
    pub fn success(data: Value) -> Self {
        ToolOutput::Success { ok: true, data }
    }

    /// Creates a failed tool output.
    pub fn failure(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<String>,
    ) -> Self {
        ToolOutput::Failure {
            ok: false,
            error: ToolError {
                code: code.into(),
                message: message.into(),
                details,
            },
        }
    }

    /// Creates a failed tool output with additional context.
    pub fn failure_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::failure(code, message, Some(details.into()))
    }

    /// Returns true if this output represents success.
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutput::Success { .. })
    }

    /// Returns the data if this is a successful output.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ToolOutput::Success { data, .. } => Some(data),
            ToolOutput::Failure { .. } => None,
        }
    }

    /// Returns the error code, message, and details if this is a failure.
    pub fn error_info(&self) -> Option<(&str, &str, Option<&str>)> {
        match self {
            ToolOutput::Failure { error, .. } => Some((
                error.code.as_str(),
                error.message.as_str(),
                error.details.as_deref(),
            )),
            ToolOutput::Success { .. } => None,
        }
    }

    /// Converts the tool output to a JSON string for sending to the model.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"ok":false,"error":{"code":"serialize_error","message":"Failed to serialize tool output"}}"#.to_string()
        })
    }
}

// ============================================================================
// Context and registry
// ============================================================================

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Shared HTTP client for tools that call their backends directly.
    pub http: reqwest::Client,
    /// Client for Composio-hosted actions (Twitter, Calendar).
    pub composio: ComposioClient,
    /// API key for the Parallel Search backend, when configured.
    pub web_search_api_key: Option<String>,
}

impl ToolContext {
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            composio: ComposioClient::from_config(config, http.clone()),
            web_search_api_key: config.web_search.api_key.clone(),
            http,
        }
    }
}

/// Async tool handler function.
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolOutput> + Send>>;
pub type ToolHandler = Arc<dyn Fn(&Value, &ToolContext) -> ToolFuture + Send + Sync>;

/// Tool registry (definitions + executors).
#[derive(Clone, Default)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    handlers: HashMap<String, ToolHandler>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("definitions", &self.definitions)
            .field("handlers_len", &self.handlers.len())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in tool installed.
    pub fn builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_tools();
        registry
    }

    /// Registers a tool, replacing any existing tool with the same name.
    /// Dispatch is case-insensitive on the lowercased name.
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) {
        let name_lower = definition.name.to_ascii_lowercase();
        if let Some(pos) = self
            .definitions
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(&definition.name))
        {
            self.definitions.remove(pos);
        }
        self.definitions.push(definition);
        self.handlers.insert(name_lower, handler);
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Executes a tool by name. Unknown names resolve to a failure output
    /// rather than an error, so the model can self-correct.
    pub async fn execute(&self, name: &str, input: &Value, ctx: &ToolContext) -> ToolOutput {
        let name_lower = name.to_ascii_lowercase();
        match self.handlers.get(&name_lower) {
            Some(handler) => handler(input, ctx).await,
            None => {
                let known = self
                    .definitions
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                ToolOutput::failure(
                    "unknown_tool",
                    format!("Unknown tool '{name}'"),
                    Some(format!("Available tools: {known}")),
                )
            }
        }
    }

    fn register_builtin_tools(&mut self) {
        self.register(
            twitter::recent_search::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { twitter::recent_search::execute(&input, &ctx).await })
            }),
        );

        self.register(
            twitter::user_lookup::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { twitter::user_lookup::execute(&input, &ctx).await })
            }),
        );

        self.register(
            twitter::follow_user::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { twitter::follow_user::execute(&input, &ctx).await })
            }),
        );

        self.register(
            twitter::unfollow_user::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { twitter::unfollow_user::execute(&input, &ctx).await })
            }),
        );

        self.register(
            twitter::create_post::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { twitter::create_post::execute(&input, &ctx).await })
            }),
        );

        self.register(
            calendar::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { calendar::execute(&input, &ctx).await })
            }),
        );

        self.register(
            web_search::definition(),
            Arc::new(|input, ctx| {
                let input = input.clone();
                let ctx = ctx.clone();
                Box::pin(async move { web_search::execute(&input, &ctx).await })
            }),
        );
    }
}
