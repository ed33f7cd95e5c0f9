//! Client for Composio-hosted actions.
//!
//! Twitter and Calendar tools do not talk to their vendors directly; they
//! run as named actions on Composio's execution backend. This client wraps
//! the execute endpoint and normalizes its responses into [`ToolOutput`].

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::ToolOutput;
use crate::config::Config;

const DEFAULT_COMPOSIO_BASE_URL: &str = "https://backend.composio.dev";
const EXECUTE_PATH: &str = "/api/v3/tools/execute";

/// HTTP client for the Composio action backend.
#[derive(Debug, Clone)]
pub struct ComposioClient {
    api_key: Option<String>,
    base_url: String,
    entity_id: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

impl ComposioClient {
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self {
            api_key: config.composio.api_key.clone(),
            base_url: config
                .composio
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPOSIO_BASE_URL.to_string()),
            entity_id: config
                .composio
                .entity_id
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            http,
        }
    }

    /// The key is resolved per call so a missing key surfaces as a tool
    /// failure the model can report, not a startup error.
    fn resolve_api_key(&self) -> Result<String, ToolOutput> {
        if let Some(key) = &self.api_key {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
        match std::env::var("COMPOSIO_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ToolOutput::failure(
                "missing_api_key",
                "COMPOSIO_API_KEY environment variable not set",
                Some("Set COMPOSIO_API_KEY or api_key in [composio] to use hosted tools".to_string()),
            )),
        }
    }

    /// Executes a named Composio action with the given arguments.
    pub async fn execute_action(&self, action: &str, arguments: Value) -> ToolOutput {
        let api_key = match self.resolve_api_key() {
            Ok(key) => key,
            Err(output) => return output,
        };

        debug!(action, "executing composio action");
        let url = format!("{}{}/{}", self.base_url, EXECUTE_PATH, action);
        let response = match self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .json(&json!({
                "arguments": arguments,
                "user_id": self.entity_id,
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return ToolOutput::failure(
                    "network_error",
                    format!("Failed to reach Composio for action '{action}'"),
                    Some(e.to_string()),
                );
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return ToolOutput::failure(
                "composio_http",
                format!("Composio returned HTTP {} for action '{action}'", status.as_u16()),
                (!body.is_empty()).then_some(body),
            );
        }

        let parsed: ExecuteResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return ToolOutput::failure(
                    "parse_error",
                    format!("Unparseable Composio response for action '{action}'"),
                    Some(format!("{e}: {body}")),
                );
            }
        };

        if parsed.successful {
            ToolOutput::success(parsed.data)
        } else {
            ToolOutput::failure(
                "action_failed",
                parsed
                    .error
                    .unwrap_or_else(|| format!("Composio action '{action}' failed")),
                None,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ComposioClient {
        let mut config = Config::default();
        config.composio.api_key = Some("composio-key".to_string());
        config.composio.base_url = Some(server.uri());
        ComposioClient::from_config(&config, reqwest::Client::new())
    }

    #[tokio::test]
    async fn successful_action_unwraps_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/tools/execute/TWITTER_RECENT_SEARCH"))
            .and(header("x-api-key", "composio-key"))
            .and(body_partial_json(json!({"user_id": "default"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "successful": true,
                "data": {"tweets": []}
            })))
            .mount(&server)
            .await;

        let output = client_for(&server)
            .execute_action("TWITTER_RECENT_SEARCH", json!({"query": "(from:alice)"}))
            .await;
        assert!(output.is_ok());
        assert_eq!(output.data(), Some(&json!({"tweets": []})));
    }

    #[tokio::test]
    async fn backend_failure_becomes_tool_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/tools/execute/TWITTER_FOLLOW_USER"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "successful": false,
                "error": "account not connected"
            })))
            .mount(&server)
            .await;

        let output = client_for(&server)
            .execute_action("TWITTER_FOLLOW_USER", json!({"user_id": "123"}))
            .await;
        let (code, message, _) = output.error_info().unwrap();
        assert_eq!(code, "action_failed");
        assert_eq!(message, "account not connected");
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/tools/execute/TWITTER_USER_LOOKUP_BY_USERNAME"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let output = client_for(&server)
            .execute_action("TWITTER_USER_LOOKUP_BY_USERNAME", json!({"username": "a"}))
            .await;
        let (code, message, details) = output.error_info().unwrap();
        assert_eq!(code, "composio_http");
        assert!(message.contains("401"));
        assert_eq!(details, Some("unauthorized"));
    }
}
