//! Web search tool using Parallel Search API.
//!
//! Lets the agent research topics that live outside Twitter. Requires an
//! API key from `[web_search]` in the config or `PARALLEL_API_KEY`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ToolContext, ToolDefinition, ToolOutput};

const PARALLEL_SEARCH_URL: &str = "https://api.parallel.ai/v1beta/search";
const PARALLEL_BETA_HEADER: &str = "search-extract-2025-10-10";

/// Returns the tool definition for the `Web_Search` tool.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "Web_Search".to_string(),
        description: "Search the web for information using natural language. Returns \
                      LLM-optimized excerpts ranked by relevance."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "objective": {
                    "type": "string",
                    "description": "Natural language research goal (max 5000 chars)."
                },
                "search_queries": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional keyword queries (max 200 chars each)."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum results to return (1-20, default: 10)",
                    "default": 10,
                    "minimum": 1,
                    "maximum": 20
                }
            },
            "required": ["objective"],
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    objective: String,
    #[serde(default, deserialize_with = "super::string_or_vec::deserialize")]
    search_queries: Option<Vec<String>>,
    #[serde(default = "default_max_results")]
    max_results: u32,
}

fn default_max_results() -> u32 {
    10
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    objective: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_queries: Option<Vec<String>>,
    max_results: u32,
    mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
    #[serde(default)]
    warnings: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SearchResult {
    url: String,
    title: String,
    #[serde(default)]
    publish_date: Option<String>,
    excerpts: Vec<String>,
}

fn resolve_api_key(ctx: &ToolContext) -> Option<String> {
    if let Some(key) = &ctx.web_search_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    std::env::var("PARALLEL_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Executes the `Web_Search` tool asynchronously.
pub async fn execute(input: &Value, ctx: &ToolContext) -> ToolOutput {
    let input: WebSearchInput = match serde_json::from_value(input.clone()) {
        Ok(i) => i,
        Err(e) => {
            return ToolOutput::failure(
                "invalid_input",
                "Invalid input for Web_Search tool",
                Some(format!("Parse error: {e}")),
            );
        }
    };

    let objective = input.objective.trim();
    if objective.is_empty() {
        return ToolOutput::failure("invalid_input", "objective cannot be empty", None);
    }
    if objective.len() > 5000 {
        return ToolOutput::failure(
            "invalid_input",
            "Objective exceeds maximum length of 5000 characters",
            None,
        );
    }
    if !(1..=20).contains(&input.max_results) {
        return ToolOutput::failure("invalid_input", "max_results must be between 1 and 20", None);
    }
    if let Some(queries) = &input.search_queries {
        for query in queries {
            if query.len() > 200 {
                return ToolOutput::failure(
                    "invalid_input",
                    format!("Search query exceeds 200 characters: \"{query}\""),
                    None,
                );
            }
        }
    }

    let Some(api_key) = resolve_api_key(ctx) else {
        return ToolOutput::failure(
            "missing_api_key",
            "PARALLEL_API_KEY environment variable not set",
            Some("Set PARALLEL_API_KEY or api_key in [web_search] to use web search".to_string()),
        );
    };

    let request = SearchRequest {
        objective: objective.to_string(),
        search_queries: input.search_queries,
        max_results: input.max_results,
        mode: "agentic",
    };

    let response = match ctx
        .http
        .post(PARALLEL_SEARCH_URL)
        .header("Content-Type", "application/json")
        .header("x-api-key", &api_key)
        .header("parallel-beta", PARALLEL_BETA_HEADER)
        .json(&request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return ToolOutput::failure(
                "network_error",
                "Failed to reach the search backend",
                Some(e.to_string()),
            );
        }
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return ToolOutput::failure(
            "search_http",
            format!("Search backend returned HTTP {}", status.as_u16()),
            (!body.is_empty()).then_some(body),
        );
    }

    let parsed: SearchResponse = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ToolOutput::failure(
                "parse_error",
                "Unparseable search response",
                Some(format!("{e}: {body}")),
            );
        }
    };

    let mut data = json!({ "results": parsed.results });
    if let Some(warnings) = parsed.warnings {
        data["warnings"] = json!(warnings);
    }
    ToolOutput::success(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn empty_objective_is_rejected() {
        let ctx = ToolContext::from_config(&Config::default());
        let output = execute(&json!({"objective": ""}), &ctx).await;
        let (code, _, _) = output.error_info().unwrap();
        assert_eq!(code, "invalid_input");
    }

    #[tokio::test]
    async fn single_string_search_queries_is_accepted() {
        let input: WebSearchInput =
            serde_json::from_value(json!({"objective": "x", "search_queries": "rust async"}))
                .unwrap();
        assert_eq!(input.search_queries, Some(vec!["rust async".to_string()]));
    }
}
