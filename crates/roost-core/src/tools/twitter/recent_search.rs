//! Recent tweet search over the last seven days of the public timeline.

use serde::Deserialize;
use serde_json::{Value, json};

use super::super::{ToolContext, ToolDefinition, ToolOutput};

const ACTION: &str = "TWITTER_RECENT_SEARCH";

/// Returns the tool definition for the `Twitter_Recent_Search` tool.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "Twitter_Recent_Search".to_string(),
        description: "Search recent tweets (last 7 days) using Twitter query syntax, e.g. \
                      '(from:username)' or keyword filters. Supports an optional ISO 8601 \
                      time window."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Twitter search query. Use (from:username) to search a user's own tweets."
                },
                "start_time": {
                    "type": "string",
                    "description": "Optional ISO 8601 start of the search window, e.g. 2025-05-01T00:00:00Z."
                },
                "end_time": {
                    "type": "string",
                    "description": "Optional ISO 8601 end of the search window. Must be at least 10 seconds in the past."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum tweets to return (10-100, default: 10)",
                    "default": 10,
                    "minimum": 10,
                    "maximum": 100
                },
                "exclude_replies": {
                    "type": "boolean",
                    "description": "Drop replies from the results, keeping only top-level tweets (default: false)",
                    "default": false
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Deserialize)]
struct RecentSearchInput {
    query: String,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default = "default_max_results")]
    max_results: u32,
    #[serde(default, deserialize_with = "super::super::bool_or_string::deserialize")]
    exclude_replies: bool,
}

fn default_max_results() -> u32 {
    10
}

/// Reply filtering uses the `-is:reply` query operator; the hosted action
/// has no dedicated parameter for it.
fn effective_query(query: &str, exclude_replies: bool) -> String {
    if exclude_replies {
        format!("{query} -is:reply")
    } else {
        query.to_string()
    }
}

/// Executes the `Twitter_Recent_Search` tool asynchronously.
pub async fn execute(input: &Value, ctx: &ToolContext) -> ToolOutput {
    let input: RecentSearchInput = match serde_json::from_value(input.clone()) {
        Ok(i) => i,
        Err(e) => {
            return ToolOutput::failure(
                "invalid_input",
                "Invalid input for Twitter_Recent_Search tool",
                Some(format!("Parse error: {e}")),
            );
        }
    };

    let query = input.query.trim();
    if query.is_empty() {
        return ToolOutput::failure("invalid_input", "query cannot be empty", None);
    }
    if !(10..=100).contains(&input.max_results) {
        return ToolOutput::failure(
            "invalid_input",
            "max_results must be between 10 and 100",
            None,
        );
    }

    let mut arguments = json!({
        "query": effective_query(query, input.exclude_replies),
        "max_results": input.max_results,
    });
    if let Some(start) = input.start_time.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        arguments["start_time"] = json!(start);
    }
    if let Some(end) = input.end_time.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        arguments["end_time"] = json!(end);
    }

    ctx.composio.execute_action(ACTION, arguments).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let ctx = ToolContext::from_config(&Config::default());
        let output = execute(&json!({"query": "   "}), &ctx).await;
        let (code, message, _) = output.error_info().unwrap();
        assert_eq!(code, "invalid_input");
        assert!(message.contains("query"));
    }

    #[test]
    fn exclude_replies_accepts_boolean_like_strings() {
        let input: RecentSearchInput = serde_json::from_value(
            json!({"query": "(from:alice)", "exclude_replies": "true"}),
        )
        .unwrap();
        assert!(input.exclude_replies);

        let input: RecentSearchInput =
            serde_json::from_value(json!({"query": "(from:alice)"})).unwrap();
        assert!(!input.exclude_replies);
    }

    #[test]
    fn exclude_replies_appends_the_query_operator() {
        assert_eq!(
            effective_query("(from:alice)", true),
            "(from:alice) -is:reply"
        );
        assert_eq!(effective_query("(from:alice)", false), "(from:alice)");
    }

    #[tokio::test]
    async fn out_of_range_max_results_is_rejected() {
        let ctx = ToolContext::from_config(&Config::default());
        let output = execute(&json!({"query": "(from:alice)", "max_results": 5}), &ctx).await;
        let (code, _, _) = output.error_info().unwrap();
        assert_eq!(code, "invalid_input");
    }
}
