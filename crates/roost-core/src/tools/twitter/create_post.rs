//! Post a tweet from the connected account.

use serde::Deserialize;
use serde_json::{Value, json};

use super::super::{ToolContext, ToolDefinition, ToolOutput};

const ACTION: &str = "TWITTER_CREATION_OF_A_POST";
const MAX_POST_LENGTH: usize = 280;

/// Returns the tool definition for the `Twitter_Create_Post` tool.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "Twitter_Create_Post".to_string(),
        description: "Post a tweet from the connected account. Text must be non-empty and \
                      at most 280 characters."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Tweet text (1-280 characters)."
                }
            },
            "required": ["text"],
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Deserialize)]
struct CreatePostInput {
    text: String,
}

/// Executes the `Twitter_Create_Post` tool asynchronously.
pub async fn execute(input: &Value, ctx: &ToolContext) -> ToolOutput {
    let input: CreatePostInput = match serde_json::from_value(input.clone()) {
        Ok(i) => i,
        Err(e) => {
            return ToolOutput::failure(
                "invalid_input",
                "Invalid input for Twitter_Create_Post tool",
                Some(format!("Parse error: {e}")),
            );
        }
    };

    let text = input.text.trim();
    if text.is_empty() {
        return ToolOutput::failure("invalid_input", "text cannot be empty", None);
    }
    // Twitter counts characters, not bytes.
    if text.chars().count() > MAX_POST_LENGTH {
        return ToolOutput::failure(
            "invalid_input",
            format!("text exceeds {MAX_POST_LENGTH} characters"),
            None,
        );
    }

    ctx.composio
        .execute_action(ACTION, json!({"text": text}))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn over_length_post_is_rejected() {
        let ctx = ToolContext::from_config(&Config::default());
        let long = "x".repeat(MAX_POST_LENGTH + 1);
        let output = execute(&json!({"text": long}), &ctx).await;
        let (code, message, _) = output.error_info().unwrap();
        assert_eq!(code, "invalid_input");
        assert!(message.contains("280"));
    }
}
