//! Unfollow a user by numeric ID.

use serde::Deserialize;
use serde_json::{Value, json};

use super::super::{ToolContext, ToolDefinition, ToolOutput};

const ACTION: &str = "TWITTER_UNFOLLOW_USER";

/// Returns the tool definition for the `Twitter_Unfollow_User` tool.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "Twitter_Unfollow_User".to_string(),
        description: "Unfollow a Twitter user on behalf of the connected account. Requires \
                      the numeric user ID from Twitter_User_Lookup, not the username."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "Numeric ID of the user to unfollow."
                }
            },
            "required": ["user_id"],
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Deserialize)]
struct UnfollowInput {
    user_id: String,
}

/// Executes the `Twitter_Unfollow_User` tool asynchronously.
pub async fn execute(input: &Value, ctx: &ToolContext) -> ToolOutput {
    let input: UnfollowInput = match serde_json::from_value(input.clone()) {
        Ok(i) => i,
        Err(e) => {
            return ToolOutput::failure(
                "invalid_input",
                "Invalid input for Twitter_Unfollow_User tool",
                Some(format!("Parse error: {e}")),
            );
        }
    };

    let user_id = input.user_id.trim();
    if user_id.is_empty() {
        return ToolOutput::failure("invalid_input", "user_id cannot be empty", None);
    }

    ctx.composio
        .execute_action(ACTION, json!({"user_id": user_id}))
        .await
}
