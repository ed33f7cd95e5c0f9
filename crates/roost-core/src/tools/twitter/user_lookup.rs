//! Profile lookup by username.

use serde::Deserialize;
use serde_json::{Value, json};

use super::super::{ToolContext, ToolDefinition, ToolOutput};
use super::normalize_username;

const ACTION: &str = "TWITTER_USER_LOOKUP_BY_USERNAME";

/// Returns the tool definition for the `Twitter_User_Lookup` tool.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "Twitter_User_Lookup".to_string(),
        description: "Look up a Twitter user's profile by username. Returns bio, display \
                      name, profile image, verification status, and user ID."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "username": {
                    "type": "string",
                    "description": "Username to look up, with or without a leading @."
                }
            },
            "required": ["username"],
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Deserialize)]
struct UserLookupInput {
    username: String,
}

/// Executes the `Twitter_User_Lookup` tool asynchronously.
pub async fn execute(input: &Value, ctx: &ToolContext) -> ToolOutput {
    let input: UserLookupInput = match serde_json::from_value(input.clone()) {
        Ok(i) => i,
        Err(e) => {
            return ToolOutput::failure(
                "invalid_input",
                "Invalid input for Twitter_User_Lookup tool",
                Some(format!("Parse error: {e}")),
            );
        }
    };

    let username = normalize_username(&input.username);
    if username.is_empty() {
        return ToolOutput::failure("invalid_input", "username cannot be empty", None);
    }

    ctx.composio
        .execute_action(ACTION, json!({"username": username}))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn bare_at_sign_is_rejected() {
        let ctx = ToolContext::from_config(&Config::default());
        let output = execute(&json!({"username": "@"}), &ctx).await;
        let (code, _, _) = output.error_info().unwrap();
        assert_eq!(code, "invalid_input");
    }
}
