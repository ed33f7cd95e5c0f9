//! Current date and time from the connected Google Calendar account.
//!
//! The agent must never guess what "today" is; date math for search windows
//! starts from this tool's answer.

use serde_json::{Value, json};

use super::{ToolContext, ToolDefinition, ToolOutput};

const ACTION: &str = "GOOGLECALENDAR_GET_CURRENT_DATE_TIME";

/// Returns the tool definition for the `Calendar_Current_Datetime` tool.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "Calendar_Current_Datetime".to_string(),
        description: "Get the current date and time from the connected calendar. Always \
                      call this before computing relative dates like 'today' or 'last week'."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

/// Executes the `Calendar_Current_Datetime` tool asynchronously.
pub async fn execute(_input: &Value, ctx: &ToolContext) -> ToolOutput {
    ctx.composio.execute_action(ACTION, json!({})).await
}
