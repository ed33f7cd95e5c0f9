//! Prompt file helpers.

/// System prompt for the Twitter search agent.
pub const AGENT_SYSTEM_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/agent_system_prompt.md"
));
