//! Agent loop: model turns interleaved with tool execution.
//!
//! Each submitted prompt runs a bounded loop: send the conversation to the
//! model, execute whatever tools it requested, feed the results back, and
//! stop when the model answers with text. Transient provider failures are
//! retried with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::prompts::AGENT_SYSTEM_PROMPT;
use crate::provider::{
    AssistantToolCall, ChatMessage, Completion, FunctionCall, OpenAiClient, OpenAiConfig,
    ProviderResult, ToolCall,
};
use crate::tools::{ToolContext, ToolOutput, ToolRegistry};
use crate::transcript::{AgentCollaborator, CollaboratorError};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Runs prompts against the model with the built-in tool set.
#[derive(Clone)]
pub struct AgentRunner {
    client: OpenAiClient,
    registry: Arc<ToolRegistry>,
    tool_ctx: ToolContext,
    max_steps: u32,
    max_retries: u32,
}

impl AgentRunner {
    /// Builds a runner from the loaded configuration.
    ///
    /// # Errors
    /// Returns an error when provider credentials cannot be resolved.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(OpenAiConfig::from_config(config)?),
            registry: Arc::new(ToolRegistry::builtins()),
            tool_ctx: ToolContext::from_config(config),
            max_steps: config.max_steps,
            max_retries: config.max_retries,
        })
    }

    #[cfg(test)]
    fn for_tests(client: OpenAiClient, config: &Config) -> Self {
        Self {
            client,
            registry: Arc::new(ToolRegistry::builtins()),
            tool_ctx: ToolContext::from_config(config),
            max_steps: config.max_steps,
            max_retries: config.max_retries,
        }
    }

    /// Runs a single prompt to completion and returns the model's final text.
    ///
    /// # Errors
    /// Returns an error when the provider fails past its retry budget or the
    /// model never produces a text answer within the step budget.
    pub async fn run(&self, prompt: String) -> Result<String, CollaboratorError> {
        let mut messages = vec![ChatMessage::user(prompt)];
        let tools = self.registry.definitions().to_vec();

        for step in 0..self.max_steps {
            let completion = self
                .send_with_retry(&messages, &tools)
                .await
                .map_err(|e| CollaboratorError {
                    status: e.status,
                    message: e.message,
                })?;

            if completion.tool_calls.is_empty() {
                debug!(step, "agent finished with text response");
                return Ok(completion.text);
            }

            let Completion {
                text, tool_calls, ..
            } = completion;
            messages.push(ChatMessage::assistant_tool_calls(
                (!text.is_empty()).then_some(text),
                tool_calls
                    .iter()
                    .map(|call| AssistantToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            ));

            for (call_id, output) in self.execute_tool_calls(&tool_calls).await {
                messages.push(ChatMessage::tool_result(call_id, output.to_json_string()));
            }
        }

        Err(CollaboratorError::new(format!(
            "agent did not produce a final answer within {} steps",
            self.max_steps
        )))
    }

    async fn send_with_retry(
        &self,
        messages: &[ChatMessage],
        tools: &[crate::tools::ToolDefinition],
    ) -> ProviderResult<Completion> {
        let mut attempt = 0;
        loop {
            match self
                .client
                .send_messages(messages, tools, Some(AGENT_SYSTEM_PROMPT))
                .await
            {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                    warn!(attempt, %err, "retrying model request after transient failure");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Executes the turn's tool calls concurrently, returning outputs paired
    /// with their call IDs in the order the model requested them.
    async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<(String, ToolOutput)> {
        let mut join_set: JoinSet<(usize, ToolOutput)> = JoinSet::new();
        for (i, call) in tool_calls.iter().enumerate() {
            let registry = Arc::clone(&self.registry);
            let ctx = self.tool_ctx.clone();
            let call = call.clone();
            join_set.spawn(async move {
                let input: Value = match serde_json::from_str(&call.arguments) {
                    Ok(input) => input,
                    Err(e) => {
                        return (
                            i,
                            ToolOutput::failure(
                                "invalid_arguments",
                                format!("Tool arguments for '{}' are not valid JSON", call.name),
                                Some(e.to_string()),
                            ),
                        );
                    }
                };
                (i, registry.execute(&call.name, &input, &ctx).await)
            });
        }

        let mut outputs: Vec<Option<ToolOutput>> = vec![None; tool_calls.len()];
        while let Some(task_result) = join_set.join_next().await {
            match task_result {
                Ok((idx, output)) => outputs[idx] = Some(output),
                Err(e) => warn!(%e, "tool task failed"),
            }
        }

        tool_calls
            .iter()
            .zip(outputs)
            .map(|(call, output)| {
                let output = output.unwrap_or_else(|| {
                    ToolOutput::failure("internal", "Tool task did not complete", None)
                });
                (call.id.clone(), output)
            })
            .collect()
    }
}

impl AgentCollaborator for AgentRunner {
    fn complete(&self, prompt: String) -> BoxFuture<'static, Result<String, CollaboratorError>> {
        let runner = self.clone();
        Box::pin(async move { runner.run(prompt).await })
    }
}
