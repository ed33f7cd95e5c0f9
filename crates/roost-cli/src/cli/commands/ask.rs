//! Ask command handler: one prompt, one reply.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use roost_core::agent::AgentRunner;
use roost_core::config::Config;
use roost_core::transcript::{AgentReply, SubmitError, TranscriptController};

use crate::render;

pub async fn run(prompt: &str, config: &Config) -> Result<()> {
    let runner = AgentRunner::from_config(config).context("configure agent")?;
    let mut controller = TranscriptController::new(Arc::new(runner));

    match controller.submit(prompt) {
        Ok(()) => {}
        Err(SubmitError::EmptyPrompt) => bail!("Prompt is empty"),
        Err(SubmitError::Busy) => bail!("A request is already in flight"),
    }

    let Some(reply) = controller.wait_for_reply().await else {
        bail!("No reply was produced");
    };

    match reply {
        AgentReply::Parsed(doc) => {
            print!("{}", render::render_document(&doc));
            Ok(())
        }
        AgentReply::Failed { message } => bail!("Agent request failed: {message}"),
        AgentReply::Pending => bail!("Agent reply never resolved"),
    }
}
