//! Chat command handler: interactive prompt loop.

use std::io::{BufRead, IsTerminal, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use roost_core::agent::AgentRunner;
use roost_core::config::Config;
use roost_core::transcript::{AgentReply, SubmitError, TranscriptController};

use super::ask;
use crate::render;

pub async fn run(config: &Config) -> Result<()> {
    // If stdin is piped, run ask mode instead
    if !std::io::stdin().is_terminal() {
        let mut prompt = String::new();
        std::io::stdin().lock().read_to_string(&mut prompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        return ask::run(prompt, config).await;
    }

    let runner = AgentRunner::from_config(config).context("configure agent")?;
    let mut controller = TranscriptController::new(Arc::new(runner));

    println!("roost chat ({}). Empty line or Ctrl-D to exit.", config.model);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let prompt = line.trim_end_matches('\n');
        if prompt.trim().is_empty() {
            break;
        }

        match controller.submit(prompt) {
            Ok(()) => {}
            Err(SubmitError::EmptyPrompt) => continue,
            Err(SubmitError::Busy) => {
                // submit and wait alternate strictly below, so this is
                // unreachable in practice
                eprintln!("still waiting on the previous prompt");
                continue;
            }
        }

        match controller.wait_for_reply().await {
            Some(AgentReply::Parsed(doc)) => print!("{}", render::render_document(&doc)),
            Some(AgentReply::Failed { message }) => eprintln!("error: {message}"),
            Some(AgentReply::Pending) | None => {}
        }
        println!();
    }

    Ok(())
}
