//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use roost_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "roost")]
#[command(version)]
#[command(about = "Twitter search agent in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the model from config
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start an interactive chat session (the default when no command is given)
    Chat,

    /// Send a single prompt and print the reply
    Ask {
        /// The prompt to send to the agent
        #[arg(short, long)]
        prompt: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Show the effective configuration
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ROOST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;

    if let Some(model) = cli.model.as_deref() {
        let trimmed = model.trim();
        if !trimmed.is_empty() {
            config.model = trimmed.to_string();
        }
    }

    // default to chat mode
    let Some(command) = cli.command else {
        return commands::chat::run(&config).await;
    };

    match command {
        Commands::Chat => commands::chat::run(&config).await,

        Commands::Ask { prompt } => commands::ask::run(&prompt, &config).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Show => commands::config::show(&config),
        },
    }
}
