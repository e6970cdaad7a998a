//! Hookline CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::EventKind;

#[derive(Parser)]
#[command(name = "hookline")]
#[command(about = "Hookline webhook CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an integration config
    Validate {
        /// Path to the configuration file
        path: PathBuf,
    },
    /// Show which jobs an event would run
    Filter {
        /// Path to the configuration file
        config: PathBuf,
        /// Event kind
        #[arg(long, value_enum)]
        event: EventKind,
        /// Pushed ref (`refs/heads/main`) or pull request base branch (`main`)
        #[arg(long = "ref")]
        git_ref: String,
    },
    /// Run a webhook payload through parsing and dispatch without a cluster
    Dispatch {
        /// Path to the configuration file
        config: PathBuf,
        /// Provider event name, e.g. `push` or `Merge Request Hook`
        #[arg(long)]
        provider_event: String,
        /// JSON payload file
        #[arg(long)]
        payload: PathBuf,
    },
    /// Manage webhooks on the remote repository
    Webhooks {
        /// Path to the configuration file
        #[arg(long, short)]
        config: PathBuf,

        #[command(subcommand)]
        command: WebhookCommands,
    },
}

#[derive(Subcommand)]
enum WebhookCommands {
    /// List registered webhooks
    List,
    /// Register a webhook receiver
    Register {
        /// Public URL of `/webhook/{namespace}/{config}`
        url: String,
    },
    /// Delete a registered webhook
    Delete {
        /// Webhook ID
        id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Filter {
            config,
            event,
            git_ref,
        } => {
            commands::filter(&config, event, &git_ref)?;
        }
        Commands::Dispatch {
            config,
            provider_event,
            payload,
        } => {
            commands::dispatch::run(&config, &provider_event, &payload).await?;
        }
        Commands::Webhooks { config, command } => match command {
            WebhookCommands::List => {
                commands::webhooks::list(&config).await?;
            }
            WebhookCommands::Register { url } => {
                commands::webhooks::register(&config, &url).await?;
            }
            WebhookCommands::Delete { id } => {
                commands::webhooks::delete(&config, id).await?;
            }
        },
    }

    Ok(())
}
