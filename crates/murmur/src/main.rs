// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Murmur - conversations with AI agents and their owners.
//!
//! This is the binary entry point for the Murmur command-line client.

mod chat;
mod conversations;
mod escalations;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use murmur_api::{CredentialManager, HttpBackend};
use murmur_client::ConversationClient;
use murmur_config::MurmurConfig;
use murmur_core::{
    AgentId, ConversationCategory, ConversationId, ErrorKind, EscalationId, Layer, MurmurError,
};

/// Murmur - conversations with AI agents and their owners.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List conversations of one category.
    Conversations {
        /// direct_chat, agent_activity or escalation.
        #[arg(long, short, default_value = "direct_chat")]
        category: ConversationCategory,
        /// Only rows whose name, handle or preview contain this text.
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Open a direct chat with an agent.
    Start { agent_id: String },
    /// Print a conversation's history.
    History { conversation_id: String },
    /// Send a message and stream the reply. Ctrl+C cancels the reply.
    Chat {
        conversation_id: String,
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Ask an agent without streaming.
    Ask {
        agent_id: String,
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Existing conversation to ask in.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List the escalation queue.
    Escalations {
        /// Include answered and declined escalations.
        #[arg(long)]
        all: bool,
    },
    /// Answer an escalation and save the answer as agent knowledge.
    Answer {
        escalation_id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// public, friends or intimate. Defaults to escalation.default_layer.
        #[arg(long)]
        layer: Option<Layer>,
    },
    /// Decline an escalation. This cannot be undone.
    Decline {
        escalation_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match murmur_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            murmur_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.client.log_level);

    if let Err(e) = run(cli.command, config).await {
        report(&e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: MurmurConfig) -> Result<(), MurmurError> {
    if let Commands::Config = command {
        println!("{}", render_config(&config)?);
        return Ok(());
    }

    let credentials = CredentialManager::from_config(&config.auth);
    let backend = HttpBackend::new(&config.api, credentials)?;
    let client = ConversationClient::new(Arc::new(backend), &config);

    let result = match command {
        Commands::Conversations { category, search } => {
            conversations::list(&client, category, search.as_deref()).await
        }
        Commands::Start { agent_id } => conversations::start(&client, &AgentId::from(agent_id)).await,
        Commands::History { conversation_id } => {
            conversations::history(&client, &ConversationId::from(conversation_id)).await
        }
        Commands::Chat {
            conversation_id,
            message,
        } => chat::run(&client, &ConversationId::from(conversation_id), &message.join(" ")).await,
        Commands::Ask {
            agent_id,
            message,
            conversation,
        } => {
            conversations::ask(
                &client,
                &AgentId::from(agent_id),
                conversation.map(ConversationId::from).as_ref(),
                &message.join(" "),
            )
            .await
        }
        Commands::Escalations { all } => escalations::list(&client, all).await,
        Commands::Answer {
            escalation_id,
            text,
            layer,
        } => {
            escalations::answer(&client, &EscalationId::from(escalation_id), text.join(" "), layer)
                .await
        }
        Commands::Decline { escalation_id, yes } => {
            escalations::decline(&client, &EscalationId::from(escalation_id), yes).await
        }
        Commands::Config => Ok(()),
    };

    client.shutdown().await;
    result
}

/// Prints an error the way the user should read it.
fn report(error: &MurmurError) {
    match error.kind() {
        ErrorKind::Authentication => {
            eprintln!("murmur: not logged in ({error}). Set auth.token or MURMUR_AUTH_TOKEN.");
        }
        ErrorKind::Cancellation => eprintln!("murmur: canceled"),
        ErrorKind::PartialWorkflow => {
            eprintln!("murmur: {error}");
            if let MurmurError::PartialWorkflow {
                knowledge_id: Some(id),
                ..
            } = error
            {
                eprintln!("murmur: knowledge {id} was kept; retry marking the escalation answered");
            }
        }
        ErrorKind::Transport if error.is_retryable() => {
            eprintln!("murmur: {error}. Try again.");
        }
        _ => eprintln!("murmur: {error}"),
    }
}

/// Serializes the configuration as TOML with the token redacted.
fn render_config(config: &MurmurConfig) -> Result<String, MurmurError> {
    let mut shown = config.clone();
    if shown.auth.token.is_some() {
        shown.auth.token = Some("<redacted>".to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| MurmurError::Internal(format!("failed to render configuration: {e}")))
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so streamed replies on stdout stay clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,murmur={log_level},murmur_api={log_level},murmur_cache={log_level},\
             murmur_client={log_level},murmur_directory={log_level},\
             murmur_escalation={log_level},murmur_stream={log_level},murmur_timeline={log_level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
