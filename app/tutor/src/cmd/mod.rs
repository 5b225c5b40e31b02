//! CLI argument parsing and command dispatch.

use crate::{
    config::{self, RemoteConfig, RemoteKind, TutorConfig},
    mcp::McpServer,
    orchestrator::Orchestrator,
    persona::Phase,
    repl::ChatRepl,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm::Client;
use ollama::Ollama;
use openai::OpenAI;
use router::{HybridRouter, NetworkProbe};
use std::{path::PathBuf, sync::Arc};

pub mod config_cmd;
pub mod probe;

/// Bandwidth-adaptive AI tutor.
#[derive(Parser, Debug)]
#[command(name = "haka", about = "Bandwidth-adaptive AI tutor")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Config file path.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Phase to start the session in.
    #[arg(long, global = true)]
    pub phase: Option<Phase>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive tutoring session.
    Chat,
    /// Send one message and print the reply.
    Send {
        /// Message content.
        content: String,
    },
    /// Measure network throughput and show the profile it selects.
    Probe,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Print the config file path in use.
    Path,
}

impl Cli {
    /// Run the parsed command.
    pub async fn run(self) -> Result<()> {
        let config = config::resolve_config(self.config.as_deref())?;
        let client = Client::new();
        match self.command {
            Command::Chat => {
                let session = session(&config, client, self.phase).await?;
                ChatRepl::new(session)?.run().await
            }
            Command::Send { content } => {
                let mut session = session(&config, client, self.phase).await?;
                let outcome = session.turn(&content).await?;
                println!("{}", outcome.reply.text);
                if let Some(phase) = outcome.transition {
                    eprintln!("[handoff -> {phase}]");
                }
                Ok(outcome.reply.outcome?)
            }
            Command::Probe => probe::run(&config, client).await,
            Command::Config { action } => config_cmd::run(&action, &config, self.config.as_deref()),
        }
    }
}

/// Build a session from configuration.
///
/// Tool servers that cannot be reached are skipped with a warning.
pub async fn session(
    config: &TutorConfig,
    client: Client,
    phase: Option<Phase>,
) -> Result<Orchestrator<OpenAI, Ollama>> {
    let remote = remote(&client, &config.remote)?;
    let local = Ollama::new(
        client.clone(),
        &config.local.host,
        config.local.port,
        &config.local.model,
    )
    .with_tuning(config.local.tuning.clone());
    let probe = NetworkProbe::http(client.clone(), &config.network)?;
    let policy = config.policy.build()?;

    let router = HybridRouter::new(remote, local, probe, policy, config.router.clone());
    let mut session = Orchestrator::new(router, config.personas.clone());
    for server in tool_servers(config).await {
        session = session.with_mcp(&server);
    }
    if config.safety.enabled {
        session = session.with_safety(config.safety.clone());
    }
    if let Some(phase) = phase {
        session.set_phase(phase);
    }
    Ok(session)
}

/// The remote backend, or `None` without an API key.
fn remote(client: &Client, config: &RemoteConfig) -> Result<Option<OpenAI>> {
    let key = config.api_key.trim();
    if key.is_empty() {
        tracing::info!("no remote api key configured, running on the local backend only");
        return Ok(None);
    }

    let remote = match (&config.base_url, config.provider) {
        (Some(endpoint), _) => OpenAI::custom(client.clone(), key, endpoint, &config.model),
        (None, RemoteKind::OpenAI) => OpenAI::api(client.clone(), key, &config.model),
        (None, RemoteKind::Gemini) => OpenAI::gemini(client.clone(), key, &config.model),
        (None, RemoteKind::Custom) => {
            anyhow::bail!("remote.base_url is required for the custom provider")
        }
    }
    .context("failed to build the remote backend")?;
    Ok(Some(remote))
}

/// Connect the configured MCP tool servers.
async fn tool_servers(config: &TutorConfig) -> Vec<Arc<McpServer>> {
    let mut servers = Vec::new();
    if config.content.enabled {
        let content = &config.content;
        let server =
            McpServer::connect("content", &content.url, content.timeout(), content.attempts).await;
        match server {
            Ok(server) => servers.push(Arc::new(server)),
            Err(e) => tracing::warn!("content tools unavailable: {e}"),
        }
    }
    if config.search.enabled() {
        let search = &config.search;
        let server =
            McpServer::connect("search", &search.endpoint(), search.timeout(), search.attempts)
                .await;
        match server {
            Ok(server) => servers.push(Arc::new(server)),
            Err(e) => {
                let error = e.to_string().replace(search.api_key.trim(), "****");
                tracing::warn!("web search unavailable: {error}");
            }
        }
    }
    servers
}
