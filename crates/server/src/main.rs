//! crabdesk server entry point.
//!
//! Loads config, builds the retrieval index and the agents, and serves the
//! HTTP gateway until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crabdesk_agents::{BillingAgent, Orchestrator, Router, TechAgent};
use crabdesk_billing::RefundPolicy;
use crabdesk_config::AppConfig;
use crabdesk_core::CompletionService;
use crabdesk_gateway::GatewayState;
use crabdesk_providers::OpenAiCompatService;
use crabdesk_retrieval::{DocumentSource, FsDocumentSource, Retriever};
use crabdesk_storage::{BillingStore, ConversationStore};

#[derive(Parser)]
#[command(
    name = "crabdesk",
    about = "Multi-agent conversational support backend",
    version
)]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the gateway port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let api_key = config
        .completion
        .api_key
        .clone()
        .context("No API key configured; set OPENAI_API_KEY or CRABDESK_API_KEY")?;

    let completion: Arc<dyn CompletionService> = Arc::new(OpenAiCompatService::new(
        "openai",
        &config.completion.base_url,
        api_key,
        &config.completion.model,
    ));

    let docs: Arc<dyn DocumentSource> = Arc::new(FsDocumentSource::new(&config.docs_dir));
    let retriever = Arc::new(Retriever::from_source(docs.as_ref()));
    info!(
        docs_dir = %config.docs_dir.display(),
        chunks = retriever.chunk_count(),
        "Retrieval index ready"
    );

    let conversations = Arc::new(ConversationStore::new());
    let billing_store = Arc::new(BillingStore::with_seed_data());
    let policy = Arc::new(RefundPolicy::new(billing_store, docs));

    let orchestrator = Arc::new(Orchestrator::new(
        Router::new(completion.clone()),
        retriever,
        TechAgent::new(completion.clone()),
        BillingAgent::new(completion, policy),
        conversations,
    ));

    let router = crabdesk_gateway::build_router(Arc::new(GatewayState { orchestrator }));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, model = %config.completion.model, "crabdesk listening");

    axum::serve(listener, router)
        .await
        .context("Server exited with error")?;

    Ok(())
}
