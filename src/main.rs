use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datachat::config::Config;
use datachat::engine::ChatEngine;
use datachat::index::Embedder;
use datachat::session::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "datachat", about = "Chat with tabular and JSON data through an LLM")]
struct Cli {
    /// Dataset to load at startup (.xlsx or .json)
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Use deterministic stub embeddings instead of downloading a model
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the TUI.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datachat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if cli.offline {
        config.embedding.offline_stub = true;
    }
    info!(
        model = %config.llm.model,
        embedding_model = %config.embedding.model,
        "configuration loaded"
    );

    // The embedding model is loaded exactly once and shared read-only by
    // every session for the process lifetime.
    let embedder = Arc::new(Embedder::load(
        &config.embedding.model,
        config.embedding.offline_stub,
    ));

    let sessions = SessionStore::new();
    let engine = Arc::new(ChatEngine::new(config.clone(), embedder, sessions));

    datachat::tui::run(&config, engine, cli.data).await
}
