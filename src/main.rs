//! cobiebot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use cobiebot::messaging::{DiscordAdapter, MessagingDyn};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cobiebot")]
#[command(about = "Persona-driven Discord relay with periodic posts to X")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal; real environment variables still apply.
    let dotenv_result = dotenvy::dotenv();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Ok(path) = dotenv_result {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    tracing::info!("starting cobiebot");

    let config = if let Some(config_path) = cli.config {
        cobiebot::config::Config::load_from_path(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        cobiebot::config::Config::load().context("failed to load configuration from environment")?
    };

    tracing::info!(persona = %config.persona.name, "configuration loaded");

    let knowledge = Arc::new(cobiebot::knowledge::KnowledgeBase::load(&config.knowledge).await);

    let composer =
        cobiebot::prompts::PromptComposer::new(knowledge.clone(), config.persona.name.clone())
            .context("failed to initialize prompt composer")?;
    let completer = cobiebot::llm::CompletionClient::new(&config.completion)
        .context("failed to initialize completion client")?;

    let discord: Arc<dyn MessagingDyn> = Arc::new(DiscordAdapter::new(config.discord.token.clone()));
    let inbound = discord
        .start()
        .await
        .context("failed to start discord adapter")?;

    let relay = Arc::new(cobiebot::relay::ChatRelay::new(
        config.persona.name.clone(),
        composer,
        completer,
        discord.clone(),
    ));

    let publisher_handle = match (&config.twitter, config.publisher.enabled) {
        (Some(twitter), true) => {
            let feed = Arc::new(
                cobiebot::social::TwitterClient::new(twitter.clone())
                    .context("failed to initialize X client")?,
            );
            let publisher = cobiebot::publisher::PeriodicPublisher::new(
                knowledge.clone(),
                feed,
                config.publisher.interval,
            );
            Some(publisher.start())
        }
        _ => {
            tracing::info!("periodic publisher disabled");
            None
        }
    };

    tracing::info!("cobiebot started");

    let outcome = tokio::select! {
        _ = relay.run(inbound) => {
            Err(anyhow::anyhow!("discord gateway disconnected"))
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    };

    tracing::info!("shutting down");
    if let Some(handle) = publisher_handle {
        handle.abort();
    }
    if let Err(error) = discord.shutdown().await {
        tracing::warn!(%error, "discord shutdown failed");
    }

    tracing::info!("cobiebot stopped");
    outcome
}
