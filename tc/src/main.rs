//! TaskChat - conversational task scheduler
//!
//! CLI entry point: interactive chat or single-shot message handling.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use taskchat::assist::AssistAdapter;
use taskchat::cli::{Cli, Command};
use taskchat::config::Config;
use taskchat::engine::{ChatEngine, SlotPolicy};
use taskchat::llm;
use taskchat::repl::ChatRepl;
use taskchat::session::MemorySessionStore;

use calstore::MemoryStore;

fn setup_logging(verbose: bool) -> Result<()> {
    // Write logs to a file so the interactive chat stays clean
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskchat")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("taskchat.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

/// Wire the generative assist if it is enabled and reachable
///
/// A missing API key downgrades to the deterministic pipeline instead of
/// refusing to start.
fn build_assist(config: &Config) -> Option<AssistAdapter> {
    if !config.assist.enabled {
        info!("Generative assist disabled by config");
        return None;
    }

    match llm::create_client(&config.llm) {
        Ok(client) => Some(AssistAdapter::new(
            client,
            Duration::from_secs(config.assist.timeout_secs),
            config.assist.max_tokens,
        )),
        Err(e) => {
            warn!(error = %e, "Assist unavailable, falling back to deterministic extraction");
            None
        }
    }
}

fn build_engine(config: &Config) -> (Arc<ChatEngine>, Arc<MemoryStore>) {
    let sessions = Arc::new(MemorySessionStore::new());
    let store = Arc::new(MemoryStore::new());
    let assist = build_assist(config);
    let engine = ChatEngine::new(sessions, store.clone(), assist, SlotPolicy::from(&config.slots));
    (Arc::new(engine), store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "TaskChat loaded config: provider={}, model={}, assist={}",
        config.llm.provider, config.llm.model, config.assist.enabled
    );

    match cli.command {
        Some(Command::Send { user, text, json }) => {
            let (engine, _store) = build_engine(&config);
            let reply = engine.handle(&user, &text).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", reply.message);
            }
            if !reply.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Chat { user }) => {
            let (engine, store) = build_engine(&config);
            ChatRepl::new(engine, store, user).run().await
        }
        None => {
            let (engine, store) = build_engine(&config);
            ChatRepl::new(engine, store, "local").run().await
        }
    }
}
