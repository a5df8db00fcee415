//! SoundSwap bot - trending topics to finished blog posts, inside Discord.
//!
//! Serves Discord interactions, posts the daily scout report and manages
//! the application's commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use soundswap_bot::ai::provider_from_config;
use soundswap_bot::core::scout::{run_daily_scout, CHUNK_PAUSE};
use soundswap_bot::core::{Config, SessionStore, TopicFetcher, Workflow};
use soundswap_bot::integrations::{
    default_commands, serve, ApiState, DiscordClient, SerpApiClient, SignatureVerifier,
};

/// Trending topics to finished blog posts, inside Discord
#[derive(Parser)]
#[command(name = "soundswap-bot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./soundswap.toml, then the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interaction server (default)
    Serve {
        /// Port to listen on, overriding the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Post today's topic report to the configured channel and exit
    Scout,

    /// Replace the application's Discord commands
    Register,

    /// Show the effective configuration with secrets masked
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional
    let _ = dotenvy::dotenv();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    match cli.command {
        None => cmd_serve(cli.config, None),
        Some(Commands::Serve { port }) => cmd_serve(cli.config, port),
        Some(Commands::Scout) => cmd_scout(cli.config),
        Some(Commands::Register) => cmd_register(cli.config),
        Some(Commands::Config { path }) => cmd_config(cli.config, path),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_with_env(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load(),
    }
}

/// Run the HTTP service.
fn cmd_serve(config_path: Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let search = Arc::new(SerpApiClient::from_config(&config.search)?);
    let ai = provider_from_config(&config.ai)?;
    let messenger = Arc::new(DiscordClient::new(&config.discord)?);
    let sessions = Arc::new(SessionStore::new(config.session.ttl()));

    let verifier = match config.discord.public_key.as_deref() {
        Some(key) => Some(SignatureVerifier::from_hex(key)?),
        None => {
            tracing::warn!("DISCORD_PUBLIC_KEY not set, interactions will be refused");
            None
        }
    };

    let workflow = Workflow::new(search, ai, messenger, Arc::clone(&sessions), &config);
    let state = Arc::new(ApiState::new(workflow, verifier, config.discord.chunk_size));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let _sweeper = sessions.spawn_sweeper(config.session.sweep_interval());
        serve(&config.server, state).await
    })
}

/// Post the daily report once.
fn cmd_scout(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let search = Arc::new(SerpApiClient::from_config(&config.search)?);
    let fetcher = TopicFetcher::new(search, &config.search);
    let messenger = DiscordClient::new(&config.discord)?;

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(run_daily_scout(
        &fetcher,
        &messenger,
        config.discord.chunk_size,
        CHUNK_PAUSE,
    ))?;

    println!(
        "Posted {} topic(s) in {} message(s) at {}",
        summary.topics,
        summary.chunks_sent,
        summary.timestamp.to_rfc3339()
    );
    Ok(())
}

/// Replace the application's commands.
fn cmd_register(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = DiscordClient::new(&config.discord)?;

    let rt = tokio::runtime::Runtime::new()?;
    let results = rt.block_on(client.register_commands(&default_commands()))?;

    let mut failed = 0;
    for (name, outcome) in &results {
        match outcome {
            Ok(()) => println!("✅ Registered {name}"),
            Err(e) => {
                failed += 1;
                println!("❌ Failed to register {name}: {e}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} command(s) failed to register");
    }
    Ok(())
}

/// Show configuration.
fn cmd_config(config_path: Option<PathBuf>, show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    let toml = toml::to_string_pretty(&config.redacted())?;
    println!("{toml}");

    Ok(())
}
