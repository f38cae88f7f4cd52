//! Jihye Discord bot.

use clap::Parser;
use jihye_bot::{JihyeBot, JihyeConfig, PrefixResolver};
use jihye_settings::{JsonFileSettingsStore, SettingsManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Discord bot with per-guild command prefixes.
#[derive(Debug, Parser)]
#[command(name = "jihye", version, about)]
struct Args {
    /// Configuration file (defaults to the layered lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Discord bot token
    #[arg(short, long, env = "DISCORD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Load configuration and settings, then exit without connecting
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,serenity=warn")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => JihyeConfig::from_file(path)?,
        None => JihyeConfig::load()?,
    };
    info!(
        default_prefix = %config.bot().default_prefix(),
        cache_enabled = config.prefix_cache().enabled(),
        ttl_secs = config.prefix_cache().ttl_secs(),
        "Configuration loaded"
    );

    let store = JsonFileSettingsStore::open(config.settings().path()).await?;
    info!(
        path = %store.path().display(),
        guilds = store.len().await,
        "Settings store opened"
    );

    let settings = SettingsManager::new(
        Arc::new(store),
        config.bot().default_prefix().clone(),
        *config.bot().max_prefix_len(),
    );
    let resolver = Arc::new(
        PrefixResolver::new(Arc::new(settings), config.prefix_cache().clone())
            .with_mention_prefix(*config.bot().mention_prefix()),
    );

    if args.check {
        println!("Configuration OK");
        return Ok(());
    }

    let token = args.token.ok_or(
        "Discord token not provided. Use --token or set DISCORD_TOKEN environment variable",
    )?;

    let _sweeper = resolver.spawn_sweeper();

    let mut bot = JihyeBot::new(token, resolver).await?;
    bot.start().await?;

    Ok(())
}
