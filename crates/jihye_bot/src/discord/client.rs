//! Discord bot client setup and lifecycle management.

use super::{DiscordError, DiscordErrorKind, DiscordResult, handler::JihyeHandler};
use crate::PrefixResolver;
use serenity::Client;
use std::sync::Arc;
use tracing::{info, instrument};

/// Discord client for Jihye.
///
/// # Example
/// ```no_run
/// use jihye_bot::{JihyeBot, PrefixResolver};
/// use jihye_cache::PrefixCacheConfig;
/// use jihye_settings::{MemorySettingsStore, SettingsManager};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = std::env::var("DISCORD_TOKEN")?;
///     let settings = SettingsManager::new(Arc::new(MemorySettingsStore::new()), "?", 2);
///     let resolver = PrefixResolver::new(Arc::new(settings), PrefixCacheConfig::default());
///
///     let mut bot = JihyeBot::new(token, Arc::new(resolver)).await?;
///     bot.start().await?;
///     Ok(())
/// }
/// ```
pub struct JihyeBot {
    client: Client,
    resolver: Arc<PrefixResolver>,
}

impl JihyeBot {
    /// Create a new bot.
    ///
    /// # Arguments
    /// * `token` - Discord bot token from the Discord Developer Portal
    /// * `resolver` - Prefix resolver shared with the event handler
    ///
    /// # Errors
    /// Returns an error if the token is empty or the Serenity client fails to
    /// initialize.
    #[instrument(skip(token, resolver), fields(token_len = token.len()))]
    pub async fn new(token: String, resolver: Arc<PrefixResolver>) -> DiscordResult<Self> {
        info!("Initializing Jihye Discord bot");

        if token.trim().is_empty() {
            return Err(DiscordError::new(DiscordErrorKind::InvalidToken));
        }

        let handler = JihyeHandler::new(resolver.clone());
        let intents = JihyeHandler::intents();

        info!("Building Serenity client with intents: {:?}", intents);

        let client = Client::builder(&token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| {
                DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                    "Failed to build client: {}",
                    e
                )))
            })?;

        info!("Serenity client built successfully");

        Ok(Self { client, resolver })
    }

    /// Start the bot.
    ///
    /// Blocks until the client shuts down.
    ///
    /// # Errors
    /// Returns an error if the client fails to start or hits a fatal error.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> DiscordResult<()> {
        info!("Starting Discord bot");

        self.client.start().await?;

        Ok(())
    }

    /// The prefix resolver answering this bot's messages.
    pub fn resolver(&self) -> &Arc<PrefixResolver> {
        &self.resolver
    }
}
