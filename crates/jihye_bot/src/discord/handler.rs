//! Serenity event handler for the Jihye bot.
//!
//! Messages are matched against the guild's prefix (resolved through the
//! prefix cache) and answered with the built-in commands.

use crate::{Command, CommandContext, PrefixResolver, describe_parse_error, execute};
use serenity::all::Ready;
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::GatewayIntents;
use serenity::model::guild::{Guild, UnavailableGuild};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info};

/// Event handler for the Jihye Discord bot.
pub struct JihyeHandler {
    /// Prefix lookup shared with the rest of the process
    resolver: Arc<PrefixResolver>,
    /// Our own user ID, known after `ready`
    bot_id: OnceLock<u64>,
}

impl JihyeHandler {
    /// Create a handler answering commands through `resolver`.
    pub fn new(resolver: Arc<PrefixResolver>) -> Self {
        Self {
            resolver,
            bot_id: OnceLock::new(),
        }
    }

    /// Required gateway intents for the bot.
    ///
    /// Message content is a privileged intent and must be enabled in the
    /// Discord Developer Portal.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    /// The resolver used by this handler.
    pub fn resolver(&self) -> &Arc<PrefixResolver> {
        &self.resolver
    }

    /// Build the reply for a message, `None` when it is not for us.
    async fn reply_for(&self, content: &str, guild_id: Option<u64>) -> Option<String> {
        let bot_id = self.bot_id.get().copied();
        let invocation = self
            .resolver
            .match_invocation(content, guild_id, bot_id)
            .await?;

        let command = match Command::parse(&invocation) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!(command = %invocation.command, "Ignoring unknown command");
                return None;
            }
            Err(e) => return Some(describe_parse_error(&e, &invocation.prefix)),
        };

        let ctx = CommandContext {
            guild_id,
            prefix_used: invocation.prefix,
        };
        Some(execute(&command, &ctx, &self.resolver).await)
    }
}

#[async_trait]
impl EventHandler for JihyeHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "Bot connected to Discord"
        );

        // Reconnects deliver the same ID
        let _ = self.bot_id.set(ready.user.id.get());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let guild_id = msg.guild_id.map(|id| id.get());
        let Some(reply) = self.reply_for(&msg.content, guild_id).await else {
            return;
        };

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            error!(
                channel_id = %msg.channel_id,
                error = %e,
                "Failed to send reply"
            );
        }
    }

    /// Drop the cached prefix when the bot leaves a guild.
    async fn guild_delete(
        &self,
        _ctx: Context,
        incomplete: UnavailableGuild,
        _full: Option<Guild>,
    ) {
        if incomplete.unavailable {
            debug!(guild_id = %incomplete.id, "Guild outage, keeping cached prefix");
            return;
        }
        info!(guild_id = %incomplete.id, "Left guild");
        self.resolver.evict(incomplete.id.get());
    }
}
