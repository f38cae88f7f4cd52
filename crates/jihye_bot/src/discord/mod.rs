//! Discord integration.
//!
//! Gateway, REST and rate limiting are all serenity's; this module only
//! connects incoming messages to the prefix resolver and the built-in
//! commands.
//!
//! - **client**: serenity client setup and lifecycle
//! - **handler**: `EventHandler` that resolves prefixes and answers commands
//! - **error**: Discord-specific error types
//!
//! # Usage
//!
//! Available with the `discord` feature.
//!
//! ```rust,ignore
//! let resolver = Arc::new(PrefixResolver::new(settings, config.prefix_cache().clone()));
//! let mut bot = JihyeBot::new(token, resolver).await?;
//! bot.start().await?;
//! ```

mod client;
mod error;
mod handler;

pub use client::JihyeBot;
pub use error::{DiscordError, DiscordErrorKind, DiscordResult};
pub use handler::JihyeHandler;
