//! Discord bot with cached per-guild command prefixes.
//!
//! Each guild can pick its own command prefix. Prefixes live in a settings
//! store and are looked up through a TTL cache so that message handling does
//! not hit the store for every message.
//!
//! - [`PrefixResolver`] resolves and changes guild prefixes
//! - [`Command`] and [`execute`] implement the built-in commands
//! - [`JihyeConfig`] loads layered configuration
//! - `JihyeBot` connects everything to Discord (feature `discord`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod commands;
mod config;
mod prefix;

#[cfg(feature = "discord")]
mod discord;

pub use commands::{
    Command, CommandContext, CommandError, CommandErrorKind, CommandResult, describe_parse_error,
    execute,
};
pub use config::{BotConfig, JihyeConfig, SettingsConfig};
pub use prefix::{Invocation, PrefixChange, PrefixResolver, strip_prefix};

#[cfg(feature = "discord")]
pub use discord::{DiscordError, DiscordErrorKind, DiscordResult, JihyeBot, JihyeHandler};
