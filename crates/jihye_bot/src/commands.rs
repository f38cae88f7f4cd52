//! Built-in commands.
//!
//! Only the commands needed to inspect and change the guild prefix live here;
//! anything richer belongs to the host framework.

use crate::{Invocation, PrefixResolver};
use derive_more::{Display, Error};
use jihye_cache::Clock;
use jihye_error::{JihyeError, SettingsErrorKind};
use jihye_settings::Setting;
use tracing::{error, instrument};

/// Result type for command parsing.
pub type CommandResult<T> = Result<T, CommandError>;

/// Specific command error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum CommandErrorKind {
    /// Missing required argument.
    #[display("Missing required argument '{}' for command '{}'", arg_name, command)]
    MissingArgument {
        /// Command being parsed
        command: String,
        /// Name of the missing argument
        arg_name: String,
    },

    /// The named setting does not exist.
    #[display("Unknown setting '{}'", _0)]
    UnknownSetting(String),
}

/// Command error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Command Error: {} at line {} in {}", kind, line, file)]
pub struct CommandError {
    /// The kind of error that occurred
    pub kind: CommandErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CommandError {
    /// Create a new command error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CommandErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// A parsed built-in command.
#[derive(Debug, Clone, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    /// Liveness check
    Ping,
    /// Show the prefix in effect
    Prefix,
    /// Show the guild's settings
    Settings,
    /// Change a guild setting
    Set {
        /// Setting to change
        setting: Setting,
        /// Requested value
        value: String,
    },
    /// Drop the guild's custom settings
    Reset,
    /// List commands
    Help,
}

impl Command {
    /// Parse an invocation into a command.
    ///
    /// Returns `Ok(None)` for names that are not built-in commands; those are
    /// ignored rather than answered.
    ///
    /// # Errors
    ///
    /// `MissingArgument` or `UnknownSetting` for malformed `set` invocations.
    pub fn parse(invocation: &Invocation) -> CommandResult<Option<Self>> {
        let command = match invocation.command.as_str() {
            "ping" => Self::Ping,
            "prefix" => Self::Prefix,
            "help" => Self::Help,
            "set" | "config" | "settings" => Self::parse_set(invocation)?,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    fn parse_set(invocation: &Invocation) -> CommandResult<Self> {
        let Some(name) = invocation.args.first() else {
            return Ok(Self::Settings);
        };
        if name.eq_ignore_ascii_case("reset") {
            return Ok(Self::Reset);
        }

        let setting = Setting::parse(name)
            .map_err(|_| CommandError::new(CommandErrorKind::UnknownSetting(name.clone())))?;
        let value = invocation.args.get(1).cloned().ok_or_else(|| {
            CommandError::new(CommandErrorKind::MissingArgument {
                command: format!("set {}", setting),
                arg_name: "value".to_string(),
            })
        })?;

        Ok(Self::Set { setting, value })
    }
}

/// Where a command was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Guild the message came from, `None` in DMs
    pub guild_id: Option<u64>,
    /// Prefix as typed by the user
    pub prefix_used: String,
}

/// Reply text for a parse failure.
pub fn describe_parse_error(err: &CommandError, prefix: &str) -> String {
    match &err.kind {
        CommandErrorKind::MissingArgument { command, arg_name } => {
            format!("Usage: `{}{} <{}>`", prefix, command, arg_name)
        }
        CommandErrorKind::UnknownSetting(name) => {
            format!("`{}` is not a setting. Try `{}set prefix <new>`.", name, prefix)
        }
    }
}

fn describe_failure(err: &JihyeError) -> String {
    match err.as_settings().map(|s| &s.kind) {
        Some(SettingsErrorKind::InvalidValue(reason)) => {
            format!("That prefix can't be used: {}.", reason)
        }
        _ => {
            error!(error = %err, "Command failed");
            "Something went wrong, try again later.".to_string()
        }
    }
}

/// Run a command and produce the reply text.
#[instrument(skip(command, resolver), fields(command = command.as_ref()))]
pub async fn execute<C: Clock>(
    command: &Command,
    ctx: &CommandContext,
    resolver: &PrefixResolver<C>,
) -> String {
    match command {
        Command::Ping => "Pong!".to_string(),
        Command::Help => {
            let p = &ctx.prefix_used;
            format!(
                "**Commands**\n\
                 `{p}ping` - check that I'm alive\n\
                 `{p}prefix` - show the prefix here\n\
                 `{p}set` - show this server's settings\n\
                 `{p}set prefix <new>` - change the prefix\n\
                 `{p}set reset` - go back to the default prefix"
            )
        }
        Command::Prefix => {
            let prefix = resolver.resolve(ctx.guild_id).await;
            format!("My prefix here is `{}`", prefix)
        }
        Command::Settings => match ctx.guild_id {
            None => format!(
                "Settings are per server. My prefix in DMs is `{}`",
                resolver.default_prefix()
            ),
            Some(guild_id) => {
                let prefix = resolver.resolve(Some(guild_id)).await;
                format!(
                    "**Settings for this server**\nprefix: `{}`\nUse `{}set prefix <new>` to change it.",
                    prefix, prefix
                )
            }
        },
        Command::Set { setting, value } => {
            let Some(guild_id) = ctx.guild_id else {
                return "Settings can only be changed in a server.".to_string();
            };
            match setting {
                Setting::Prefix => match resolver.set_prefix(guild_id, value).await {
                    Ok(change) => format!(
                        "Prefix was changed from `{}` to `{}`",
                        change.previous, change.current
                    ),
                    Err(e) => describe_failure(&e),
                },
            }
        }
        Command::Reset => {
            let Some(guild_id) = ctx.guild_id else {
                return "Settings can only be changed in a server.".to_string();
            };
            match resolver.reset_prefix(guild_id).await {
                Ok(true) => format!(
                    "Prefix was reset to `{}`",
                    resolver.default_prefix()
                ),
                Ok(false) => "This server has no custom settings.".to_string(),
                Err(e) => describe_failure(&e),
            }
        }
    }
}
