//! Bot configuration.
//!
//! Configuration is layered with the `config` crate, later sources overriding
//! earlier ones:
//! 1. Bundled defaults (`jihye.toml` shipped with the crate)
//! 2. User config in the home directory (`~/.config/jihye/jihye.toml`)
//! 3. User config in the current directory (`./jihye.toml`)
//! 4. Environment variables (`JIHYE__BOT__DEFAULT_PREFIX`, ...)
//!
//! The Discord token is deliberately not part of this file; it comes from
//! the command line or `DISCORD_TOKEN`.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use jihye_cache::PrefixCacheConfig;
use jihye_error::{ConfigError, JihyeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../jihye.toml");

/// Prefix handling options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct BotConfig {
    /// Prefix for DMs and guilds without a stored prefix
    #[serde(default = "default_prefix")]
    default_prefix: String,

    /// Longest accepted guild prefix, in characters
    #[serde(default = "default_max_prefix_len")]
    max_prefix_len: usize,

    /// Whether mentioning the bot works as a prefix
    #[serde(default = "default_mention_prefix")]
    mention_prefix: bool,
}

fn default_prefix() -> String {
    "?".to_string()
}

fn default_max_prefix_len() -> usize {
    2
}

fn default_mention_prefix() -> bool {
    true
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_prefix: default_prefix(),
            max_prefix_len: default_max_prefix_len(),
            mention_prefix: default_mention_prefix(),
        }
    }
}

/// Settings store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SettingsConfig {
    /// Path of the JSON settings document
    #[serde(default = "default_settings_path")]
    path: PathBuf,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// Top-level Jihye configuration.
///
/// # Example
///
/// ```no_run
/// use jihye_bot::JihyeConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = JihyeConfig::load()?;
/// println!("default prefix: {}", config.bot().default_prefix());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, Getters)]
pub struct JihyeConfig {
    /// Prefix handling
    #[serde(default)]
    bot: BotConfig,

    /// Prefix cache tuning
    #[serde(default)]
    prefix_cache: PrefixCacheConfig,

    /// Settings persistence
    #[serde(default)]
    settings: SettingsConfig,
}

impl JihyeConfig {
    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged result is invalid.
    #[instrument]
    pub fn load() -> JihyeResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/jihye/jihye.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("jihye").required(false))
            .add_source(
                Environment::with_prefix("JIHYE")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder)
    }

    /// Load bundled defaults overridden by a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the result is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> JihyeResult<Self> {
        debug!("Loading configuration from file");

        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));

        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> JihyeResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.bot.default_prefix;
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::new(
                "bot.default_prefix must be non-empty and contain no whitespace",
            ));
        }
        if self.bot.max_prefix_len == 0 {
            return Err(ConfigError::new("bot.max_prefix_len must be at least 1"));
        }
        if *self.prefix_cache.ttl_secs() == 0 {
            return Err(ConfigError::new("prefix_cache.ttl_secs must be at least 1"));
        }
        Ok(())
    }
}
