//! Setting names and the stored per-guild record.

use jihye_error::{SettingsError, SettingsErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A guild setting that can be changed through the `set` command.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Setting {
    /// Command prefix used in the guild
    #[strum(to_string = "prefix", serialize = "p")]
    Prefix,
}

impl Setting {
    /// Parse a setting name as typed by a user.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` for names that are not settings.
    ///
    /// ```
    /// use jihye_settings::Setting;
    ///
    /// assert_eq!(Setting::parse("Prefix").unwrap(), Setting::Prefix);
    /// assert!(Setting::parse("colour").is_err());
    /// ```
    #[track_caller]
    pub fn parse(name: &str) -> Result<Self, SettingsError> {
        Self::from_str(name)
            .map_err(|_| SettingsError::new(SettingsErrorKind::InvalidSetting(name.to_string())))
    }
}

/// Stored settings document for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildSettings {
    /// Discord guild snowflake
    pub guild_id: u64,
    /// Command prefix
    pub prefix: String,
}

impl GuildSettings {
    /// Settings record for `guild_id` with the given prefix.
    pub fn new(guild_id: u64, prefix: impl Into<String>) -> Self {
        Self {
            guild_id,
            prefix: prefix.into(),
        }
    }
}
