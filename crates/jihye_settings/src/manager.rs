//! Validation and defaults over a settings store.

use crate::{GuildSettings, Setting, SettingsStore};
use jihye_error::{JihyeResult, SettingsError, SettingsErrorKind};
use std::sync::Arc;

/// Guild settings with defaults applied and values validated.
///
/// # Example
///
/// ```
/// use jihye_settings::{MemorySettingsStore, Setting, SettingsManager};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = SettingsManager::new(Arc::new(MemorySettingsStore::new()), "?", 2);
///
/// assert_eq!(manager.fetch_prefix(1).await?, "?");
///
/// manager.set(1, Setting::Prefix, "!").await?;
/// assert_eq!(manager.fetch_prefix(1).await?, "!");
/// # Ok(())
/// # }
/// ```
pub struct SettingsManager {
    store: Arc<dyn SettingsStore>,
    default_prefix: String,
    max_prefix_len: usize,
}

impl std::fmt::Debug for SettingsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsManager")
            .field("backend", &self.store.backend_name())
            .field("default_prefix", &self.default_prefix)
            .field("max_prefix_len", &self.max_prefix_len)
            .finish()
    }
}

impl SettingsManager {
    /// Create a manager over `store`.
    ///
    /// `default_prefix` is reported for guilds without a stored record;
    /// `max_prefix_len` bounds prefixes in characters.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        default_prefix: impl Into<String>,
        max_prefix_len: usize,
    ) -> Self {
        Self {
            store,
            default_prefix: default_prefix.into(),
            max_prefix_len,
        }
    }

    /// Prefix used when a guild has none stored.
    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Longest prefix accepted, in characters.
    pub fn max_prefix_len(&self) -> usize {
        self.max_prefix_len
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// Stored settings for the guild, or a default record when none exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures; a missing record is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_settings(&self, guild_id: u64) -> JihyeResult<GuildSettings> {
        let settings = self.store.fetch(guild_id).await?;
        Ok(settings.unwrap_or_else(|| GuildSettings::new(guild_id, self.default_prefix.clone())))
    }

    /// The guild's prefix, defaulted.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn fetch_prefix(&self, guild_id: u64) -> JihyeResult<String> {
        Ok(self.fetch_settings(guild_id).await?.prefix)
    }

    /// The guild's stored prefix, `None` if the guild never set one.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn custom_prefix(&self, guild_id: u64) -> JihyeResult<Option<String>> {
        Ok(self
            .store
            .fetch(guild_id)
            .await?
            .map(|settings| settings.prefix))
    }

    /// Check `value` for `setting`, returning the normalized value.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for an empty prefix, one containing whitespace, or one
    /// longer than the configured limit.
    #[track_caller]
    pub fn validate(&self, setting: Setting, value: &str) -> Result<String, SettingsError> {
        match setting {
            Setting::Prefix => {
                let prefix = value.trim();
                if prefix.is_empty() {
                    return Err(SettingsError::new(SettingsErrorKind::InvalidValue(
                        "prefix must not be empty".to_string(),
                    )));
                }
                if prefix.chars().any(char::is_whitespace) {
                    return Err(SettingsError::new(SettingsErrorKind::InvalidValue(
                        "prefix must not contain whitespace".to_string(),
                    )));
                }
                if prefix.chars().count() > self.max_prefix_len {
                    return Err(SettingsError::new(SettingsErrorKind::InvalidValue(format!(
                        "prefix is longer than {} characters",
                        self.max_prefix_len
                    ))));
                }
                Ok(prefix.to_string())
            }
        }
    }

    /// Change a setting for a guild, returning the previous value.
    ///
    /// # Errors
    ///
    /// `InvalidValue` when validation fails (nothing is written), otherwise
    /// store failures.
    #[tracing::instrument(skip(self))]
    pub async fn set(&self, guild_id: u64, setting: Setting, value: &str) -> JihyeResult<String> {
        let value = self.validate(setting, value)?;
        let mut settings = self.fetch_settings(guild_id).await?;

        let previous = match setting {
            Setting::Prefix => std::mem::replace(&mut settings.prefix, value),
        };

        self.store.upsert(settings).await?;
        tracing::info!(guild_id, %setting, previous = %previous, "Updated guild setting");
        Ok(previous)
    }

    /// Drop the guild's stored settings, returning whether any existed.
    ///
    /// # Errors
    ///
    /// Store failures other than a missing record.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self, guild_id: u64) -> JihyeResult<bool> {
        match self.store.remove(guild_id).await {
            Ok(()) => {
                tracing::info!(guild_id, "Reset guild settings");
                Ok(true)
            }
            Err(e)
                if e.as_settings()
                    .is_some_and(|s| matches!(s.kind, SettingsErrorKind::NotFound(_))) =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
