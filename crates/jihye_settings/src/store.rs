//! Settings storage trait.

use crate::GuildSettings;
use async_trait::async_trait;
use jihye_error::JihyeResult;

/// Storage backend for guild settings.
///
/// `fetch` distinguishes "no record" (`Ok(None)`) from "the store could not
/// answer" (`Err`), so callers can fall back on the former and report the
/// latter.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings for `guild_id`, if any.
    async fn fetch(&self, guild_id: u64) -> JihyeResult<Option<GuildSettings>>;

    /// Insert or replace the record for `settings.guild_id`.
    async fn upsert(&self, settings: GuildSettings) -> JihyeResult<()>;

    /// Remove the record for `guild_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record exists.
    async fn remove(&self, guild_id: u64) -> JihyeResult<()>;

    /// Backend name for logging.
    fn backend_name(&self) -> &str;
}
