//! In-memory settings store.

use crate::{GuildSettings, SettingsStore};
use async_trait::async_trait;
use jihye_error::{JihyeResult, SettingsError, SettingsErrorKind};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Settings held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    guilds: RwLock<HashMap<u64, GuildSettings>>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = GuildSettings>) -> Self {
        let guilds = records
            .into_iter()
            .map(|settings| (settings.guild_id, settings))
            .collect();
        Self {
            guilds: RwLock::new(guilds),
        }
    }

    /// Number of stored guild records.
    pub async fn len(&self) -> usize {
        self.guilds.read().await.len()
    }

    /// Check if no guild records are stored.
    pub async fn is_empty(&self) -> bool {
        self.guilds.read().await.is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn fetch(&self, guild_id: u64) -> JihyeResult<Option<GuildSettings>> {
        Ok(self.guilds.read().await.get(&guild_id).cloned())
    }

    async fn upsert(&self, settings: GuildSettings) -> JihyeResult<()> {
        self.guilds
            .write()
            .await
            .insert(settings.guild_id, settings);
        Ok(())
    }

    async fn remove(&self, guild_id: u64) -> JihyeResult<()> {
        match self.guilds.write().await.remove(&guild_id) {
            Some(_) => Ok(()),
            None => Err(SettingsError::new(SettingsErrorKind::NotFound(guild_id)).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
