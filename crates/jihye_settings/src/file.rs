//! JSON-file settings store.
//!
//! The whole document is loaded once at open and mirrored in memory; reads
//! never touch the disk. Every mutation rewrites the file through a temp
//! file + rename so a crash mid-write leaves the previous document intact.

use crate::{GuildSettings, SettingsStore};
use async_trait::async_trait;
use jihye_error::{JihyeResult, SettingsError, SettingsErrorKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Settings persisted as a JSON array of [`GuildSettings`].
///
/// ```json
/// [
///   { "guild_id": 123456789012345678, "prefix": "!" }
/// ]
/// ```
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    guilds: RwLock<HashMap<u64, GuildSettings>>,
}

impl JsonFileSettingsStore {
    /// Open the store at `path`, loading existing records.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the file exists but cannot be read, `Serialization`
    /// if it is not a valid settings document.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> JihyeResult<Self> {
        let path = path.as_ref().to_path_buf();

        let guilds = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::decode(&path, &contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Settings file not found, starting empty");
                HashMap::new()
            }
            Err(e) => {
                return Err(SettingsError::new(SettingsErrorKind::Unavailable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };

        tracing::info!(guilds = guilds.len(), "Loaded guild settings");
        Ok(Self {
            path,
            guilds: RwLock::new(guilds),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored guild records.
    pub async fn len(&self) -> usize {
        self.guilds.read().await.len()
    }

    /// Check if no guild records are stored.
    pub async fn is_empty(&self) -> bool {
        self.guilds.read().await.is_empty()
    }

    fn decode(path: &Path, contents: &str) -> JihyeResult<HashMap<u64, GuildSettings>> {
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        let records: Vec<GuildSettings> = serde_json::from_str(contents).map_err(|e| {
            SettingsError::new(SettingsErrorKind::Serialization(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(records
            .into_iter()
            .map(|settings| (settings.guild_id, settings))
            .collect())
    }

    /// Write `guilds` to disk atomically.
    async fn persist(&self, guilds: &HashMap<u64, GuildSettings>) -> JihyeResult<()> {
        let mut records: Vec<&GuildSettings> = guilds.values().collect();
        records.sort_by_key(|settings| settings.guild_id);

        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| SettingsError::new(SettingsErrorKind::Serialization(e.to_string())))?;

        let unavailable = |e: std::io::Error| {
            SettingsError::new(SettingsErrorKind::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        tokio::fs::write(&temp_path, json).await.map_err(unavailable)?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(unavailable)?;

        tracing::debug!(
            path = %self.path.display(),
            guilds = records.len(),
            "Persisted guild settings"
        );
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn fetch(&self, guild_id: u64) -> JihyeResult<Option<GuildSettings>> {
        Ok(self.guilds.read().await.get(&guild_id).cloned())
    }

    #[tracing::instrument(skip(self, settings), fields(guild_id = settings.guild_id))]
    async fn upsert(&self, settings: GuildSettings) -> JihyeResult<()> {
        // Holding the write lock across the disk write serializes writers
        let mut guilds = self.guilds.write().await;
        let mut updated = guilds.clone();
        updated.insert(settings.guild_id, settings);

        self.persist(&updated).await?;
        *guilds = updated;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, guild_id: u64) -> JihyeResult<()> {
        let mut guilds = self.guilds.write().await;
        if !guilds.contains_key(&guild_id) {
            return Err(SettingsError::new(SettingsErrorKind::NotFound(guild_id)).into());
        }
        let mut updated = guilds.clone();
        updated.remove(&guild_id);

        self.persist(&updated).await?;
        *guilds = updated;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "json_file"
    }
}
