//! Tests for prefix resolution through the prefix cache.

use async_trait::async_trait;
use jihye_bot::{Command, CommandContext, JihyeConfig, PrefixResolver, execute};
use jihye_cache::{ManualClock, PrefixCacheConfig, SharedTimedCache};
use jihye_error::{JihyeResult, SettingsError, SettingsErrorKind};
use jihye_settings::{GuildSettings, MemorySettingsStore, SettingsManager, SettingsStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// Memory store that counts fetches, can be switched off, and can hold one
/// fetch after it has read its record.
#[derive(Default)]
struct ProbeStore {
    inner: MemorySettingsStore,
    fetches: AtomicUsize,
    down: AtomicBool,
    hold_next_fetch: AtomicBool,
    fetch_held: Notify,
    release_fetch: Notify,
}

impl ProbeStore {
    /// Pause the next fetch between reading and returning.
    fn hold_next_fetch(&self) {
        self.hold_next_fetch.store(true, Ordering::SeqCst);
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> JihyeResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SettingsError::new(SettingsErrorKind::Unavailable(
                "database offline".to_string(),
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for ProbeStore {
    async fn fetch(&self, guild_id: u64) -> JihyeResult<Option<GuildSettings>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let record = self.inner.fetch(guild_id).await;
        if self.hold_next_fetch.swap(false, Ordering::SeqCst) {
            self.fetch_held.notify_one();
            self.release_fetch.notified().await;
        }
        record
    }

    async fn upsert(&self, settings: GuildSettings) -> JihyeResult<()> {
        self.check()?;
        self.inner.upsert(settings).await
    }

    async fn remove(&self, guild_id: u64) -> JihyeResult<()> {
        self.check()?;
        self.inner.remove(guild_id).await
    }

    fn backend_name(&self) -> &str {
        "probe"
    }
}

struct Fixture {
    store: Arc<ProbeStore>,
    clock: ManualClock,
    resolver: PrefixResolver<ManualClock>,
}

fn fixture_with(cache_config: PrefixCacheConfig) -> Fixture {
    let store = Arc::new(ProbeStore::default());
    let clock = ManualClock::new();
    let settings = SettingsManager::new(store.clone(), "?", 2);
    let resolver = PrefixResolver::with_cache(
        Arc::new(settings),
        cache_config,
        SharedTimedCache::with_clock(clock.clone()),
    );
    Fixture {
        store,
        clock,
        resolver,
    }
}

fn fixture() -> Fixture {
    fixture_with(PrefixCacheConfig::default().with_ttl_secs(60))
}

#[tokio::test]
async fn test_cache_hit_skips_store() {
    let f = fixture();
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();

    assert_eq!(f.resolver.resolve(Some(1)).await, "!");
    assert_eq!(f.resolver.resolve(Some(1)).await, "!");
    assert_eq!(f.resolver.resolve(Some(1)).await, "!");

    assert_eq!(f.store.fetches(), 1);
    assert!(f.resolver.cache().contains(&1));
}

#[tokio::test]
async fn test_cached_prefix_expires_after_ttl() {
    let f = fixture();
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    f.resolver.resolve(Some(1)).await;

    f.clock.advance(Duration::from_secs(59));
    assert!(f.resolver.cache().contains(&1));

    f.clock.advance(Duration::from_secs(1));
    assert!(!f.resolver.cache().contains(&1));

    // Changes made behind the cache's back show up after expiry
    f.store.upsert(GuildSettings::new(1, ">")).await.unwrap();
    assert_eq!(f.resolver.resolve(Some(1)).await, ">");
    assert_eq!(f.store.fetches(), 2);
}

#[tokio::test]
async fn test_default_prefix_is_cached_for_unconfigured_guild() {
    let f = fixture();

    assert_eq!(f.resolver.resolve(Some(5)).await, "?");
    assert_eq!(f.resolver.resolve(Some(5)).await, "?");

    assert_eq!(f.store.fetches(), 1);
    assert_eq!(f.resolver.cache().get(&5).unwrap(), "?");
}

#[tokio::test]
async fn test_dm_uses_default_without_store() {
    let f = fixture();

    assert_eq!(f.resolver.resolve(None).await, "?");
    assert_eq!(f.store.fetches(), 0);
    assert!(f.resolver.cache().is_empty());
}

#[tokio::test]
async fn test_store_failure_falls_back_without_caching() {
    let f = fixture();
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    f.store.set_down(true);

    assert!(f.resolver.guild_prefix(1).await.is_err());
    assert_eq!(f.resolver.resolve(Some(1)).await, "?");
    assert!(!f.resolver.cache().contains(&1));

    f.store.set_down(false);
    assert_eq!(f.resolver.resolve(Some(1)).await, "!");
}

#[tokio::test]
async fn test_set_prefix_replaces_cached_value() {
    let f = fixture();
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    f.resolver.resolve(Some(1)).await;

    let change = f.resolver.set_prefix(1, " >> ").await.unwrap();
    assert_eq!(change.previous, "!");
    assert_eq!(change.current, ">>");

    let fetches = f.store.fetches();
    assert_eq!(f.resolver.resolve(Some(1)).await, ">>");
    assert_eq!(f.store.fetches(), fetches);
}

#[tokio::test]
async fn test_set_prefix_ttl_restarts_from_change() {
    let f = fixture();
    f.resolver.resolve(Some(1)).await;

    f.clock.advance(Duration::from_secs(50));
    f.resolver.set_prefix(1, "!").await.unwrap();

    f.clock.advance(Duration::from_secs(50));
    assert_eq!(f.resolver.cache().get(&1).unwrap(), "!");
}

#[tokio::test]
async fn test_invalid_prefix_leaves_cache_alone() {
    let f = fixture();
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    f.resolver.resolve(Some(1)).await;

    let err = f.resolver.set_prefix(1, "way too long").await.unwrap_err();
    assert!(matches!(
        err.as_settings().map(|s| &s.kind),
        Some(SettingsErrorKind::InvalidValue(_))
    ));
    assert_eq!(f.resolver.cache().get(&1).unwrap(), "!");
}

#[tokio::test]
async fn test_failed_store_write_leaves_cache_alone() {
    let f = fixture();
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    f.resolver.resolve(Some(1)).await;
    f.store.set_down(true);

    assert!(f.resolver.set_prefix(1, ">").await.is_err());
    assert_eq!(f.resolver.cache().get(&1).unwrap(), "!");
}

#[tokio::test]
async fn test_reset_prefix_evicts() {
    let f = fixture();
    f.resolver.set_prefix(1, "!").await.unwrap();
    assert!(f.resolver.cache().contains(&1));

    assert!(f.resolver.reset_prefix(1).await.unwrap());
    assert!(!f.resolver.cache().contains(&1));
    assert_eq!(f.resolver.resolve(Some(1)).await, "?");

    assert!(!f.resolver.reset_prefix(1).await.unwrap());
}

#[tokio::test]
async fn test_disabled_cache_always_reads_store() {
    let f = fixture_with(PrefixCacheConfig::default().with_enabled(false));
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();

    f.resolver.resolve(Some(1)).await;
    f.resolver.resolve(Some(1)).await;

    assert_eq!(f.store.fetches(), 2);
    assert_eq!(f.resolver.cache().stored_len(), 0);
    assert!(f.resolver.spawn_sweeper().is_none());
}

#[tokio::test]
async fn test_lookup_racing_prefix_change_does_not_cache_stale_prefix() {
    let store = Arc::new(ProbeStore::default());
    store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    let settings = SettingsManager::new(store.clone(), "?", 2);
    let resolver = Arc::new(PrefixResolver::with_cache(
        Arc::new(settings),
        PrefixCacheConfig::default(),
        SharedTimedCache::with_clock(ManualClock::new()),
    ));

    // A lookup reads "!" and stalls before filling the cache
    store.hold_next_fetch();
    let lookup = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(Some(1)).await }
    });
    store.fetch_held.notified().await;

    resolver.set_prefix(1, ">").await.unwrap();

    store.release_fetch.notify_one();
    assert_eq!(lookup.await.unwrap(), "!");

    assert_eq!(resolver.cache().get(&1).unwrap(), ">");
    assert_eq!(resolver.resolve(Some(1)).await, ">");
}

#[tokio::test]
async fn test_lookup_racing_reset_does_not_cache_stale_prefix() {
    let store = Arc::new(ProbeStore::default());
    store.upsert(GuildSettings::new(1, "!")).await.unwrap();
    let settings = SettingsManager::new(store.clone(), "?", 2);
    let resolver = Arc::new(PrefixResolver::with_cache(
        Arc::new(settings),
        PrefixCacheConfig::default(),
        SharedTimedCache::with_clock(ManualClock::new()),
    ));

    store.hold_next_fetch();
    let lookup = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(Some(1)).await }
    });
    store.fetch_held.notified().await;

    assert!(resolver.reset_prefix(1).await.unwrap());

    store.release_fetch.notify_one();
    lookup.await.unwrap();

    assert!(!resolver.cache().contains(&1));
    assert_eq!(resolver.resolve(Some(1)).await, "?");
}

#[tokio::test]
async fn test_concurrent_prefix_changes_leave_cache_matching_store() {
    let store = Arc::new(ProbeStore::default());
    let settings = SettingsManager::new(store.clone(), "?", 2);
    let resolver = Arc::new(PrefixResolver::new(
        Arc::new(settings),
        PrefixCacheConfig::default(),
    ));

    let changes: Vec<_> = ["!", ">", "$", "%"]
        .into_iter()
        .map(|prefix| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.set_prefix(1, prefix).await.unwrap() })
        })
        .collect();
    for change in changes {
        change.await.unwrap();
    }

    let stored = store.fetch(1).await.unwrap().unwrap().prefix;
    assert_eq!(resolver.cache().get(&1).unwrap(), stored);
}

#[tokio::test]
async fn test_huge_configured_ttl_caches_without_expiry() {
    let f = fixture_with(PrefixCacheConfig::default().with_ttl_secs(u64::MAX));
    f.store.upsert(GuildSettings::new(1, "!")).await.unwrap();

    assert_eq!(f.resolver.resolve(Some(1)).await, "!");

    f.clock.advance(Duration::from_secs(60 * 60 * 24 * 365 * 100));
    assert_eq!(f.resolver.resolve(Some(1)).await, "!");
    assert_eq!(f.store.fetches(), 1);
}

#[tokio::test]
async fn test_match_invocation_prefix_any_case() {
    let f = fixture();
    f.resolver.set_prefix(1, "j!").await.unwrap();

    let invocation = f
        .resolver
        .match_invocation("J!Set prefix $", Some(1), None)
        .await
        .unwrap();
    assert_eq!(invocation.prefix, "J!");
    assert_eq!(invocation.command, "set");
    assert_eq!(invocation.args, vec!["prefix".to_string(), "$".to_string()]);

    assert!(f.resolver.match_invocation("?ping", Some(1), None).await.is_none());
    assert!(f.resolver.match_invocation("j! ping", Some(1), None).await.is_none());
    assert!(f.resolver.match_invocation("hello", Some(1), None).await.is_none());
}

#[tokio::test]
async fn test_match_invocation_mention() {
    let f = fixture();

    let invocation = f
        .resolver
        .match_invocation("<@!42> prefix", Some(1), Some(42))
        .await
        .unwrap();
    assert_eq!(invocation.prefix, "<@!42>");
    assert_eq!(invocation.command, "prefix");

    // Mentions of other users are not invocations
    assert!(
        f.resolver
            .match_invocation("<@7> prefix", Some(1), Some(42))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_match_invocation_mention_disabled() {
    let store = Arc::new(MemorySettingsStore::new());
    let settings = SettingsManager::new(store, "?", 2);
    let resolver = PrefixResolver::new(Arc::new(settings), PrefixCacheConfig::default())
        .with_mention_prefix(false);

    assert!(
        resolver
            .match_invocation("<@42> ping", None, Some(42))
            .await
            .is_none()
    );
    assert!(resolver.match_invocation("?ping", None, Some(42)).await.is_some());
}

#[tokio::test]
async fn test_execute_prefix_commands() {
    let f = fixture();
    let ctx = CommandContext {
        guild_id: Some(1),
        prefix_used: "?".to_string(),
    };

    let reply = execute(
        &Command::Set {
            setting: jihye_settings::Setting::Prefix,
            value: "!".to_string(),
        },
        &ctx,
        &f.resolver,
    )
    .await;
    assert_eq!(reply, "Prefix was changed from `?` to `!`");

    let reply = execute(&Command::Prefix, &ctx, &f.resolver).await;
    assert_eq!(reply, "My prefix here is `!`");

    let reply = execute(&Command::Reset, &ctx, &f.resolver).await;
    assert_eq!(reply, "Prefix was reset to `?`");

    let reply = execute(&Command::Reset, &ctx, &f.resolver).await;
    assert_eq!(reply, "This server has no custom settings.");
}

#[tokio::test]
async fn test_execute_rejects_settings_in_dm() {
    let f = fixture();
    let ctx = CommandContext {
        guild_id: None,
        prefix_used: "?".to_string(),
    };

    let reply = execute(&Command::Reset, &ctx, &f.resolver).await;
    assert_eq!(reply, "Settings can only be changed in a server.");
    assert_eq!(execute(&Command::Ping, &ctx, &f.resolver).await, "Pong!");
}

#[tokio::test]
async fn test_execute_reports_invalid_prefix() {
    let f = fixture();
    let ctx = CommandContext {
        guild_id: Some(1),
        prefix_used: "?".to_string(),
    };

    let reply = execute(
        &Command::Set {
            setting: jihye_settings::Setting::Prefix,
            value: "!!!".to_string(),
        },
        &ctx,
        &f.resolver,
    )
    .await;
    assert_eq!(
        reply,
        "That prefix can't be used: prefix is longer than 2 characters."
    );
}

#[test]
fn test_config_from_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("jihye.toml");
    std::fs::write(
        &path,
        r#"
[bot]
default_prefix = "j!"

[prefix_cache]
ttl_secs = 30
"#,
    )
    .unwrap();

    let config = JihyeConfig::from_file(&path).unwrap();

    assert_eq!(config.bot().default_prefix(), "j!");
    assert_eq!(*config.bot().max_prefix_len(), 2);
    assert_eq!(*config.prefix_cache().ttl_secs(), 30);
    assert_eq!(*config.prefix_cache().sweep_interval_secs(), 300);
}

#[test]
fn test_config_from_file_rejects_invalid_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("jihye.toml");
    std::fs::write(&path, "[bot]\ndefault_prefix = \"\"\n").unwrap();

    assert!(JihyeConfig::from_file(&path).is_err());
}
