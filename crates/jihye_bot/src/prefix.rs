//! Guild prefix resolution.
//!
//! Every incoming message needs its guild's prefix before it can be parsed
//! as a command. The resolver asks the prefix cache first and only goes to
//! the settings store on a miss, refilling the cache with the answer.

use jihye_cache::{Clock, MonotonicClock, PrefixCacheConfig, SharedTimedCache};
use jihye_error::JihyeResult;
use jihye_settings::{Setting, SettingsManager};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// A message recognised as addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The prefix exactly as the user typed it (or the mention)
    pub prefix: String,
    /// Lowercased command name
    pub command: String,
    /// Whitespace-separated arguments after the command name
    pub args: Vec<String>,
}

/// Outcome of a prefix change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixChange {
    /// Prefix in effect before the change
    pub previous: String,
    /// Prefix now in effect
    pub current: String,
}

/// Split `content` after `prefix`, ignoring case.
///
/// Returns the prefix as it appears in `content` and the remainder, so a
/// guild prefix of `j!` also matches a message starting with `J!`.
///
/// ```
/// use jihye_bot::strip_prefix;
///
/// assert_eq!(strip_prefix("J!ping", "j!"), Some(("J!", "ping")));
/// assert_eq!(strip_prefix("ping", "j!"), None);
/// ```
pub fn strip_prefix<'a>(content: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    if prefix.is_empty() {
        return None;
    }

    let mut content_chars = content.char_indices();
    let mut end = 0;

    for expected in prefix.chars() {
        let (idx, actual) = content_chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = idx + actual.len_utf8();
    }

    Some(content.split_at(end))
}

/// Match `<@id>` or `<@!id>` at the start of `content`.
fn strip_mention(content: &str, bot_id: u64) -> Option<(&str, &str)> {
    [format!("<@{}>", bot_id), format!("<@!{}>", bot_id)]
        .iter()
        .find_map(|mention| {
            content
                .strip_prefix(mention.as_str())
                .map(|rest| (&content[..mention.len()], rest))
        })
}

fn split_command(prefix: &str, remainder: &str) -> Option<Invocation> {
    let mut words = remainder.split_whitespace();
    let command = words.next()?.to_lowercase();
    Some(Invocation {
        prefix: prefix.to_string(),
        command,
        args: words.map(str::to_string).collect(),
    })
}

/// Resolves guild prefixes through the prefix cache and the settings store.
///
/// # Example
///
/// ```
/// use jihye_bot::PrefixResolver;
/// use jihye_cache::PrefixCacheConfig;
/// use jihye_settings::{MemorySettingsStore, SettingsManager};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = SettingsManager::new(Arc::new(MemorySettingsStore::new()), "?", 2);
/// let resolver = PrefixResolver::new(Arc::new(settings), PrefixCacheConfig::default());
///
/// resolver.set_prefix(42, "!").await?;
/// assert_eq!(resolver.resolve(Some(42)).await, "!");
/// assert_eq!(resolver.resolve(None).await, "?");
/// # Ok(())
/// # }
/// ```
pub struct PrefixResolver<C = MonotonicClock> {
    cache: SharedTimedCache<u64, String, C>,
    settings: Arc<SettingsManager>,
    cache_config: PrefixCacheConfig,
    mention_prefix: bool,
    /// Bumped by every prefix change. A fill whose store read started under
    /// an older generation is dropped.
    generation: Mutex<u64>,
    /// Serializes prefix changes, store write through cache update.
    writes: tokio::sync::Mutex<()>,
}

impl PrefixResolver<MonotonicClock> {
    /// Create a resolver with an empty cache on the monotonic clock.
    pub fn new(settings: Arc<SettingsManager>, cache_config: PrefixCacheConfig) -> Self {
        Self::with_cache(settings, cache_config, SharedTimedCache::new())
    }
}

impl<C: Clock> PrefixResolver<C> {
    /// Create a resolver over an existing cache handle.
    pub fn with_cache(
        settings: Arc<SettingsManager>,
        cache_config: PrefixCacheConfig,
        cache: SharedTimedCache<u64, String, C>,
    ) -> Self {
        tracing::debug!(
            enabled = cache_config.enabled(),
            ttl_secs = cache_config.ttl_secs(),
            "Creating prefix resolver"
        );
        Self {
            cache,
            settings,
            cache_config,
            mention_prefix: true,
            generation: Mutex::new(0),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Accept (or stop accepting) a bot mention in place of the prefix.
    pub fn with_mention_prefix(mut self, enabled: bool) -> Self {
        self.mention_prefix = enabled;
        self
    }

    /// The prefix cache.
    pub fn cache(&self) -> &SharedTimedCache<u64, String, C> {
        &self.cache
    }

    /// The settings manager backing the cache.
    pub fn settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }

    /// Prefix used in DMs and as the fallback.
    pub fn default_prefix(&self) -> &str {
        self.settings.default_prefix()
    }

    fn remember(&self, guild_id: u64, prefix: String) {
        if !*self.cache_config.enabled() {
            return;
        }
        if let Err(e) = self
            .cache
            .add(guild_id, prefix, Some(self.cache_config.ttl()), true)
        {
            warn!(guild_id, error = %e, "Failed to cache guild prefix");
        }
    }

    /// Drop the cached prefix for the guild, if any.
    pub fn evict(&self, guild_id: u64) {
        // Nothing cached is fine
        if self.cache.delete(&guild_id).is_ok() {
            debug!(guild_id, "Evicted cached prefix");
        }
    }

    fn current_generation(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cache a prefix read from the store, unless a change landed since the
    /// read began.
    fn fill(&self, guild_id: u64, prefix: String, read_generation: u64) {
        let generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        if *generation != read_generation {
            debug!(guild_id, "Prefix changed during lookup, not caching");
            return;
        }
        self.remember(guild_id, prefix);
    }

    /// Replace whatever is cached for the guild after a change, and stop
    /// in-flight lookups from caching what they read before it.
    fn invalidate(&self, guild_id: u64, current: Option<String>) {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation = generation.wrapping_add(1);
        self.evict(guild_id);
        if let Some(prefix) = current {
            self.remember(guild_id, prefix);
        }
    }

    /// The guild's prefix, from cache when possible.
    ///
    /// On a miss the settings store is consulted; a stored prefix or, when
    /// the guild has none, the default prefix is cached for the configured
    /// TTL.
    ///
    /// # Errors
    ///
    /// Store failures are returned and nothing is cached.
    #[instrument(skip(self))]
    pub async fn guild_prefix(&self, guild_id: u64) -> JihyeResult<String> {
        if *self.cache_config.enabled() {
            if let Ok(prefix) = self.cache.get(&guild_id) {
                return Ok(prefix);
            }
        }

        let read_generation = self.current_generation();
        let prefix = match self.settings.custom_prefix(guild_id).await? {
            Some(prefix) => prefix,
            None => self.default_prefix().to_string(),
        };
        debug!(guild_id, prefix = %prefix, "Resolved prefix from settings store");

        self.fill(guild_id, prefix.clone(), read_generation);
        Ok(prefix)
    }

    /// Prefix for a message from `guild_id` (`None` for DMs).
    ///
    /// Never fails: lookup errors are logged and the default prefix is used.
    pub async fn resolve(&self, guild_id: Option<u64>) -> String {
        let Some(guild_id) = guild_id else {
            return self.default_prefix().to_string();
        };

        match self.guild_prefix(guild_id).await {
            Ok(prefix) => prefix,
            Err(e) => {
                warn!(guild_id, error = %e, "Prefix lookup failed, using default");
                self.default_prefix().to_string()
            }
        }
    }

    /// Store a new prefix for the guild and refresh the cache.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for unacceptable prefixes, otherwise store failures.
    /// The cache is untouched when the store write fails.
    #[instrument(skip(self))]
    pub async fn set_prefix(&self, guild_id: u64, prefix: &str) -> JihyeResult<PrefixChange> {
        let current = self.settings.validate(Setting::Prefix, prefix)?;

        let _write = self.writes.lock().await;
        let previous = self
            .settings
            .set(guild_id, Setting::Prefix, &current)
            .await?;
        self.invalidate(guild_id, Some(current.clone()));

        Ok(PrefixChange { previous, current })
    }

    /// Drop the guild's stored prefix, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Store failures.
    #[instrument(skip(self))]
    pub async fn reset_prefix(&self, guild_id: u64) -> JihyeResult<bool> {
        let _write = self.writes.lock().await;
        let removed = self.settings.reset(guild_id).await?;
        self.invalidate(guild_id, None);
        Ok(removed)
    }

    /// Recognise a command addressed to the bot.
    ///
    /// A message matches when it starts with the guild's prefix (any case)
    /// immediately followed by a command name, or, if enabled, with a
    /// mention of `bot_id`.
    pub async fn match_invocation(
        &self,
        content: &str,
        guild_id: Option<u64>,
        bot_id: Option<u64>,
    ) -> Option<Invocation> {
        if self.mention_prefix {
            if let Some((mention, rest)) = bot_id.and_then(|id| strip_mention(content, id)) {
                return split_command(mention, rest);
            }
        }

        let prefix = self.resolve(guild_id).await;
        let (typed, rest) = strip_prefix(content, &prefix)?;
        if rest.starts_with(char::is_whitespace) {
            return None;
        }
        split_command(typed, rest)
    }
}

impl<C> PrefixResolver<C>
where
    C: Clock + 'static,
{
    /// Start the periodic cache sweep if one is configured.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        if !*self.cache_config.enabled() {
            return None;
        }
        let interval = self.cache_config.sweep_interval()?;
        Some(self.cache.spawn_sweeper(interval))
    }
}
