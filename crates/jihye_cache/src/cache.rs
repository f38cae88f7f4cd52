//! Timed cache implementation.

use crate::{Clock, MonotonicClock};
use derive_getters::Getters;
use jihye_error::{CacheError, CacheResult};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Cache slot with value and optional expiration.
#[derive(Debug, Clone, Getters)]
pub struct TimedEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Option<Instant>,
}

impl<V> TimedEntry<V> {
    fn new(value: V, now: Instant, ttl: Option<Duration>) -> Self {
        Self {
            value,
            created_at: now,
            // A deadline past the end of representable time never arrives
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        }
    }

    /// Whether the entry is expired at `now`.
    ///
    /// An entry is expired from its `expires_at` instant onward.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Time left before expiry, or `None` for entries that never expire.
    pub fn time_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(now))
    }

    /// Consume the entry, returning its value.
    pub fn into_value(self) -> V {
        self.value
    }
}

/// Key/value cache with independent per-entry expiration.
///
/// Expiry is lazy: an expired entry stays in memory until it is touched or
/// swept by [`TimedCache::cleanup_expired`], but every read treats it as
/// absent. There is no size bound and no eviction beyond TTL.
///
/// # Example
///
/// ```
/// use jihye_cache::TimedCache;
/// use std::time::Duration;
///
/// let mut cache: TimedCache<u64, String> = TimedCache::new();
///
/// cache.add(1234, "!".to_string(), Some(Duration::from_secs(3600)), false).unwrap();
/// assert_eq!(cache.get(&1234).unwrap(), "!");
///
/// // A second non-overriding insert collides with the live entry
/// assert!(cache.add(1234, "?".to_string(), None, false).unwrap_err().is_already_exists());
///
/// // Overriding replaces value and expiration
/// cache.add(1234, "?".to_string(), None, true).unwrap();
/// assert_eq!(cache.get(&1234).unwrap(), "?");
/// ```
#[derive(Debug)]
pub struct TimedCache<K, V, C = MonotonicClock> {
    entries: HashMap<K, TimedEntry<V>>,
    clock: C,
}

impl<K, V> TimedCache<K, V, MonotonicClock>
where
    K: Eq + Hash + Debug,
{
    /// Create an empty cache on the monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl<K, V> Default for TimedCache<K, V, MonotonicClock>
where
    K: Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> TimedCache<K, V, C>
where
    K: Eq + Hash + Debug,
    C: Clock,
{
    /// Create an empty cache reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    /// True iff a live entry exists for `key`.
    ///
    /// An expired entry found here is purged.
    pub fn contains<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.purge_if_expired(key);
        self.entries.contains_key(key)
    }

    /// Value of the live entry for `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is absent or its entry has expired.
    pub fn get<Q>(&mut self, key: &Q) -> CacheResult<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.entry(key).map(|entry| &entry.value)
    }

    /// The live entry for `key`, including its timestamps.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is absent or its entry has expired.
    pub fn entry<Q>(&mut self, key: &Q) -> CacheResult<&TimedEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => {
                tracing::trace!(key = ?key, "Cache hit");
                Ok(entry)
            }
            None => {
                tracing::trace!(key = ?key, "Cache miss");
                Err(CacheError::not_found(key))
            }
        }
    }

    /// Value of the live entry for `key` without purging anything.
    ///
    /// Used where only shared access is available; expired entries still
    /// read as absent.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is absent or its entry has expired.
    pub fn peek<Q>(&self, key: &Q) -> CacheResult<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| &entry.value)
            .ok_or_else(|| CacheError::not_found(key))
    }

    /// Insert `value` under `key`.
    ///
    /// `ttl = None` stores an entry that lives until deleted, as does a TTL
    /// too large to represent as a deadline. An expired entry
    /// under `key` counts as absent, so it never causes `AlreadyExists`.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when a live entry exists and `override_existing` is
    /// false. The cache is left untouched in that case.
    pub fn add(
        &mut self,
        key: K,
        value: V,
        ttl: Option<Duration>,
        override_existing: bool,
    ) -> CacheResult<()> {
        self.purge_if_expired(&key);

        let occupied = self.entries.contains_key(&key);
        if occupied && !override_existing {
            tracing::debug!(key = ?key, "Refusing to replace live cache entry");
            return Err(CacheError::already_exists(&key));
        }

        let now = self.clock.now();
        tracing::debug!(key = ?key, ttl = ?ttl, replaced = occupied, "Inserted cache entry");
        self.entries.insert(key, TimedEntry::new(value, now, ttl));
        Ok(())
    }

    /// Remove the entry for `key`, returning its value.
    ///
    /// An expired entry still held in memory is removed too, but reported
    /// the same way as a missing one.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is absent or its entry has expired.
    pub fn delete<Q>(&mut self, key: &Q) -> CacheResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let now = self.clock.now();
        match self.entries.remove(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                tracing::debug!(key = ?key, "Deleted cache entry");
                Ok(entry.into_value())
            }
            Some(_) => {
                tracing::debug!(key = ?key, "Cache entry expired, removing");
                Err(CacheError::not_found(key))
            }
            None => Err(CacheError::not_found(key)),
        }
    }

    /// Remove every expired entry, returning how many were purged.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::info!(
                removed,
                remaining = self.entries.len(),
                "Cleaned up expired cache entries"
            );
        }
        removed
    }

    /// Clear all cache entries.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    /// Check if the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries held in memory, including expired ones not yet purged.
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    fn purge_if_expired<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let now = self.clock.now();
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired {
            tracing::debug!(key = ?key, "Cache entry expired, removing");
            self.entries.remove(key);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn cache() -> (TimedCache<u64, String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (TimedCache::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_expired_entry_reads_absent_before_purge() {
        let (mut cache, clock) = cache();
        cache
            .add(1, "!".to_string(), Some(Duration::from_secs(10)), false)
            .unwrap();

        clock.advance(Duration::from_secs(10));

        // Still physically present, but no read may observe it
        assert_eq!(cache.stored_len(), 1);
        assert!(cache.peek(&1).unwrap_err().is_not_found());
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());

        assert!(!cache.contains(&1));
        assert_eq!(cache.stored_len(), 0);
    }

    #[test]
    fn test_contains_does_not_purge_live_entries() {
        let (mut cache, clock) = cache();
        cache
            .add(1, "!".to_string(), Some(Duration::from_secs(10)), false)
            .unwrap();

        clock.advance(Duration::from_secs(9));

        assert!(cache.contains(&1));
        assert_eq!(cache.stored_len(), 1);
    }

    #[test]
    fn test_entry_reports_time_remaining() {
        let (mut cache, clock) = cache();
        cache
            .add(1, "!".to_string(), Some(Duration::from_secs(60)), false)
            .unwrap();
        cache.add(2, "?".to_string(), None, false).unwrap();

        clock.advance(Duration::from_secs(15));
        let now = clock.now();

        let timed = cache.entry(&1).unwrap();
        assert_eq!(timed.time_remaining_at(now), Some(Duration::from_secs(45)));

        let forever = cache.entry(&2).unwrap();
        assert_eq!(forever.time_remaining_at(now), None);
        assert!(forever.expires_at().is_none());
    }

    #[test]
    fn test_cleanup_expired_keeps_live_entries() {
        let (mut cache, clock) = cache();
        cache
            .add(1, "a".to_string(), Some(Duration::from_secs(5)), false)
            .unwrap();
        cache
            .add(2, "b".to_string(), Some(Duration::from_secs(50)), false)
            .unwrap();
        cache.add(3, "c".to_string(), None, false).unwrap();

        clock.advance(Duration::from_secs(6));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.stored_len(), 2);
        assert_eq!(cache.get(&2).unwrap(), "b");
        assert_eq!(cache.get(&3).unwrap(), "c");
    }

    #[test]
    fn test_delete_of_unpurged_expired_entry_is_not_found() {
        let (mut cache, clock) = cache();
        cache
            .add(1, "!".to_string(), Some(Duration::from_secs(1)), false)
            .unwrap();
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.stored_len(), 1);

        assert!(cache.delete(&1).unwrap_err().is_not_found());
        assert_eq!(cache.stored_len(), 0);
        assert!(cache.delete(&1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let (mut cache, clock) = cache();
        cache
            .add(1, "!".to_string(), Some(Duration::MAX), false)
            .unwrap();

        assert!(cache.entry(&1).unwrap().expires_at().is_none());
        clock.advance(Duration::from_secs(60 * 60 * 24 * 365 * 100));
        assert_eq!(cache.get(&1).unwrap(), "!");
    }

    #[test]
    fn test_borrowed_key_lookup() {
        let mut cache: TimedCache<String, u32> = TimedCache::new();
        cache.add("g1".to_string(), 7, None, false).unwrap();

        assert!(cache.contains("g1"));
        assert_eq!(*cache.get("g1").unwrap(), 7);
        assert_eq!(cache.delete("g1").unwrap(), 7);
    }

    #[test]
    fn test_clear_empties_cache() {
        let (mut cache, _clock) = cache();
        cache.add(1, "a".to_string(), None, false).unwrap();
        cache.add(2, "b".to_string(), None, false).unwrap();

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stored_len(), 0);
    }
}
