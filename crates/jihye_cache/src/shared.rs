//! Thread-safe handle to a timed cache.

use crate::{Clock, MonotonicClock, TimedCache};
use jihye_error::CacheResult;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Cloneable, lock-protected [`TimedCache`] for multi-threaded runtimes.
///
/// Lookups of live entries run concurrently under the read lock. Inserts,
/// overrides, deletes and sweeps take the write lock, so two mutations of
/// the same key never interleave and an expired entry cannot be resurrected
/// by a racing reader. No lock is held across an `.await`.
///
/// # Example
///
/// ```
/// use jihye_cache::SharedTimedCache;
/// use std::time::Duration;
///
/// let cache: SharedTimedCache<u64, String> = SharedTimedCache::new();
/// let handle = cache.clone();
///
/// handle.add(99, ">".to_string(), Some(Duration::from_secs(60)), true).unwrap();
/// assert_eq!(cache.get(&99).unwrap(), ">");
/// ```
#[derive(Debug)]
pub struct SharedTimedCache<K, V, C = MonotonicClock> {
    inner: Arc<RwLock<TimedCache<K, V, C>>>,
}

impl<K, V, C> Clone for SharedTimedCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedTimedCache<K, V, MonotonicClock>
where
    K: Eq + Hash + Debug,
{
    /// Create an empty shared cache on the monotonic clock.
    pub fn new() -> Self {
        Self::from_cache(TimedCache::new())
    }
}

impl<K, V> Default for SharedTimedCache<K, V, MonotonicClock>
where
    K: Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> SharedTimedCache<K, V, C>
where
    K: Eq + Hash + Debug,
    C: Clock,
{
    /// Wrap an existing cache.
    pub fn from_cache(cache: TimedCache<K, V, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Create an empty shared cache reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self::from_cache(TimedCache::with_clock(clock))
    }
}

impl<K, V, C> SharedTimedCache<K, V, C>
where
    K: Eq + Hash + Debug,
    V: Clone,
    C: Clock,
{
    // Every mutation is a single map operation, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, TimedCache<K, V, C>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TimedCache<K, V, C>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True iff a live entry exists for `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        if self.read().peek(key).is_ok() {
            return true;
        }
        self.write().contains(key)
    }

    /// Clone of the live value for `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is absent or its entry has expired.
    pub fn get<Q>(&self, key: &Q) -> CacheResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        if let Ok(value) = self.read().peek(key) {
            return Ok(value.clone());
        }
        // Miss or expired: retry under the write lock, which also purges
        self.write().get(key).cloned()
    }

    /// Insert `value` under `key`. See [`TimedCache::add`].
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when a live entry exists and `override_existing` is false.
    pub fn add(
        &self,
        key: K,
        value: V,
        ttl: Option<Duration>,
        override_existing: bool,
    ) -> CacheResult<()> {
        self.write().add(key, value, ttl, override_existing)
    }

    /// Remove the entry for `key`. See [`TimedCache::delete`].
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is absent or its entry has expired.
    pub fn delete<Q>(&self, key: &Q) -> CacheResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.write().delete(key)
    }

    /// Remove every expired entry, returning how many were purged.
    pub fn cleanup_expired(&self) -> usize {
        self.write().cleanup_expired()
    }

    /// Clear all cache entries.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of entries held in memory, including expired ones not yet purged.
    pub fn stored_len(&self) -> usize {
        self.read().stored_len()
    }
}

impl<K, V, C> SharedTimedCache<K, V, C>
where
    K: Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock + 'static,
{
    /// Spawn a background task that sweeps expired entries every `interval`.
    ///
    /// Must be called from within a Tokio runtime. The task runs until the
    /// returned handle is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tracing::info!(interval = ?interval, "Starting cache sweeper");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                tracing::trace!(removed, "Cache sweep finished");
            }
        })
    }
}
