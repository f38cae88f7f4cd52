//! Prefix cache configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the guild prefix cache.
///
/// ```toml
/// [prefix_cache]
/// enabled = true
/// ttl_secs = 3600
/// sweep_interval_secs = 300
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct PrefixCacheConfig {
    /// Whether resolved prefixes are cached at all
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Lifetime of a cached prefix (seconds)
    #[serde(default = "default_ttl_secs")]
    ttl_secs: u64,

    /// Period of the expired-entry sweep (seconds, 0 disables it)
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl PrefixCacheConfig {
    /// Lifetime given to cached prefixes.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep period, or `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for PrefixCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}
