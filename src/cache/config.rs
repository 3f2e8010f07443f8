//! Cache configuration.
//!
//! Sizes and freshness of the recipe cache, fed from the `[cache]` section of
//! `recipeez.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const DEFAULT_DETAIL_LIMIT: usize = 200;
pub const DEFAULT_STALE_SECS: u64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum resident list entries (one per page/search combination).
    pub list_limit: usize,
    /// Maximum resident single-recipe entries.
    pub detail_limit: usize,
    /// Age after which a cache-first read goes back to the network.
    pub stale_after: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            detail_limit: DEFAULT_DETAIL_LIMIT,
            stale_after: Duration::from_secs(DEFAULT_STALE_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            list_limit: settings.list_limit.get(),
            detail_limit: settings.detail_limit.get(),
            stale_after: settings.stale_after,
        }
    }
}

impl CacheConfig {
    /// List capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn list_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.list_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Detail capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn detail_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.detail_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
