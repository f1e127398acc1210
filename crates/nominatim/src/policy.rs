use std::sync::{Arc, OnceLock};
use std::time::Duration;

use lmap_common::config::PolicyConfig;
use lmap_common::types::SearchResult;
use tokio::sync::RwLock;

use crate::cache::GeocodeCache;
use crate::query::QueryKey;
use crate::rate_limit::{Permit, RateLimiter};

static SHARED: OnceLock<Arc<UsagePolicy>> = OnceLock::new();

/// The provider's usage policy as shared state: one request gate and one
/// result cache for every caller in the process.
pub struct UsagePolicy {
    limiter: RateLimiter,
    cache: RwLock<GeocodeCache>,
}

impl UsagePolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            limiter: RateLimiter::new(Duration::from_millis(config.min_interval_ms)),
            cache: RwLock::new(GeocodeCache::new(
                Duration::from_secs(config.cache_ttl_seconds),
                config.cache_max_entries,
            )),
        }
    }

    /// The process-wide policy. The first caller's configuration wins.
    pub fn shared(config: &PolicyConfig) -> Arc<Self> {
        SHARED.get_or_init(|| Arc::new(Self::new(config))).clone()
    }

    pub async fn acquire(&self) -> Permit {
        self.limiter.acquire().await
    }

    pub fn min_interval(&self) -> Duration {
        self.limiter.min_interval()
    }

    pub async fn cached(&self, key: &QueryKey) -> Option<SearchResult> {
        self.cache.read().await.get(key)
    }

    pub async fn store(&self, key: QueryKey, result: SearchResult) {
        self.cache.write().await.insert(key, result);
    }

    /// Cache check made while holding a permit. Misses here were already
    /// counted by [`UsagePolicy::cached`].
    pub async fn cached_after_wait(&self, key: &QueryKey) -> Option<SearchResult> {
        let hit = self.cache.read().await.peek(key);
        if hit.is_some() {
            metrics::counter!("geocode.cache.hit").increment(1);
        }
        hit
    }
}
