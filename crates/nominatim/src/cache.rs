use std::collections::HashMap;
use std::time::{Duration, Instant};

use lmap_common::types::SearchResult;

use crate::query::QueryKey;

/// In-memory cache of resolved searches with TTL-based expiration and a
/// capacity bound.
pub struct GeocodeCache {
    entries: HashMap<QueryKey, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

struct CacheEntry {
    result: SearchResult,
    inserted_at: Instant,
}

impl GeocodeCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Get a cached result if it exists and hasn't expired.
    pub fn get(&self, key: &QueryKey) -> Option<SearchResult> {
        let hit = self.peek(key);
        if hit.is_some() {
            metrics::counter!("geocode.cache.hit").increment(1);
        } else {
            metrics::counter!("geocode.cache.miss").increment(1);
        }
        hit
    }

    /// Like [`GeocodeCache::get`], without touching the hit/miss counters.
    pub fn peek(&self, key: &QueryKey) -> Option<SearchResult> {
        self.entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.result.clone())
    }

    /// Insert a result, evicting expired entries and, at capacity, the oldest one.
    pub fn insert(&mut self, key: QueryKey, result: SearchResult) {
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);

        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;

    fn key(city: &str) -> QueryKey {
        Query::city_state(city, "TX").unwrap().cache_key()
    }

    fn result(query: &str) -> SearchResult {
        serde_json::from_value(serde_json::json!({
            "type": "FeatureCollection",
            "geocoding": { "query": query },
            "features": []
        }))
        .unwrap()
    }

    #[test]
    fn test_cache_hit_miss() {
        let mut cache = GeocodeCache::new(Duration::from_secs(3600), 10);
        assert!(cache.get(&key("Austin")).is_none());

        cache.insert(key("Austin"), result("Austin"));

        let hit = cache.get(&key("  austin ")).unwrap();
        assert_eq!(hit, result("Austin"));
    }

    #[test]
    fn test_cache_expiry() {
        let mut cache = GeocodeCache::new(Duration::from_millis(1), 10);
        cache.insert(key("Austin"), result("old"));

        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get(&key("Austin")).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = GeocodeCache::new(Duration::from_secs(3600), 2);
        cache.insert(key("Austin"), result("Austin"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(key("Dallas"), result("Dallas"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(key("Houston"), result("Houston"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("Austin")).is_none());
        assert!(cache.get(&key("Dallas")).is_some());
        assert!(cache.get(&key("Houston")).is_some());
    }

    #[test]
    fn test_reinserting_key_at_capacity_keeps_others() {
        let mut cache = GeocodeCache::new(Duration::from_secs(3600), 2);
        cache.insert(key("Austin"), result("Austin"));
        cache.insert(key("Dallas"), result("Dallas"));
        cache.insert(key("Dallas"), result("Dallas again"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("Dallas")), Some(result("Dallas again")));
        assert!(cache.get(&key("Austin")).is_some());
    }
}
