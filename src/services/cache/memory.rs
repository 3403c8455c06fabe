//! Process-local cache used when no Valkey URL is configured.
//!
//! Entries expire lazily: an expired key is treated as absent and dropped on
//! the next write.
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CacheError {
    CacheError::BackendCommand("memory cache lock poisoned".to_string())
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;

        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;

        entries.retain(|_, (_, expires_at)| *expires_at > now);

        if entries.contains_key(key) {
            return Ok(false);
        }

        // Same clamp as `SET ... EX`
        let ttl = ttl.max(Duration::from_secs(1));
        entries.insert(key.to_string(), (value.to_string(), now + ttl));

        Ok(true)
    }

    async fn ping(&self) -> CacheResult<()> {
        self.entries.lock().map(|_| ()).map_err(|_| poisoned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_if_absent_only_sets_once() {
        let cache = MemoryCache::new();

        assert!(cache.set_if_absent_with_ttl("k", "1", Duration::from_secs(60)).await.unwrap());
        assert!(!cache.set_if_absent_with_ttl("k", "2", Duration::from_secs(60)).await.unwrap());
        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("1"));
        assert_eq!(cache.get_string("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = MemoryCache::new();
        let clone = cache.clone();

        cache.set_if_absent_with_ttl("k", "1", Duration::from_secs(60)).await.unwrap();
        assert!(clone.get_string("k").await.unwrap().is_some());
        assert!(cache.ping().await.is_ok());
    }
}
