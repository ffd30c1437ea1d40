/// Actor Cache - in-memory TTL cache owned by the actor repository
use crate::actor::ActorProfile;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedActor {
    profile: Arc<ActorProfile>,
    cached_at: DateTime<Utc>,
}

/// Actor profile cache manager
#[derive(Clone)]
pub struct ActorCache {
    entries: Arc<RwLock<HashMap<String, CachedActor>>>,
    /// TTL for actor profiles (default: 5 minutes)
    ttl: Duration,
}

impl Default for ActorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorCache {
    /// Create a new actor cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(5),
        }
    }

    /// Set custom TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get cached profile if still fresh
    pub async fn get(&self, url: &str) -> Option<Arc<ActorProfile>> {
        let key = normalize(url);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if Utc::now() - entry.cached_at < self.ttl => {
                    debug!("Actor cache HIT: {}", key);
                    return Some(Arc::clone(&entry.profile));
                }
                Some(_) => {}
                None => {
                    debug!("Actor cache MISS: {}", key);
                    return None;
                }
            }
        }

        // Expired, drop it
        self.entries.write().await.remove(&key);
        None
    }

    /// Cache a profile under the requested URL and its canonical id.
    ///
    /// Expired entries are swept on every insert.
    pub async fn insert(&self, url: &str, profile: Arc<ActorProfile>) {
        let now = Utc::now();
        let entry = CachedActor {
            profile: Arc::clone(&profile),
            cached_at: now,
        };
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, e| now - e.cached_at < self.ttl);
        let swept = before - entries.len();
        if swept > 0 {
            debug!("Actor cache swept {} expired entries", swept);
        }

        entries.insert(normalize(url), entry.clone());
        entries.insert(normalize(&profile.id), entry);
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(id: &str) -> Arc<ActorProfile> {
        Arc::new(ActorProfile::from_json(&json!({ "id": id })).unwrap())
    }

    #[tokio::test]
    async fn test_cache_and_get_profile() {
        let cache = ActorCache::new();
        cache
            .insert("https://a.test/@alice/", profile("https://a.test/users/alice"))
            .await;

        // Reachable by requested url (trailing slash ignored) and by id
        assert!(cache.get("https://a.test/@alice").await.is_some());
        assert!(cache.get("https://a.test/users/alice").await.is_some());
        assert!(cache.get("https://a.test/users/bob").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = ActorCache::new().with_ttl(Duration::zero());
        cache.insert("https://a.test/u", profile("https://a.test/u")).await;

        assert!(cache.get("https://a.test/u").await.is_none());
        assert!(cache.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_sweeps_keys_never_read_again() {
        let cache = ActorCache::new().with_ttl(Duration::milliseconds(50));
        cache
            .insert("https://a.test/@alice", profile("https://a.test/users/alice"))
            .await;
        cache
            .insert("https://b.test/@bob", profile("https://b.test/users/bob"))
            .await;
        assert_eq!(cache.entries.read().await.len(), 4);

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        cache
            .insert("https://c.test/users/carol", profile("https://c.test/users/carol"))
            .await;

        // Both aliases of the expired profiles are gone; carol shares one key
        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("https://c.test/users/carol"));
    }
}
