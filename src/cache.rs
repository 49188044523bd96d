use std::sync::Arc;

use derive_more::Display;

use crate::models::Note;

#[derive(Debug, Display)]
pub enum CacheError {
    #[display(fmt = "memcached error: {}", _0)]
    Backend(memcache::MemcacheError),
    #[display(fmt = "cache serialization error: {}", _0)]
    Serialization(serde_json::Error),
}

impl From<memcache::MemcacheError> for CacheError {
    fn from(err: memcache::MemcacheError) -> CacheError {
        CacheError::Backend(err)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> CacheError {
        CacheError::Serialization(err)
    }
}

/// Raw key/value cache storage. `get` distinguishes a miss (`Ok(None)`)
/// from a stored empty value (`Ok(Some(_))`), so a cached empty note list
/// is still a hit.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// Unconditional overwrite; resets the entry's expiry to now + ttl.
    /// A ttl of 0 means the entry never expires.
    fn set(&self, key: &str, value: &str, ttl_secs: u32) -> Result<(), CacheError>;
    /// Idempotent; deleting an absent key is a no-op.
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub struct MemcachedBackend {
    client: memcache::Client,
}

impl MemcachedBackend {
    /// Connects to the given `host:port` addresses and flushes whatever the
    /// servers still hold from a previous process.
    pub fn connect(servers: &[String]) -> Result<MemcachedBackend, CacheError> {
        let urls: Vec<String> = servers
            .iter()
            .map(|addr| format!("memcache://{}", addr))
            .collect();
        let client = memcache::Client::connect(urls)?;
        client.flush()?;
        Ok(MemcachedBackend { client })
    }
}

impl CacheBackend for MemcachedBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.client.get::<String>(key)?)
    }

    fn set(&self, key: &str, value: &str, ttl_secs: u32) -> Result<(), CacheError> {
        Ok(self.client.set(key, value, ttl_secs)?)
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.client.delete(key)?;
        Ok(())
    }
}

/// Read-through cache for the recent-notes query.
///
/// The backend is optional: with no backend configured every `get` misses
/// and `put`/`invalidate` are no-ops, so the handlers run one code path
/// either way. A failing backend is treated the same as an absent one for
/// the request at hand, a broken cache must never break the page.
#[derive(Clone)]
pub struct RecentNotesCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl_secs: u32,
}

impl RecentNotesCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl_secs: u32) -> RecentNotesCache {
        RecentNotesCache {
            backend: Some(backend),
            ttl_secs,
        }
    }

    pub fn disabled() -> RecentNotesCache {
        RecentNotesCache {
            backend: None,
            ttl_secs: 0,
        }
    }

    /// The cache key is a pure function of the page size. Changing the
    /// configured page size orphans old entries instead of invalidating
    /// them; they age out on their own.
    pub fn cache_key(notes_to_display: i64) -> String {
        format!("last_{}_notes", notes_to_display)
    }

    pub fn get(&self, key: &str) -> Option<Vec<Note>> {
        let backend = self.backend.as_ref()?;
        match backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Note>>(&raw) {
                Ok(cached) => {
                    log::debug!("cache hit for {}", key);
                    Some(cached)
                }
                Err(err) => {
                    log::warn!("discarding undecodable cache entry {}: {}", key, err);
                    None
                }
            },
            Ok(None) => {
                log::debug!("cache miss for {}", key);
                None
            }
            Err(err) => {
                log::warn!("cache get for {} failed, falling back to the database: {}", key, err);
                None
            }
        }
    }

    pub fn put(&self, key: &str, value: &[Note]) {
        let backend = match self.backend.as_ref() {
            Some(backend) => backend,
            None => return,
        };
        let result = serde_json::to_string(value)
            .map_err(CacheError::from)
            .and_then(|raw| backend.set(key, &raw, self.ttl_secs));
        if let Err(err) = result {
            log::warn!("cache put for {} failed: {}", key, err);
        }
    }

    pub fn invalidate(&self, key: &str) {
        let backend = match self.backend.as_ref() {
            Some(backend) => backend,
            None => return,
        };
        match backend.delete(key) {
            Ok(()) => log::debug!("invalidated cache entry {}", key),
            Err(err) => log::warn!("cache invalidation for {} failed: {}", key, err),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::testing::{FailingBackend, MemoryBackend};
    use super::*;

    fn note(id: i32, content: &str) -> Note {
        Note {
            id,
            content: content.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            server_name: "srv".to_string(),
        }
    }

    fn memory_cache(ttl_secs: u32) -> RecentNotesCache {
        RecentNotesCache::new(Arc::new(MemoryBackend::new()), ttl_secs)
    }

    #[test]
    fn key_depends_only_on_page_size() {
        assert_eq!(RecentNotesCache::cache_key(20), "last_20_notes");
        assert_eq!(RecentNotesCache::cache_key(2), "last_2_notes");
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = memory_cache(60);
        let value = vec![note(2, "two"), note(1, "one")];
        cache.put("last_2_notes", &value);
        assert_eq!(cache.get("last_2_notes"), Some(value));
    }

    #[test]
    fn cached_empty_list_is_a_hit_not_a_miss() {
        let cache = memory_cache(60);
        cache.put("last_20_notes", &[]);
        assert_eq!(cache.get("last_20_notes"), Some(vec![]));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = memory_cache(1);
        cache.put("last_20_notes", &[note(1, "one")]);
        assert!(cache.get("last_20_notes").is_some());

        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.get("last_20_notes"), None);
    }

    #[test]
    fn invalidate_is_idempotent() {
        let cache = memory_cache(60);
        cache.put("last_20_notes", &[note(1, "one")]);

        cache.invalidate("last_20_notes");
        assert_eq!(cache.get("last_20_notes"), None);
        cache.invalidate("last_20_notes");
        assert_eq!(cache.get("last_20_notes"), None);
    }

    #[test]
    fn put_overwrites_unconditionally() {
        let cache = memory_cache(60);
        cache.put("last_20_notes", &[note(1, "one")]);
        cache.put("last_20_notes", &[note(2, "two")]);
        assert_eq!(cache.get("last_20_notes"), Some(vec![note(2, "two")]));
    }

    #[test]
    fn disabled_cache_always_misses_and_ignores_writes() {
        let cache = RecentNotesCache::disabled();
        cache.put("last_20_notes", &[note(1, "one")]);
        assert_eq!(cache.get("last_20_notes"), None);
        cache.invalidate("last_20_notes");
    }

    #[test]
    fn failing_backend_degrades_to_a_miss() {
        let cache = RecentNotesCache::new(Arc::new(FailingBackend), 60);
        cache.put("last_20_notes", &[note(1, "one")]);
        assert_eq!(cache.get("last_20_notes"), None);
        cache.invalidate("last_20_notes");
    }
}
