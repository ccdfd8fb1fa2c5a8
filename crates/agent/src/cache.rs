use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use taskroute_core::{CacheStats, Error, PerformanceMode, Result};
use tracing::debug;

use crate::preprocess::TextPreprocessor;

/// Deterministic key for `(query, mode)`. Queries differing only in case or
/// whitespace share a key; different modes never do.
pub fn cache_key(query: &str, mode: PerformanceMode) -> String {
    let normalized = TextPreprocessor::new().normalize(query);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"::");
    hasher.update(mode.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let age_ms = (now - self.created_at).num_milliseconds() as i128;
        age_ms > self.ttl_seconds as i128 * 1000
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// In-memory response cache with per-entry TTL and hit/miss counters.
#[derive(Default)]
pub struct CacheManager {
    state: Mutex<CacheState>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("cache lock poisoned".to_string()))
    }

    /// Look a key up. Absent and expired entries count as misses; an expired
    /// entry is evicted.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.lock()?;
        let now = Utc::now();

        let fresh = state
            .entries
            .get(key)
            .map(|e| (!e.is_expired_at(now)).then(|| e.value.clone()));

        match fresh {
            Some(Some(value)) => {
                state.hits += 1;
                return Ok(Some(value));
            }
            Some(None) => {
                state.entries.remove(key);
                debug!(key = %key, "Evicted expired cache entry");
            }
            None => {}
        }
        state.misses += 1;
        Ok(None)
    }

    /// Insert or overwrite. Stats are untouched.
    pub fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut state = self.lock()?;
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value: value.to_string(),
                created_at: Utc::now(),
                ttl_seconds: ttl.as_secs(),
            },
        );
        Ok(())
    }

    /// Drop every entry and zero the counters.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        *state = CacheState::default();
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let state = self.lock()?;
        Ok(CacheStats {
            hits: state.hits,
            misses: state.misses,
            keys: state.entries.len(),
        })
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state.entries.keys().cloned().collect())
    }

    /// Remove expired entries without touching the counters.
    pub fn sweep_expired(&self) -> Result<usize> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let before = state.entries.len();
        state.entries.retain(|_, e| !e.is_expired_at(now));
        Ok(before - state.entries.len())
    }
}
