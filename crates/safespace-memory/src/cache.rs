// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response cache keyed by (user, personality, normalized message).
//!
//! Entries expire after a fixed time-to-live and the cache evicts the least
//! recently used entry when full. A miss never changes behavior, only cost.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use safespace_core::PersonalityId;

/// Default maximum number of cached replies.
pub const DEFAULT_CAPACITY: usize = 200;

/// Default time-to-live of a cached reply.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key. The message is trimmed; case is preserved.
    pub fn new(user_id: &str, personality: PersonalityId, message: &str) -> Self {
        Self(format!("{user_id}::{personality}::{}", message.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct CachedReply {
    reply: String,
    stored_at: Instant,
}

/// LRU cache of complete assistant replies with per-entry expiry.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<LruCache<CacheKey, CachedReply>>,
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` replies (minimum 1) for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Shorthand for [`CacheKey::new`].
    pub fn key(user_id: &str, personality: PersonalityId, message: &str) -> CacheKey {
        CacheKey::new(user_id, personality, message)
    }

    /// Look up a live reply, marking it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    /// Insert or refresh a reply, restarting its time-to-live.
    pub fn put(&self, key: CacheKey, reply: impl Into<String>) {
        self.put_at(key, reply.into(), Instant::now());
    }

    /// Number of entries currently held, including ones not yet found expired.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn get_at(&self, key: &CacheKey, now: Instant) -> Option<String> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if now.saturating_duration_since(entry.stored_at) < self.ttl => {
                return Some(entry.reply.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            tracing::debug!(key = %key, "cached reply expired");
        }
        None
    }

    fn put_at(&self, key: CacheKey, reply: String, now: Instant) {
        let mut entries = self.lock();
        if let Some((evicted, _)) = entries.push(
            key.clone(),
            CachedReply {
                reply,
                stored_at: now,
            },
        ) && evicted != key
        {
            tracing::debug!(key = %evicted, "cache full, evicted least recently used reply");
        }
    }

    // A panic while holding the lock cannot leave an entry half-written, so a
    // poisoned mutex is still safe to use.
    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CachedReply>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
