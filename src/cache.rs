//! Two-tier thumbnail cache.
//!
//! Letterboxing is cheap next to fetching a multi-megabyte source over the
//! network, so the cache exists to avoid refetching. It has two tiers:
//!
//! - **Local tier**: a small in-process map of decoded bitmaps, bounded by
//!   `[cache] capacity`. Hits are handed out as `Arc<Bitmap>` without copying
//!   pixels.
//! - **Remote tier**: an [`ObjectStore`] holding the encoded JPEG for every
//!   thumbnail ever produced. Nothing is deleted from it, so it catches
//!   whatever the local tier has evicted.
//!
//! # Eviction
//!
//! The local tier is FIFO on insert, not LRU: reading an entry does not
//! refresh it. After every insert the oldest entries are dropped until the
//! tier is back within capacity. Storing a key that is already resident
//! replaces the bitmap and moves the key to the newest position.
//!
//! # Failure handling
//!
//! The remote tier is a best-effort backstop. A failed `get` (or bytes that
//! no longer decode) is logged and treated as a miss; a failed `put` is
//! logged and reported through the return value of [`CacheManager::store`],
//! never as an error.
//!
//! # Locking
//!
//! Local state sits behind a `std::sync::Mutex`. Each insert-then-evict runs
//! under a single acquisition and no guard lives across an `.await`.

use crate::imaging::{Bitmap, ImageBackend};
use crate::naming::CacheKey;
use crate::remote::ObjectStore;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Bounded, insertion-ordered map of decoded thumbnails.
#[derive(Debug)]
pub struct LocalTier {
    capacity: usize,
    order: VecDeque<CacheKey>,
    entries: HashMap<CacheKey, Arc<Bitmap>>,
}

impl LocalTier {
    /// A capacity of zero is raised to one so a fresh insert is always
    /// readable until the next one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            entries: HashMap::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Bitmap>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert `bitmap` as the newest entry and return the evicted keys,
    /// oldest first.
    pub fn insert(&mut self, key: CacheKey, bitmap: Arc<Bitmap>) -> Vec<CacheKey> {
        if self.entries.insert(key.clone(), bitmap).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted.push(oldest);
        }
        evicted
    }

    /// Resident keys, oldest first.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.order.iter().cloned().collect()
    }
}

/// Where lookups were answered from since the manager was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub local_hits: u64,
    pub remote_hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.local_hits
            .saturating_add(self.remote_hits)
            .saturating_add(self.misses)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local_hits > 0 || self.remote_hits > 0 {
            write!(
                f,
                "{} local, {} remote, {} computed ({} total)",
                self.local_hits,
                self.remote_hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} computed", self.misses)
        }
    }
}

enum Outcome {
    Local,
    Remote,
    Miss,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct CacheManager {
    local: Mutex<LocalTier>,
    stats: Mutex<CacheStats>,
    remote: Arc<dyn ObjectStore>,
    backend: Arc<dyn ImageBackend>,
}

impl CacheManager {
    /// `backend` decodes bytes coming back from the remote tier.
    pub fn new(
        capacity: usize,
        remote: Arc<dyn ObjectStore>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        Self {
            local: Mutex::new(LocalTier::new(capacity)),
            stats: Mutex::new(CacheStats::default()),
            remote,
            backend,
        }
    }

    /// Find the thumbnail for `key`, local tier first.
    ///
    /// A remote hit is decoded and promoted into the local tier. Remote
    /// failures degrade to `None`.
    pub async fn lookup(&self, key: &CacheKey) -> Option<Arc<Bitmap>> {
        let resident = lock(&self.local).get(key);
        if let Some(bitmap) = resident {
            debug!(%key, "local cache hit");
            self.record(Outcome::Local);
            return Some(bitmap);
        }

        let bytes = match self.remote.get(key.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%key, "cache miss");
                self.record(Outcome::Miss);
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "remote cache lookup failed, treating as miss");
                self.record(Outcome::Miss);
                return None;
            }
        };

        let backend = Arc::clone(&self.backend);
        let decoded = tokio::task::spawn_blocking(move || backend.decode(&bytes)).await;
        let bitmap = match decoded {
            Ok(Ok(bitmap)) => Arc::new(bitmap),
            Ok(Err(e)) => {
                warn!(%key, error = %e, "remote cache object does not decode, treating as miss");
                self.record(Outcome::Miss);
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "remote cache decode task failed, treating as miss");
                self.record(Outcome::Miss);
                return None;
            }
        };

        debug!(%key, "remote cache hit");
        self.insert_local(key.clone(), Arc::clone(&bitmap));
        self.record(Outcome::Remote);
        Some(bitmap)
    }

    /// Make `bitmap` resident under `key` and persist `encoded` remotely.
    ///
    /// Returns whether the remote write succeeded. The local insert happens
    /// either way.
    pub async fn store(&self, key: &CacheKey, bitmap: Arc<Bitmap>, encoded: Vec<u8>) -> bool {
        self.insert_local(key.clone(), bitmap);

        match self.remote.put(key.as_str(), encoded).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%key, error = %e, "failed to persist thumbnail to remote cache");
                false
            }
        }
    }

    fn insert_local(&self, key: CacheKey, bitmap: Arc<Bitmap>) {
        let evicted = lock(&self.local).insert(key, bitmap);
        for old in evicted {
            debug!(key = %old, "evicted from local cache");
        }
    }

    fn record(&self, outcome: Outcome) {
        let mut stats = lock(&self.stats);
        match outcome {
            Outcome::Local => stats.local_hits = stats.local_hits.saturating_add(1),
            Outcome::Remote => stats.remote_hits = stats.remote_hits.saturating_add(1),
            Outcome::Miss => stats.misses = stats.misses.saturating_add(1),
        }
    }

    /// Number of resident local entries.
    pub fn len(&self) -> usize {
        lock(&self.local).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is resident in the local tier. Does not consult the
    /// remote tier.
    pub fn contains(&self, key: &CacheKey) -> bool {
        lock(&self.local).contains(key)
    }

    /// Resident local keys, oldest first.
    pub fn keys(&self) -> Vec<CacheKey> {
        lock(&self.local).keys()
    }

    pub fn stats(&self) -> CacheStats {
        *lock(&self.stats)
    }
}
