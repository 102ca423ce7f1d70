//! In-process object store.
//!
//! Selected with `[store] backend = "memory"`. Objects live as long as the
//! process, which makes it a second local tier rather than a durable one;
//! useful for development and as the test double for the cache manager.

use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    buckets: Mutex<HashSet<String>>,
    created: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail (or succeed again).
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `get` fail (or succeed again).
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Number of `put` calls, including failed ones.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `get` calls, including failed ones.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets created through [`ObjectStore::create_bucket`], in call order.
    pub fn created_buckets(&self) -> Vec<String> {
        lock(&self.created).clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Request(format!("put {key}: injected failure")));
        }
        lock(&self.objects).insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Request(format!("get {key}: injected failure")));
        }
        Ok(lock(&self.objects).get(key).cloned())
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.buckets).contains(name))
    }

    async fn create_bucket(&self, name: &str) -> Result<(), StoreError> {
        lock(&self.buckets).insert(name.to_string());
        lock(&self.created).push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = MemoryObjectStore::new();
        store.put("k", vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.get_count(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryObjectStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_put_failure_stores_nothing() {
        let store = MemoryObjectStore::new();
        store.fail_puts(true);
        assert!(store.put("k", vec![1]).await.is_err());
        assert!(store.is_empty());

        store.fail_puts(false);
        store.put("k", vec![1]).await.unwrap();
        assert!(store.contains("k"));
    }

    #[tokio::test]
    async fn injected_get_failure_errors() {
        let store = MemoryObjectStore::new();
        store.put("k", vec![1]).await.unwrap();
        store.fail_gets(true);
        assert!(matches!(store.get("k").await, Err(StoreError::Request(_))));
    }
}
