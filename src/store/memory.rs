//! In-process store for tests and single-process deployments.
//!
//! Every trait method takes the one mutex for its whole body, which makes
//! each method trivially atomic. Expired entries are dropped lazily on
//! access.

use super::{KvStore, StoreError, StoreResult};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Default)]
struct Shelf {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
    expiries: HashMap<String, Instant>,
}

impl Shelf {
    /// Drop the entry behind `key` if its expiry has passed.
    fn purge(&mut self, key: &str) {
        if let Some(deadline) = self.expiries.get(key) {
            if Instant::now() >= *deadline {
                self.expiries.remove(key);
                self.strings.remove(key);
                self.hashes.remove(key);
                self.sets.remove(key);
            }
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.strings.contains_key(key) || self.hashes.contains_key(key) || self.sets.contains_key(key)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Shelf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        Ok(shelf.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut shelf = self.inner.lock().await;
        // Replaces the key whatever type it held, matching Redis SET
        shelf.expiries.remove(key);
        shelf.hashes.remove(key);
        shelf.sets.remove(key);
        shelf.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut shelf = self.inner.lock().await;
        shelf.strings.insert(key.to_string(), value.to_string());
        shelf.expiries.insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        if shelf.exists(key) {
            return Ok(false);
        }
        shelf.strings.insert(key.to_string(), value.to_string());
        shelf.expiries.insert(key.to_string(), Instant::now() + ttl);
        Ok(true)
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        let mut shelf = self.inner.lock().await;
        shelf.expiries.remove(key);
        shelf.strings.remove(key);
        shelf.hashes.remove(key);
        shelf.sets.remove(key);
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        shelf
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn scard(&self, key: &str) -> StoreResult<u64> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        Ok(shelf.sets.get(key).map(|s| s.len() as u64).unwrap_or(0))
    }

    async fn draw_into(&self, set_key: &str, dest_key: &str) -> StoreResult<Option<String>> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(set_key);

        let member = {
            let Some(members) = shelf.sets.get(set_key) else {
                return Ok(None);
            };
            if members.is_empty() {
                return Ok(None);
            }
            let pick = rand::rng().random_range(0..members.len());
            members.iter().nth(pick).cloned()
        };
        let Some(member) = member else {
            return Ok(None);
        };

        let Some(value) = shelf.strings.get(&member).cloned() else {
            return Err(StoreError::Corrupt(member));
        };
        if let Some(members) = shelf.sets.get_mut(set_key) {
            members.remove(&member);
            if members.is_empty() {
                shelf.sets.remove(set_key);
            }
        }
        shelf.expiries.remove(dest_key);
        shelf.strings.insert(dest_key.to_string(), value.clone());
        Ok(Some(value))
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut shelf = self.inner.lock().await;
        let expired: Vec<String> = shelf
            .expiries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in expired {
            shelf.purge(&key);
        }
        let mut keys: Vec<String> = shelf
            .strings
            .keys()
            .chain(shelf.hashes.keys())
            .chain(shelf.sets.keys())
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn hset_all_ex(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Duration,
    ) -> StoreResult<()> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        let hash = shelf.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.to_string(), value.clone());
        }
        shelf.expiries.insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        Ok(shelf.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        let current = match shelf.strings.get(key) {
            Some(v) => v
                .parse::<i64>()
                .map_err(|_| StoreError::Corrupt(key.to_string()))?,
            None => 0,
        };
        let next = current + delta;
        shelf.strings.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn incr_by_if_exists(&self, key: &str, delta: i64) -> StoreResult<Option<i64>> {
        let mut shelf = self.inner.lock().await;
        shelf.purge(key);
        if !shelf.strings.contains_key(key) {
            return Ok(None);
        }
        let current = shelf
            .strings
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| StoreError::Corrupt(key.to_string()))?;
        let next = current + delta;
        shelf.strings.insert(key.to_string(), next.to_string());
        Ok(Some(next))
    }
}
