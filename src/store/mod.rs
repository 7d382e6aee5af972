//! Shared key-value store contract.
//!
//! All cross-handler coordination goes through this trait: there is no
//! in-process shared game state, so every concurrency-sensitive sequence is
//! exposed as a single trait method that implementations must make
//! indivisible. Callers never compose check-then-act sequences themselves.

mod memory;
mod redis;

pub use self::redis::RedisStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(String),

    /// A key that should hold a well-formed entry does not (e.g. a pool
    /// member without its payload). Surfaced, never swallowed.
    #[error("corrupt store entry at {0}")]
    Corrupt(String),
}

/// Transactional key-value store.
///
/// Two methods carry the correctness of the whole engine and MUST be atomic
/// in every implementation, per the documented contract on each:
/// [`KvStore::draw_into`] and [`KvStore::set_nx_ex`].
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Plain set; clears any previous expiry on the key.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Set with expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Guarded set: writes `value` with `ttl` only if the key does not exist,
    /// returning whether the write happened. This is a single store-side
    /// operation: of two concurrent callers exactly one observes `true`.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Delete a key. Deleting a missing key is a no-op.
    async fn del(&self, key: &str) -> StoreResult<()>;

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()>;

    async fn scard(&self, key: &str) -> StoreResult<u64>;

    /// Atomic draw: pick a random member of the set at `set_key`, treat the
    /// member as a key and copy that key's value to `dest_key`, remove the
    /// member from the set, and return the value. Returns `Ok(None)` when the
    /// set is empty or missing. Competing calls never both succeed on the
    /// same member. A member whose value key is missing is
    /// [`StoreError::Corrupt`].
    async fn draw_into(&self, set_key: &str, dest_key: &str) -> StoreResult<Option<String>>;

    /// All keys starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Write hash fields and set the key's expiry as one unit.
    async fn hset_all_ex(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Duration,
    ) -> StoreResult<()>;

    /// All fields of a hash; empty map when the key is missing or expired.
    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Increment an integer value, creating it at 0 first if missing.
    /// Returns the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> StoreResult<i64>;

    /// Increment only while the key still exists; `None` once it has expired
    /// or was never created.
    async fn incr_by_if_exists(&self, key: &str, delta: i64) -> StoreResult<Option<i64>>;
}
