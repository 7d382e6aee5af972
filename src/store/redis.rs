//! Redis-backed store for production deployments.
//!
//! The draw runs as a Lua script so the random pick, the pool removal and
//! the current-slot write execute as one server-side step; the attempt
//! marker maps to `SET NX EX`; hash writes pair with their expiry in an
//! atomic pipeline.

use super::{KvStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

const DRAW_SCRIPT: &str = r#"
local member = redis.call('SRANDMEMBER', KEYS[1])
if not member then
  return nil
end
local payload = redis.call('GET', member)
if not payload then
  return redis.error_reply('missing payload: ' .. member)
end
redis.call('SREM', KEYS[1], member)
redis.call('SET', KEYS[2], payload)
return payload
"#;

const INCR_IF_EXISTS_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return redis.call('INCRBY', KEYS[1], ARGV[1])
end
return false
"#;

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Connect lazily to the given Redis URL (e.g. `redis://localhost:6379`).
    pub fn open(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(backend)?;
        Ok(Self { client })
    }

    async fn conn(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// TTLs round down to whole seconds; Redis rejects zero, so sub-second
/// durations become one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(backend)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.set(key, value).await.map_err(backend)?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.set_ex(key, value, ttl_secs(ttl)).await.map_err(backend)?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(reply.is_some())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(key).await.map_err(backend)?;
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.sadd(key, member).await.map_err(backend)?;
        Ok(())
    }

    async fn scard(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.conn().await?;
        let count: u64 = conn.scard(key).await.map_err(backend)?;
        Ok(count)
    }

    async fn draw_into(&self, set_key: &str, dest_key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn().await?;
        let payload: Option<String> = redis::Script::new(DRAW_SCRIPT)
            .key(set_key)
            .key(dest_key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                if e.to_string().contains("missing payload") {
                    StoreError::Corrupt(set_key.to_string())
                } else {
                    backend(e)
                }
            })?;
        Ok(payload)
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let pattern = format!("{prefix}*");
        let mut iter: redis::AsyncIter<'_, String> =
            conn.scan_match(pattern).await.map_err(backend)?;
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn hset_all_ex(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Duration,
    ) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(key, fields)
            .ignore()
            .expire(key, ttl_secs(ttl) as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = conn.hgetall(key).await.map_err(backend)?;
        Ok(fields)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut conn = self.conn().await?;
        let value: i64 = conn.incr(key, delta).await.map_err(backend)?;
        Ok(value)
    }

    async fn incr_by_if_exists(&self, key: &str, delta: i64) -> StoreResult<Option<i64>> {
        let mut conn = self.conn().await?;
        let value: Option<i64> = redis::Script::new(INCR_IF_EXISTS_SCRIPT)
            .key(key)
            .arg(delta)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(value)
    }
}
