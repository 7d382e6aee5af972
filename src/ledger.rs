//! Per-user score ledger.
//!
//! The session decides sign and magnitude of every delta; the ledger only
//! accumulates. [`KvLedger`] keeps totals in the shared store under
//! `game_score:{game}:{user}` so the scoreboard can discover participants by
//! prefix scan.

use crate::store::{KvStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::sync::Arc;

pub(crate) fn score_prefix(game_id: &str) -> String {
    format!("game_score:{game_id}:")
}

fn score_key(game_id: &str, user_id: &str) -> String {
    format!("game_score:{game_id}:{user_id}")
}

#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Apply a signed delta to a user's running total for a game and return
    /// the new total. `was_correct` is carried for ledgers that keep richer
    /// per-channel statistics.
    async fn apply_delta(
        &self,
        game_id: &str,
        channel: &str,
        user_id: &str,
        amount: i64,
        was_correct: bool,
    ) -> StoreResult<i64>;

    /// Running total for a user; 0 if the user never scored.
    async fn get_score(&self, game_id: &str, user_id: &str) -> StoreResult<i64>;
}

/// Store-backed accumulator.
pub struct KvLedger {
    store: Arc<dyn KvStore>,
}

impl KvLedger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScoreLedger for KvLedger {
    async fn apply_delta(
        &self,
        game_id: &str,
        _channel: &str,
        user_id: &str,
        amount: i64,
        _was_correct: bool,
    ) -> StoreResult<i64> {
        self.store.incr_by(&score_key(game_id, user_id), amount).await
    }

    async fn get_score(&self, game_id: &str, user_id: &str) -> StoreResult<i64> {
        let key = score_key(game_id, user_id);
        match self.store.get(&key).await? {
            Some(value) => value.parse().map_err(|_| StoreError::Corrupt(key)),
            None => Ok(0),
        }
    }
}
