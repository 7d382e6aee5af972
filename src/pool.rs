//! Clue pool and current-slot state for one game.
//!
//! The pool set holds the keys of not-yet-presented clues; the current slot
//! holds at most one open clue. A clue id lives in at most one of the two at
//! any time; the atomic draw in the store contract is what keeps that true
//! under concurrent handlers.

use crate::clue::Clue;
use crate::store::KvStore;
use crate::GameResult;
use std::sync::Arc;

pub struct CluePool {
    store: Arc<dyn KvStore>,
    game_id: String,
}

impl CluePool {
    pub fn new(store: Arc<dyn KvStore>, game_id: impl Into<String>) -> Self {
        Self {
            store,
            game_id: game_id.into(),
        }
    }

    fn clue_key(&self, clue_id: i64) -> String {
        format!("game_clue:{}:{}", self.game_id, clue_id)
    }

    fn clue_prefix(&self) -> String {
        format!("game_clue:{}:", self.game_id)
    }

    fn pool_key(&self) -> String {
        format!("game:{}:clues", self.game_id)
    }

    fn current_key(&self) -> String {
        format!("game:{}:current", self.game_id)
    }

    /// Persist clues and add them to the pool set.
    pub async fn populate(&self, clues: &[Clue]) -> GameResult<()> {
        for clue in clues {
            let key = self.clue_key(clue.id);
            let payload = serde_json::to_string(clue)?;
            self.store.set(&key, &payload).await?;
            self.store.sadd(&self.pool_key(), &key).await?;
        }
        Ok(())
    }

    /// Atomically move one arbitrary clue from the pool into the current
    /// slot. `None` once the pool is exhausted.
    pub async fn draw_next(&self) -> GameResult<Option<Clue>> {
        match self
            .store
            .draw_into(&self.pool_key(), &self.current_key())
            .await?
        {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// The clue currently open for answers, if any.
    pub async fn current(&self) -> GameResult<Option<Clue>> {
        match self.store.get(&self.current_key()).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Fetch one clue of this game by id, drawn or not.
    pub async fn get(&self, clue_id: i64) -> GameResult<Option<Clue>> {
        match self.store.get(&self.clue_key(clue_id)).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Resolve the current clue (answered or skipped).
    pub async fn clear_current(&self) -> GameResult<()> {
        self.store.del(&self.current_key()).await?;
        Ok(())
    }

    /// Clues left in the pool.
    pub async fn remaining_count(&self) -> GameResult<u64> {
        Ok(self.store.scard(&self.pool_key()).await?)
    }

    /// Delete every key this game owns. Safe to call repeatedly.
    pub async fn cleanup(&self) -> GameResult<()> {
        for key in self.store.scan_prefix(&self.clue_prefix()).await? {
            self.store.del(&key).await?;
        }
        self.store.del(&self.pool_key()).await?;
        self.store.del(&self.current_key()).await?;
        Ok(())
    }
}
