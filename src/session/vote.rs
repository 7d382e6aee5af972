//! Category votes.
//!
//! A vote is a short-lived counter keyed by the chat message that opened it.
//! The counter expires on its own; casting a vote after expiry reports the
//! vote as closed instead of resurrecting the counter.

use super::GameSession;
use crate::store::KvStore;
use crate::GameResult;
use std::time::Duration;

/// How long a vote stays open.
const VOTE_WINDOW: Duration = Duration::from_secs(2 * 60);

impl GameSession {
    fn vote_key(&self, message_id: &str) -> String {
        format!("game:{}:vote:{}", self.id, message_id)
    }

    /// Open a vote tied to a chat message. Re-opening an existing vote
    /// resets its tally and window.
    pub async fn start_category_vote(&self, message_id: &str) -> GameResult<()> {
        self.store
            .set_ex(&self.vote_key(message_id), "0", VOTE_WINDOW)
            .await?;
        tracing::debug!(game = %self.id, message_id, "category vote opened");
        Ok(())
    }

    /// Apply a vote delta and return the running tally, or `None` when the
    /// vote has expired or never existed.
    pub async fn cast_vote(&self, message_id: &str, delta: i64) -> GameResult<Option<i64>> {
        let tally = self
            .store
            .incr_by_if_exists(&self.vote_key(message_id), delta)
            .await?;
        Ok(tally)
    }
}
