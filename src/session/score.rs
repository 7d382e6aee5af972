//! Scoreboard assembly.

use super::GameSession;
use crate::ledger::{self, ScoreLedger};
use crate::store::KvStore;
use crate::GameResult;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreboardEntry {
    pub user_id: String,
    pub score: i64,
}

impl GameSession {
    /// Every user who scored in this game, highest total first. Users whose
    /// deltas cancelled out to zero still appear.
    pub async fn scoreboard(&self) -> GameResult<Vec<ScoreboardEntry>> {
        let prefix = ledger::score_prefix(&self.id);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for key in self.store.scan_prefix(&prefix).await? {
            let Some(user_id) = key.strip_prefix(&prefix) else {
                continue;
            };
            if !seen.insert(user_id.to_string()) {
                continue;
            }
            let score = self.ledger.get_score(&self.id, user_id).await?;
            entries.push(ScoreboardEntry {
                user_id: user_id.to_string(),
                score,
            });
        }
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        tracing::debug!(game = %self.id, players = entries.len(), "scoreboard assembled");
        Ok(entries)
    }

    /// One user's running total; 0 if they never scored.
    pub async fn user_score(&self, user_id: &str) -> GameResult<i64> {
        Ok(self.ledger.get_score(&self.id, user_id).await?)
    }
}
