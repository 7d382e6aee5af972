//! Game session orchestration.
//!
//! One [`GameSession`] value is a cheap handle onto a game that lives
//! entirely in the shared store: any number of concurrent request handlers
//! may hold their own handle to the same game. Clue-pool assembly lives in
//! `build`, answer arbitration in `answer`, category voting in `vote` and
//! the scoreboard in `score`.

mod answer;
mod build;
mod score;
mod vote;

pub use answer::AnswerOutcome;
pub use score::ScoreboardEntry;

use crate::clue::Clue;
use crate::config::GameConfig;
use crate::ledger::ScoreLedger;
use crate::pool::CluePool;
use crate::source::ClueSource;
use crate::store::KvStore;
use crate::GameResult;
use std::sync::Arc;

/// Which assembly strategy a new game uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Up to 6 categories of 5 clues each, sampled from the category universe.
    Standard,
    /// Best-effort pool from 30 independent random-clue fetches.
    Random,
}

pub struct GameSession {
    id: String,
    channel: String,
    config: GameConfig,
    store: Arc<dyn KvStore>,
    source: Arc<dyn ClueSource>,
    ledger: Arc<dyn ScoreLedger>,
    pool: CluePool,
    categories: Vec<String>,
}

impl GameSession {
    /// Build and persist a new game for a channel. The id is the creation
    /// timestamp in unix millis, so game ids sort chronologically.
    pub async fn create(
        channel: &str,
        mode: GameMode,
        config: GameConfig,
        store: Arc<dyn KvStore>,
        source: Arc<dyn ClueSource>,
        ledger: Arc<dyn ScoreLedger>,
    ) -> GameResult<Self> {
        let id = chrono::Utc::now().timestamp_millis().to_string();
        let mut session = Self::resume(channel, &id, config, store, source, ledger);
        match mode {
            GameMode::Standard => session.build_standard_game().await?,
            GameMode::Random => session.build_random_game().await?,
        }
        Ok(session)
    }

    /// Re-attach to an existing game. Handlers are stateless, so any request
    /// may arrive at a process that has never seen this game before.
    pub fn resume(
        channel: &str,
        id: &str,
        config: GameConfig,
        store: Arc<dyn KvStore>,
        source: Arc<dyn ClueSource>,
        ledger: Arc<dyn ScoreLedger>,
    ) -> Self {
        Self {
            id: id.to_string(),
            channel: channel.to_string(),
            config,
            pool: CluePool::new(store.clone(), id),
            store,
            source,
            ledger,
            categories: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Display titles of the categories a standard build selected, in the
    /// order they were accepted. Empty for random and resumed games.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Open the next clue: atomically moves one clue from the pool into the
    /// current slot. `None` when the pool is exhausted.
    pub async fn next_clue(&self) -> GameResult<Option<Clue>> {
        let drawn = self.pool.draw_next().await?;
        if let Some(clue) = &drawn {
            tracing::info!(game = %self.id, clue = clue.id, value = clue.value, "clue opened");
        }
        Ok(drawn)
    }

    /// The clue currently open for answers, if any.
    pub async fn current_clue(&self) -> GameResult<Option<Clue>> {
        self.pool.current().await
    }

    /// Fetch one clue of this game by id.
    pub async fn get_clue(&self, clue_id: i64) -> GameResult<Option<Clue>> {
        self.pool.get(clue_id).await
    }

    /// Explicitly resolve the current clue without scoring (skip).
    pub async fn mark_answered(&self) -> GameResult<()> {
        self.pool.clear_current().await
    }

    pub async fn remaining_clue_count(&self) -> GameResult<u64> {
        self.pool.remaining_count().await
    }

    /// Delete every key this game owns. Safe to call repeatedly.
    pub async fn cleanup(&self) -> GameResult<()> {
        tracing::info!(game = %self.id, "cleaning up game");
        self.pool.cleanup().await
    }
}
