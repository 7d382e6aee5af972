//! Game session engine for a chat-bot trivia game.
//!
//! Runs one round of a multiplayer trivia game: assembles a pool of clues
//! from a remote content provider, reveals them one at a time, arbitrates
//! concurrent free-text guesses at-most-once per user per clue, judges them
//! with a fuzzy bigram match, and tracks per-player scores. All game state
//! lives in a shared key-value store so stateless handlers can serve one
//! game and survive process restarts; the embedding bot owns all user-facing
//! I/O.

pub mod clue;
pub mod config;
pub mod ledger;
pub mod matcher;
pub mod pool;
pub mod session;
pub mod source;
pub mod store;

pub use clue::{clean_clue, Clue, RawClue};
pub use config::GameConfig;
pub use session::{AnswerOutcome, GameMode, GameSession};

use store::StoreError;

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A persisted clue payload failed to parse. Arbitrating against
    /// malformed state would be wrong, so this is surfaced, not swallowed.
    #[error("corrupt clue payload: {0}")]
    Corrupt(#[from] serde_json::Error),
}
