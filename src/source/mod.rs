//! Clue content provider.
//!
//! The provider is remote and treated as unreliable: game assembly skips a
//! category or clue on any error here, it never fails the build.

mod jservice;

pub use jservice::JServiceClient;

use crate::clue::RawClue;
use async_trait::async_trait;

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider response parsing failed: {0}")]
    Parse(String),
}

#[async_trait]
pub trait ClueSource: Send + Sync {
    /// All raw clues of one category.
    async fn fetch_category_clues(&self, category_id: u32) -> SourceResult<Vec<RawClue>>;

    /// One arbitrary clue.
    async fn fetch_random_clue(&self) -> SourceResult<RawClue>;
}
