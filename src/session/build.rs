//! Game assembly: pulling raw clues from the provider, normalizing them and
//! populating the pool. Provider failures are never fatal here: a thin or
//! lopsided pool is a degraded game, not an error.

use super::GameSession;
use crate::clue::{clean_clue, Clue};
use crate::source::ClueSource;
use crate::GameResult;
use rand::Rng;

/// Candidate categories sampled per standard game. Only 6 are used; the
/// surplus absorbs categories that turn out to be empty or unusable.
const CANDIDATE_CATEGORIES: usize = 12;

/// Categories a standard game plays with.
const TARGET_CATEGORIES: usize = 6;

/// Clues per category: one air date's worth.
const CLUES_PER_CATEGORY: usize = 5;

/// Independent fetches a random game attempts.
const RANDOM_GAME_FETCHES: usize = 30;

fn random_below(n: usize) -> usize {
    rand::rng().random_range(0..n)
}

impl GameSession {
    /// Assemble a standard game: sample candidate categories, take one
    /// air-date block of 5 clues from each usable one, stop at 6 categories.
    /// Fewer than 6 is accepted.
    pub(super) async fn build_standard_game(&mut self) -> GameResult<()> {
        let universe = self.config.max_category_id.max(1);
        let mut candidates: Vec<u32> = (0..CANDIDATE_CATEGORIES)
            .map(|_| random_below(universe as usize) as u32)
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut accepted = 0usize;
        for category in candidates {
            let clues = match self.source.fetch_category_clues(category).await {
                Ok(clues) => clues,
                Err(e) => {
                    tracing::warn!(category, error = %e, "skipping category: fetch failed");
                    continue;
                }
            };
            if clues.is_empty() {
                continue;
            }

            // Clues of one category span many air dates of mixed difficulty;
            // take a contiguous block of 5 from one random date.
            let mut dated = clues;
            dated.sort_by(|a, b| a.airdate.cmp(&b.airdate));
            let blocks = dated.len() / CLUES_PER_CATEGORY;
            let offset = if blocks > 0 {
                random_below(blocks) * CLUES_PER_CATEGORY
            } else {
                0
            };

            let selected: Vec<Clue> = dated
                .iter()
                .skip(offset)
                .take(CLUES_PER_CATEGORY)
                .filter_map(clean_clue)
                .collect();
            if selected.is_empty() {
                continue;
            }

            self.categories.push(selected[0].category.clone());
            self.pool.populate(&selected).await?;
            accepted += 1;
            if accepted >= TARGET_CATEGORIES {
                break;
            }
        }

        tracing::info!(
            game = %self.id,
            categories = accepted,
            clues = self.pool.remaining_count().await?,
            "standard game assembled"
        );
        Ok(())
    }

    /// Assemble a random game: 30 independent random-clue fetches, keep
    /// whatever survives normalization.
    pub(super) async fn build_random_game(&mut self) -> GameResult<()> {
        let fetches = (0..RANDOM_GAME_FETCHES).map(|_| self.source.fetch_random_clue());
        let results = futures::future::join_all(fetches).await;

        let survivors: Vec<Clue> = results
            .into_iter()
            .filter_map(|result| match result {
                Ok(raw) => clean_clue(&raw),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping random clue: fetch failed");
                    None
                }
            })
            .collect();

        self.pool.populate(&survivors).await?;
        tracing::info!(game = %self.id, clues = survivors.len(), "random game assembled");
        Ok(())
    }
}
