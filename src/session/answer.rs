//! Answer arbitration.
//!
//! Judging is at-most-once per (user, clue): the attempt marker is written
//! with a store-side not-exists guard, so of any number of near-simultaneous
//! guesses from one user exactly one is judged and the rest come back as
//! duplicates. Every judged attempt leaves a short-lived review record that
//! a moderator can act on.

use super::GameSession;
use crate::clue::Clue;
use crate::ledger::ScoreLedger;
use crate::matcher;
use crate::store::{KvStore, StoreError};
use crate::{GameError, GameResult};
use std::time::Duration;

/// How long a judged attempt stays reviewable by a moderator.
const REVIEW_TTL: Duration = Duration::from_secs(600);

/// Outcome of one answer attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// This user already had a judged attempt for the current clue.
    pub duplicate: bool,
    pub correct: bool,
    /// There was no open clue to answer. Not an error; it simply means
    /// someone else resolved the clue first.
    pub clue_gone: bool,
    /// Signed amount forwarded to the ledger; 0 when nothing was judged.
    pub score_delta: i64,
}

impl GameSession {
    fn attempt_key(&self, user_id: &str, clue_id: i64) -> String {
        format!("attempt:{}:{}:{}", self.id, user_id, clue_id)
    }

    fn response_key(&self, user_id: &str, timestamp: &str) -> String {
        format!("response:{}:{}:{}", self.id, user_id, timestamp)
    }

    /// Judge a user's guess against the current clue.
    ///
    /// `timestamp` is the opaque message timestamp from the chat platform;
    /// it keys the review record for [`GameSession::moderator_adjust`].
    pub async fn attempt_answer(
        &self,
        user_id: &str,
        guess: &str,
        timestamp: &str,
    ) -> GameResult<AnswerOutcome> {
        let Some(clue) = self.pool.current().await? else {
            return Ok(AnswerOutcome {
                clue_gone: true,
                ..AnswerOutcome::default()
            });
        };

        // The marker must outlive the answer window so a late duplicate
        // within the window is still caught.
        let fresh = self
            .store
            .set_nx_ex(
                &self.attempt_key(user_id, clue.id),
                "",
                self.config.answer_window * 2,
            )
            .await?;
        if !fresh {
            return Ok(AnswerOutcome {
                duplicate: true,
                ..AnswerOutcome::default()
            });
        }

        let judgement = matcher::judge(&clue, guess, self.config.similarity_threshold);
        tracing::debug!(
            game = %self.id,
            user = user_id,
            clue = clue.id,
            guess = %judgement.normalized_guess,
            similarity = judgement.similarity,
            alt_similarity = ?judgement.alt_similarity,
            correct = judgement.correct,
            "answer judged"
        );

        let delta = if judgement.correct {
            clue.value
        } else {
            -clue.value
        };
        self.ledger
            .apply_delta(&self.id, &self.channel, user_id, delta, judgement.correct)
            .await?;

        if judgement.correct {
            self.pool.clear_current().await?;
        }
        self.record_answer(user_id, &clue, judgement.correct, timestamp)
            .await?;

        Ok(AnswerOutcome {
            correct: judgement.correct,
            score_delta: delta,
            ..AnswerOutcome::default()
        })
    }

    async fn record_answer(
        &self,
        user_id: &str,
        clue: &Clue,
        correct: bool,
        timestamp: &str,
    ) -> GameResult<()> {
        let fields = [
            ("clue_id", clue.id.to_string()),
            ("value", clue.value.to_string()),
            ("correct", correct.to_string()),
        ];
        self.store
            .hset_all_ex(&self.response_key(user_id, timestamp), &fields, REVIEW_TTL)
            .await?;
        Ok(())
    }

    /// Moderator override of a recorded answer, looked up by the message
    /// timestamp of the original attempt. Unknown or expired records are a
    /// silent no-op.
    ///
    /// With `reset` the original signed value is applied with correctness
    /// inverted; otherwise double the value is, which both cancels the
    /// original delta and applies its opposite. The record is deleted before
    /// the delta so repeated invocations cannot stack adjustments.
    pub async fn moderator_adjust(
        &self,
        user_id: &str,
        timestamp: &str,
        reset: bool,
    ) -> GameResult<()> {
        let key = self.response_key(user_id, timestamp);
        let record = self.store.hgetall(&key).await?;
        if record.is_empty() {
            return Ok(());
        }

        let value: i64 = record
            .get("value")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| GameError::Store(StoreError::Corrupt(key.clone())))?;
        let was_correct = record.get("correct").map(|c| c == "true").unwrap_or(false);

        self.store.del(&key).await?;

        let magnitude = if reset { value } else { value * 2 };
        let now_correct = !was_correct;
        let delta = if now_correct { magnitude } else { -magnitude };
        self.ledger
            .apply_delta(&self.id, &self.channel, user_id, delta, now_correct)
            .await?;

        tracing::info!(
            game = %self.id,
            user = user_id,
            timestamp,
            reset,
            delta,
            "moderator score adjustment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{sample_clue, session_with_clues};

    #[tokio::test]
    async fn test_correct_answer_scores_and_resolves() {
        let (store, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();

        let outcome = session
            .attempt_answer("alice", "What is Paris?", "111.1")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome {
                correct: true,
                score_delta: 200,
                ..AnswerOutcome::default()
            }
        );
        assert!(session.current_clue().await.unwrap().is_none());
        assert_eq!(
            store.get("game_score:g1:alice").await.unwrap(),
            Some("200".to_string())
        );
    }

    #[tokio::test]
    async fn test_wrong_answer_deducts_and_keeps_clue_open() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();

        let outcome = session
            .attempt_answer("bob", "London", "222.2")
            .await
            .unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.score_delta, -200);
        assert!(session.current_clue().await.unwrap().is_some());
        assert_eq!(session.user_score("bob").await.unwrap(), -200);
    }

    #[tokio::test]
    async fn test_no_current_clue_never_touches_ledger() {
        let (store, session) = session_with_clues(&[sample_clue(1)]).await;
        // nothing drawn yet
        let outcome = session
            .attempt_answer("alice", "paris", "333.3")
            .await
            .unwrap();
        assert!(outcome.clue_gone);
        assert_eq!(outcome.score_delta, 0);
        assert!(store
            .scan_prefix("game_score:g1:")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_same_user_second_attempt_is_duplicate() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();

        let first = session
            .attempt_answer("alice", "london", "1.0")
            .await
            .unwrap();
        let second = session
            .attempt_answer("alice", "paris", "2.0")
            .await
            .unwrap();
        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert!(!second.correct);
        // Only the first attempt reached the ledger
        assert_eq!(session.user_score("alice").await.unwrap(), -200);
    }

    #[tokio::test]
    async fn test_concurrent_attempts_judge_exactly_once() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();

        // Wrong guesses keep the clue open, so however the two interleave
        // the only split is judged vs duplicate.
        let (a, b) = tokio::join!(
            session.attempt_answer("alice", "london", "1.0"),
            session.attempt_answer("alice", "london", "2.0"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(
            a.duplicate ^ b.duplicate,
            "exactly one of two concurrent attempts must be judged"
        );
        assert_eq!(session.user_score("alice").await.unwrap(), -200);
    }

    #[tokio::test]
    async fn test_different_users_each_get_judged() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();

        let bob = session.attempt_answer("bob", "london", "1.0").await.unwrap();
        let alice = session
            .attempt_answer("alice", "paris", "2.0")
            .await
            .unwrap();
        assert!(!bob.duplicate && !alice.duplicate);
        assert!(alice.correct);

        // Clue resolved by alice: later attempts see it gone
        let carol = session
            .attempt_answer("carol", "paris", "3.0")
            .await
            .unwrap();
        assert!(carol.clue_gone);
        assert_eq!(session.user_score("carol").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_moderator_adjust_flips_a_wrong_answer() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();
        session
            .attempt_answer("bob", "london", "55.5")
            .await
            .unwrap();
        assert_eq!(session.user_score("bob").await.unwrap(), -200);

        // Not a reset: double the value, correctness inverted -> +400
        session.moderator_adjust("bob", "55.5", false).await.unwrap();
        assert_eq!(session.user_score("bob").await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_moderator_reset_applies_single_inverted_value() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();
        session
            .attempt_answer("alice", "paris", "77.7")
            .await
            .unwrap();
        assert_eq!(session.user_score("alice").await.unwrap(), 200);

        // Reset of a correct answer: original value, inverted -> -200
        session
            .moderator_adjust("alice", "77.7", true)
            .await
            .unwrap();
        assert_eq!(session.user_score("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_moderator_adjust_is_single_shot() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();
        session
            .attempt_answer("bob", "london", "88.8")
            .await
            .unwrap();

        session.moderator_adjust("bob", "88.8", false).await.unwrap();
        let after_first = session.user_score("bob").await.unwrap();
        // Record deleted by the first adjustment; the second is a no-op
        session.moderator_adjust("bob", "88.8", false).await.unwrap();
        assert_eq!(session.user_score("bob").await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_moderator_adjust_unknown_record_is_noop() {
        let (_, session) = session_with_clues(&[sample_clue(1)]).await;
        session
            .moderator_adjust("ghost", "999.9", false)
            .await
            .unwrap();
        assert_eq!(session.user_score("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_attempt_uses_ledger_seam() {
        // The outcome's delta matches what the ledger saw
        let (store, session) = session_with_clues(&[sample_clue(1)]).await;
        session.next_clue().await.unwrap();
        let outcome = session
            .attempt_answer("alice", "paris", "1.0")
            .await
            .unwrap();
        let ledger = crate::ledger::KvLedger::new(store);
        assert_eq!(
            ledger.get_score("g1", "alice").await.unwrap(),
            outcome.score_delta
        );
    }
}
