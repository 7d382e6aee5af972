//! Full game round against the in-memory store: build, draw, arbitrate
//! concurrent answers, adjust, rank and clean up through the public API only.

use async_trait::async_trait;
use cluecast::clue::{RawCategory, RawClue};
use cluecast::ledger::KvLedger;
use cluecast::session::ScoreboardEntry;
use cluecast::source::{ClueSource, SourceResult};
use cluecast::store::MemoryStore;
use cluecast::{GameConfig, GameMode, GameSession};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Deterministic provider: every category yields five fresh clues.
struct FixtureSource {
    next_id: AtomicI64,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }

    fn raw_clue(&self, category_id: u32) -> RawClue {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        RawClue {
            id,
            answer: Some(format!("Answer {id}")),
            question: Some(format!("Question {id}")),
            value: Some(200),
            airdate: Some("2001-01-01".to_string()),
            category: Some(RawCategory {
                title: Some(format!("Category {category_id}")),
            }),
            invalid_count: None,
        }
    }
}

#[async_trait]
impl ClueSource for FixtureSource {
    async fn fetch_category_clues(&self, category_id: u32) -> SourceResult<Vec<RawClue>> {
        Ok((0..5).map(|_| self.raw_clue(category_id)).collect())
    }

    async fn fetch_random_clue(&self) -> SourceResult<RawClue> {
        Ok(self.raw_clue(0))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cluecast=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

async fn standard_game() -> GameSession {
    init_tracing();
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    GameSession::create(
        "trivia-channel",
        GameMode::Standard,
        GameConfig::default(),
        store.clone(),
        Arc::new(FixtureSource::new()),
        Arc::new(KvLedger::new(store)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_full_round() {
    let session = standard_game().await;
    assert_eq!(session.categories().len(), 6);
    assert_eq!(session.remaining_clue_count().await.unwrap(), 30);

    // Open a clue; its answer text is what a winning guess must match.
    let clue = session.next_clue().await.unwrap().unwrap();
    assert_eq!(session.remaining_clue_count().await.unwrap(), 29);

    // Bob guesses wrong and pays for it; the clue stays open.
    let bob = session
        .attempt_answer("bob", "definitely not it", "100.1")
        .await
        .unwrap();
    assert!(!bob.correct && !bob.duplicate && !bob.clue_gone);
    assert_eq!(bob.score_delta, -200);
    assert!(session.current_clue().await.unwrap().is_some());

    // Alice phrases her guess as a question and wins; the clue resolves.
    let alice = session
        .attempt_answer("alice", &format!("What is {}?", clue.answer), "100.2")
        .await
        .unwrap();
    assert!(alice.correct);
    assert_eq!(alice.score_delta, 200);
    assert!(session.current_clue().await.unwrap().is_none());

    // Carol is too late: no open clue, no score movement.
    let carol = session
        .attempt_answer("carol", &clue.answer, "100.3")
        .await
        .unwrap();
    assert!(carol.clue_gone);
    assert_eq!(session.user_score("carol").await.unwrap(), 0);

    // A moderator flips bob's wrong answer: -200 cancelled and inverted.
    session.moderator_adjust("bob", "100.1", false).await.unwrap();

    // Alice and bob are now tied at 200; carol never scored and is absent.
    let board = session.scoreboard().await.unwrap();
    assert_eq!(board.len(), 2);
    for user in ["alice", "bob"] {
        assert!(board.contains(&ScoreboardEntry {
            user_id: user.to_string(),
            score: 200
        }));
    }

    session.cleanup().await.unwrap();
    session.cleanup().await.unwrap();
    assert_eq!(session.remaining_clue_count().await.unwrap(), 0);
    assert!(session.current_clue().await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_guesses_from_one_user_judged_once() {
    let session = standard_game().await;
    session.next_clue().await.unwrap().unwrap();

    // Wrong guesses keep the clue open, so however the two interleave the
    // only split is judged vs duplicate.
    let (a, b) = tokio::join!(
        session.attempt_answer("alice", "definitely not it", "1.0"),
        session.attempt_answer("alice", "definitely not it", "2.0"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.duplicate ^ b.duplicate);
    assert_eq!(session.user_score("alice").await.unwrap(), -200);
}

#[tokio::test]
async fn test_resumed_handle_serves_same_game() {
    init_tracing();
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let session = GameSession::create(
        "trivia-channel",
        GameMode::Random,
        GameConfig::default(),
        store.clone(),
        Arc::new(FixtureSource::new()),
        Arc::new(KvLedger::new(store.clone())),
    )
    .await
    .unwrap();
    let clue = session.next_clue().await.unwrap().unwrap();

    // A different process picks the game up by id and judges the answer.
    let resumed = GameSession::resume(
        "trivia-channel",
        session.id(),
        GameConfig::default(),
        store.clone(),
        Arc::new(FixtureSource::new()),
        Arc::new(KvLedger::new(store)),
    );
    let outcome = resumed
        .attempt_answer("alice", &clue.answer, "1.0")
        .await
        .unwrap();
    assert!(outcome.correct);
    assert!(session.current_clue().await.unwrap().is_none());
}

#[tokio::test]
async fn test_category_vote_lifecycle() {
    let session = standard_game().await;
    session.start_category_vote("msg-1").await.unwrap();
    assert_eq!(session.cast_vote("msg-1", 1).await.unwrap(), Some(1));
    assert_eq!(session.cast_vote("msg-1", 1).await.unwrap(), Some(2));
    assert_eq!(session.cast_vote("msg-unknown", 1).await.unwrap(), None);
}
