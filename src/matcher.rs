//! Fuzzy answer matching.
//!
//! Guesses are normalized the same way clue answers are, then compared by
//! exact match and by a word-pair (bigram) overlap coefficient. Everything
//! here is pure; the session layer owns logging and scoring.

use crate::clue::{collapse, replace_conjunctions, strip_leading_word, strip_punctuation, Clue};

/// Everything the caller needs to log or act on one judged guess.
#[derive(Debug, Clone)]
pub struct Judgement {
    pub normalized_guess: String,
    /// Bigram-overlap score against the canonical answer.
    pub similarity: f64,
    /// Score against the alternate answer, when the clue has one.
    pub alt_similarity: Option<f64>,
    pub correct: bool,
}

/// Normalize a free-text guess: conjunctions to "and", punctuation reduced to
/// the answer character class, then one leading interrogative, copula and
/// article stripped in that order.
pub fn normalize_guess(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = collapse(&strip_punctuation(&replace_conjunctions(&lowered)));
    let stripped = strip_leading_word(
        &cleaned,
        &["what", "whats", "where", "wheres", "who", "whos"],
    );
    let stripped = strip_leading_word(stripped, &["is", "are", "was", "were"]);
    let stripped = strip_leading_word(stripped, &["the", "a", "an"]);
    stripped.trim().to_string()
}

/// Dice-style bigram overlap: 2 × shared pairs / total pairs, computed over
/// adjacent character pairs within each whitespace-separated word,
/// case-insensitively. Two strings with no pairs at all score 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let mut pairs_a = word_bigrams(a);
    let pairs_b = word_bigrams(b);
    let total = pairs_a.len() + pairs_b.len();
    if total == 0 {
        return 0.0;
    }
    let mut shared = 0usize;
    for pair in &pairs_b {
        if let Some(pos) = pairs_a.iter().position(|p| p == pair) {
            pairs_a.swap_remove(pos);
            shared += 1;
        }
    }
    2.0 * shared as f64 / total as f64
}

/// Judge a guess against a clue. Exact matches against the canonical or
/// alternate answer always succeed; otherwise either similarity score must
/// meet `threshold`.
pub fn judge(clue: &Clue, guess: &str, threshold: f64) -> Judgement {
    let normalized = normalize_guess(guess);
    let score = similarity(&clue.answer, &normalized);
    let alt_score = clue
        .alternate
        .as_deref()
        .map(|alt| similarity(alt, &normalized));

    let exact = normalized == clue.answer || clue.alternate.as_deref() == Some(normalized.as_str());
    let fuzzy = score >= threshold || alt_score.is_some_and(|s| s >= threshold);

    Judgement {
        normalized_guess: normalized,
        similarity: score,
        alt_similarity: alt_score,
        correct: exact || fuzzy,
    }
}

pub fn is_correct(clue: &Clue, guess: &str, threshold: f64) -> bool {
    judge(clue, guess, threshold).correct
}

fn word_bigrams(s: &str) -> Vec<[char; 2]> {
    s.to_lowercase()
        .split_whitespace()
        .flat_map(|word| {
            let chars: Vec<char> = word.chars().collect();
            chars
                .windows(2)
                .map(|pair| [pair[0], pair[1]])
                .collect::<Vec<_>>()
        })
        .collect()
}
