//! Clue records and normalization.
//!
//! The content provider returns loosely-typed JSON; everything here is about
//! turning one of those records into a canonical, immutable [`Clue`], or
//! discarding it. [`clean_clue`] is pure and deterministic.

use serde::{Deserialize, Serialize};

/// Point value assigned when the provider omits one.
pub const DEFAULT_CLUE_VALUE: i64 = 200;

/// Raw clue record as returned by the content provider.
///
/// Only the id is required; every other field may be missing or null. A
/// record without usable content is discarded by [`clean_clue`], never an
/// error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawClue {
    pub id: i64,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub airdate: Option<String>,
    #[serde(default)]
    pub category: Option<RawCategory>,
    /// External moderation flag: non-null means the clue was voted invalid.
    #[serde(default)]
    pub invalid_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub title: Option<String>,
}

/// Canonical clue. Immutable once built; persisted as JSON in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clue {
    pub id: i64,
    pub category: String,
    /// Normalized answer text: lowercased, article-stripped, punctuation
    /// reduced to alphanumerics, slashes, spaces and hyphens.
    pub answer: String,
    /// Alternate accepted answer derived from parenthetical hints.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alternate: Option<String>,
    pub question: String,
    pub value: i64,
}

/// Clean a raw provider record into a canonical clue.
///
/// Returns `None` when the record is unusable: marked invalid by moderation,
/// missing its question, or left with an empty answer after normalization.
pub fn clean_clue(raw: &RawClue) -> Option<Clue> {
    if raw.invalid_count.is_some() {
        return None;
    }
    let question = raw.question.as_deref().map(str::trim).filter(|q| !q.is_empty())?;
    let answer_raw = raw.answer.as_deref()?;

    let sanitized = replace_conjunctions(&strip_markup(answer_raw));
    let sanitized = strip_leading_word(sanitized.trim(), &["the", "a", "an"])
        .trim()
        .to_lowercase();

    // Parens at the end often hold an alternative answer ("Canada (or maybe
    // Mexico)"); parens at the start usually mark an optional first name
    // ("(John) Smith"), in which case the alternate is the full name and the
    // canonical answer drops the optional part.
    let mut alternate = trailing_parenthetical(&sanitized).map(|inner| {
        collapse(&strip_punctuation(strip_leading_word(
            inner,
            &["or", "alternatively", "alternate"],
        )))
    });
    if sanitized.starts_with('(') {
        alternate = Some(collapse(&strip_punctuation(&sanitized)));
    }

    let answer = collapse(&strip_punctuation(&remove_parentheticals(&sanitized)));
    if answer.is_empty() {
        return None;
    }

    Some(Clue {
        id: raw.id,
        category: raw
            .category
            .as_ref()
            .and_then(|c| c.title.clone())
            .unwrap_or_default(),
        answer,
        alternate: alternate.filter(|a| !a.is_empty()),
        question: question.to_string(),
        value: raw.value.unwrap_or(DEFAULT_CLUE_VALUE),
    })
}

/// Strip HTML-ish markup: removes tags and decodes the handful of entities
/// that show up in provider answers.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Replace free-standing "&" / "&nbsp;" conjunctions with the word "and".
/// Whitespace is collapsed to single spaces as a side effect.
pub(crate) fn replace_conjunctions(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            if word == "&" || word.eq_ignore_ascii_case("&nbsp;") {
                "and"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip one leading word from `words` (case-insensitive, must be followed
/// by a space).
pub(crate) fn strip_leading_word<'a>(s: &'a str, words: &[&str]) -> &'a str {
    for word in words {
        if s.len() > word.len() + 1
            && s.as_bytes()[word.len()] == b' '
            && s[..word.len()].eq_ignore_ascii_case(word)
        {
            return &s[word.len() + 1..];
        }
    }
    s
}

/// Drop everything except alphanumerics, slashes, whitespace and hyphens.
pub(crate) fn strip_punctuation(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '/' || *c == '-')
        .collect()
}

/// Collapse runs of whitespace and trim.
pub(crate) fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of a parenthetical that is not at the very start of the string:
/// the span between the last '(' and the last ')'.
fn trailing_parenthetical(s: &str) -> Option<&str> {
    let open = s.rfind('(')?;
    if open == 0 {
        return None;
    }
    let close = s.rfind(')')?;
    if close <= open {
        return None;
    }
    Some(&s[open + 1..close])
}

/// Remove the widest parenthetical span (first '(' through last ')').
fn remove_parentheticals(s: &str) -> String {
    match (s.find('('), s.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            format!("{}{}", &s[..open], &s[close + 1..])
        }
        _ => s.to_string(),
    }
}
