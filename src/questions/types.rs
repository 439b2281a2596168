//! Question records and answer-check outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user-submitted trivia question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier chosen by the submitter (unique, case-insensitive)
    pub id: String,
    /// User ID of the submitter
    pub user_id: String,
    /// Question text
    pub text: String,
    /// Correct answer; empty means answers are validated by hand
    #[serde(default)]
    pub answer: String,
    /// When the question was submitted (Unix ms)
    pub created_at: i64,
    /// When the question was published (Unix ms, 0 = unpublished)
    #[serde(default)]
    pub published_at: i64,
    #[serde(default)]
    pub published: bool,
    /// Set on publish, cleared once the question has been announced
    #[serde(default)]
    pub just_published: bool,
    /// Users who answered correctly, in answer order
    #[serde(default)]
    pub answered_by: Vec<String>,
    /// Guess count per user
    #[serde(default)]
    pub guesses: BTreeMap<String, u32>,
}

impl Question {
    pub fn new(
        user_id: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
        answer: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            text: text.into(),
            answer: answer.into(),
            created_at,
            published_at: 0,
            published: false,
            just_published: false,
            answered_by: Vec::new(),
            guesses: BTreeMap::new(),
        }
    }

    /// `(id): text`
    pub fn pretty_print(&self) -> String {
        format!("({}): {}", self.id, self.text)
    }

    /// `(id): text : answer`, for the submitter's eyes
    pub fn pretty_print_with_answer(&self) -> String {
        format!("({}): {} : {}", self.id, self.text, self.answer)
    }

    /// Publish the question. Returns `false` if it was already published.
    pub fn publish(&mut self, now: i64) -> bool {
        if self.published {
            return false;
        }
        self.published = true;
        self.just_published = true;
        self.published_at = now;
        true
    }

    pub fn needs_manual_validation(&self) -> bool {
        self.answer.is_empty()
    }

    /// Unpublished questions never expire.
    pub fn is_expired(&self, now: i64, expiry_ms: i64) -> bool {
        self.published && now - self.published_at > expiry_ms
    }

    pub fn has_answered(&self, user_id: &str) -> bool {
        self.answered_by.iter().any(|id| id == user_id)
    }

    pub fn guesses_by(&self, user_id: &str) -> u32 {
        self.guesses.get(user_id).copied().unwrap_or(0)
    }

    /// Number of users who answered correctly
    pub fn count_answers(&self) -> usize {
        self.answered_by.len()
    }

    /// Number of distinct users who guessed, right or wrong
    pub fn count_guesses(&self) -> usize {
        self.guesses.len()
    }

    /// Users who guessed but never got it right
    pub fn unresolved_guessers(&self) -> Vec<&str> {
        self.guesses
            .keys()
            .filter(|id| !self.has_answered(id))
            .map(String::as_str)
            .collect()
    }
}

/// Result of checking a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Correct,
    /// Wrong guess; `guesses_left` reaches 0 on the last allowed guess
    Incorrect { guesses_left: u32 },
    AlreadyAnswered,
    /// The user is past the guess limit; this guess was still counted
    MaxGuesses,
    /// The question has no stored answer; the guess is counted but unresolved
    NeedsManual,
    /// Unknown identifier, or the question is not published yet
    NotFound,
}

/// Result of the submitter accepting a manually validated answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Accepted,
    AlreadyAnswered,
    NotFound,
}

/// A question removed by expiration, kept around for the old-questions view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredQuestion {
    #[serde(flatten)]
    pub question: Question,
    /// When the question was expired (Unix ms)
    pub expired_at: i64,
}
