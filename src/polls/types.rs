//! Poll records, vote outcomes and tallies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One choice in a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// 1-based position, as a string ("1", "2", ...)
    pub key: String,
    /// Option text
    pub text: String,
}

/// A user-submitted poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Identifier chosen by the submitter (unique, case-insensitive)
    pub id: String,
    /// User ID of the submitter
    pub user_id: String,
    /// Poll question
    pub text: String,
    /// Options in submission order
    pub options: Vec<PollOption>,
    /// When the poll was submitted (Unix ms)
    pub created_at: i64,
    /// When the poll was published (Unix ms, 0 = unpublished)
    #[serde(default)]
    pub published_at: i64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub just_published: bool,
    /// Current vote per user (user ID -> option key)
    #[serde(default)]
    pub votes: BTreeMap<String, String>,
}

impl Poll {
    /// Create a poll, numbering `options` from 1 in the order given.
    pub fn new<S: Into<String>>(
        user_id: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        created_at: i64,
    ) -> Self {
        let options = options
            .into_iter()
            .enumerate()
            .map(|(i, text)| PollOption {
                key: (i + 1).to_string(),
                text: text.into(),
            })
            .collect();

        Self {
            id: id.into(),
            user_id: user_id.into(),
            text: text.into(),
            options,
            created_at,
            published_at: 0,
            published: false,
            just_published: false,
            votes: BTreeMap::new(),
        }
    }

    /// `(id): text`
    pub fn pretty_print(&self) -> String {
        format!("({}): {}", self.id, self.text)
    }

    /// `(id): text` followed by one indented `key. option` line per option
    pub fn pretty_print_with_options(&self) -> String {
        let mut out = self.pretty_print();
        for option in &self.options {
            out.push_str(&format!("\n    {}. {}", option.key, option.text));
        }
        out
    }

    /// Publish the poll. Returns `false` if it was already published.
    pub fn publish(&mut self, now: i64) -> bool {
        if self.published {
            return false;
        }
        self.published = true;
        self.just_published = true;
        self.published_at = now;
        true
    }

    /// Resolve a vote to an option key: the key itself, or the option text
    /// (case-insensitive).
    pub fn resolve_option(&self, input: &str) -> Option<&PollOption> {
        let input = input.trim();
        self.options
            .iter()
            .find(|o| o.key == input)
            .or_else(|| {
                let lowered = input.to_lowercase();
                self.options
                    .iter()
                    .find(|o| o.text.trim().to_lowercase() == lowered)
            })
    }

    /// Count votes per option, computed from the live vote map.
    pub fn tally(&self) -> PollResults {
        let options = self
            .options
            .iter()
            .map(|option| OptionTally {
                key: option.key.clone(),
                text: option.text.clone(),
                votes: self.votes.values().filter(|k| **k == option.key).count(),
            })
            .collect();

        PollResults {
            poll_id: self.id.clone(),
            total_votes: self.votes.len(),
            options,
        }
    }
}

/// Result of voting on a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Recorded; any earlier vote by the same user was replaced
    Accepted,
    /// Unknown identifier, or the poll is not published yet
    NotFound,
    /// The vote matched no option; earlier votes are untouched
    InvalidOption,
}

/// Votes for one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionTally {
    pub key: String,
    pub text: String,
    pub votes: usize,
}

/// Vote counts for a poll, in option order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResults {
    pub poll_id: String,
    /// One per voter
    pub total_votes: usize,
    pub options: Vec<OptionTally>,
}

impl PollResults {
    /// Votes for the option with this text
    pub fn votes_for(&self, text: &str) -> Option<usize> {
        self.options
            .iter()
            .find(|o| o.text == text)
            .map(|o| o.votes)
    }
}
