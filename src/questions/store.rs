//! Question Store
//!
//! Owns the submitted questions: identifier uniqueness, publication,
//! guess limiting, answer checking and expiration. Every mutation is
//! written through to the backing [`JsonFile`] before the outcome is
//! returned.

use super::types::{CheckOutcome, ExpiredQuestion, Question, ReviewOutcome};
use crate::answers::answers_match;
use crate::outcome::{AddOutcome, PublishOutcome, RemoveOutcome, Requester};
use crate::storage::{JsonFile, StoreResult};
use crate::util::{ids_match, now_ms, HOUR_MS};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Tunables for the question lifecycle
#[derive(Debug, Clone, Copy)]
pub struct QuestionSettings {
    /// Guesses a user gets per question
    pub max_guesses: u32,
    /// Published questions expire after this many hours
    pub expiry_hours: u32,
    /// How long expired questions stay visible in the old-questions view
    pub old_question_window_hours: u32,
}

impl Default for QuestionSettings {
    fn default() -> Self {
        Self {
            max_guesses: 3,
            expiry_hours: 18,
            old_question_window_hours: 24,
        }
    }
}

/// On-disk layout of `questions.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct QuestionState {
    questions: Vec<Question>,
    #[serde(default)]
    expired: Vec<ExpiredQuestion>,
}

impl QuestionState {
    fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| ids_match(&q.id, id))
    }

    fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| ids_match(&q.id, id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| ids_match(&q.id, id))
    }
}

/// Persistent collection of questions
#[derive(Debug)]
pub struct QuestionStore {
    file: JsonFile,
    settings: QuestionSettings,
    state: RwLock<QuestionState>,
}

impl QuestionStore {
    /// Open the store, loading any previously saved questions.
    pub fn open(file: JsonFile, settings: QuestionSettings) -> StoreResult<Self> {
        let state: QuestionState = file.load()?;
        info!(
            path = %file.path().display(),
            questions = state.questions.len(),
            "question store loaded"
        );
        Ok(Self {
            file,
            settings,
            state: RwLock::new(state),
        })
    }

    pub fn settings(&self) -> QuestionSettings {
        self.settings
    }

    fn expiry_ms(&self) -> i64 {
        i64::from(self.settings.expiry_hours) * HOUR_MS
    }

    fn window_ms(&self) -> i64 {
        i64::from(self.settings.old_question_window_hours) * HOUR_MS
    }

    fn persist(&self, state: &QuestionState) -> StoreResult<()> {
        self.file.save(state).inspect_err(|e| {
            error!(error = %e, "failed to persist questions");
        })
    }

    /// Number of live questions
    pub fn len(&self) -> usize {
        self.state.read().questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submit a new, unpublished question. `answer` may be empty.
    pub fn add(
        &self,
        user_id: &str,
        id: &str,
        text: &str,
        answer: &str,
    ) -> StoreResult<AddOutcome> {
        self.add_at(user_id, id, text, answer, now_ms())
    }

    pub fn add_at(
        &self,
        user_id: &str,
        id: &str,
        text: &str,
        answer: &str,
        now: i64,
    ) -> StoreResult<AddOutcome> {
        let mut state = self.state.write();

        if let Some(pos) = state.position(id) {
            // An expired question that its owner never cleaned up does not
            // block the identifier; it moves to the archive instead.
            if !state.questions[pos].is_expired(now, self.expiry_ms()) {
                return Ok(AddOutcome::DuplicateId);
            }
            let question = state.questions.remove(pos);
            debug!(question_id = %question.id, "archiving expired question to free its id");
            state.expired.push(ExpiredQuestion {
                question,
                expired_at: now,
            });
        }

        state
            .questions
            .push(Question::new(user_id, id, text, answer, now));
        info!(user_id = %user_id, question_id = %id, manual = answer.is_empty(), "question added");
        self.persist(&state)?;
        Ok(AddOutcome::Added)
    }

    /// Remove a question regardless of owner.
    pub fn remove(&self, id: &str) -> StoreResult<RemoveOutcome> {
        self.remove_owned(id, Requester::Developer)
    }

    /// Remove a question if `requester` owns it (or is the developer).
    pub fn remove_owned(&self, id: &str, requester: Requester<'_>) -> StoreResult<RemoveOutcome> {
        let mut state = self.state.write();
        let pos = state
            .questions
            .iter()
            .position(|q| ids_match(&q.id, id) && requester.may_manage(&q.user_id));
        let Some(pos) = pos else {
            return Ok(RemoveOutcome::NotFound);
        };

        let removed = state.questions.remove(pos);
        info!(question_id = %removed.id, "question removed");
        self.persist(&state)?;
        Ok(RemoveOutcome::Removed)
    }

    /// Case-insensitive lookup
    pub fn get(&self, id: &str) -> Option<Question> {
        self.state.read().find(id).cloned()
    }

    /// Lookup restricted to questions `requester` may manage
    pub fn get_owned(&self, id: &str, requester: Requester<'_>) -> Option<Question> {
        self.state
            .read()
            .find(id)
            .filter(|q| requester.may_manage(&q.user_id))
            .cloned()
    }

    /// User ID of the question's submitter
    pub fn submitter(&self, id: &str) -> Option<String> {
        self.state.read().find(id).map(|q| q.user_id.clone())
    }

    /// Check a user's guess against a published question.
    pub fn check_answer(&self, user_id: &str, id: &str, input: &str) -> StoreResult<CheckOutcome> {
        let max_guesses = self.settings.max_guesses;
        let mut state = self.state.write();

        let Some(question) = state.find_mut(id).filter(|q| q.published) else {
            return Ok(CheckOutcome::NotFound);
        };
        if question.has_answered(user_id) {
            return Ok(CheckOutcome::AlreadyAnswered);
        }

        let used = question.guesses.entry(user_id.to_string()).or_insert(0);
        *used += 1;
        let used = *used;

        let outcome = if used > max_guesses {
            CheckOutcome::MaxGuesses
        } else if question.needs_manual_validation() {
            CheckOutcome::NeedsManual
        } else if answers_match(&question.answer, input) {
            question.answered_by.push(user_id.to_string());
            CheckOutcome::Correct
        } else {
            CheckOutcome::Incorrect {
                guesses_left: max_guesses - used,
            }
        };

        info!(
            user_id = %user_id,
            question_id = %question.id,
            guess = used,
            outcome = ?outcome,
            "answer checked"
        );
        self.persist(&state)?;
        Ok(outcome)
    }

    /// Record a manually validated correct answer.
    pub fn mark_correct(&self, user_id: &str, id: &str) -> StoreResult<ReviewOutcome> {
        let mut state = self.state.write();
        let Some(question) = state.find_mut(id) else {
            return Ok(ReviewOutcome::NotFound);
        };
        if question.has_answered(user_id) {
            return Ok(ReviewOutcome::AlreadyAnswered);
        }

        question.answered_by.push(user_id.to_string());
        info!(user_id = %user_id, question_id = %question.id, "answer accepted by submitter");
        self.persist(&state)?;
        Ok(ReviewOutcome::Accepted)
    }

    /// Guesses `user_id` has left on a question
    pub fn guesses_left(&self, user_id: &str, id: &str) -> Option<u32> {
        let state = self.state.read();
        let question = state.find(id)?;
        Some(
            self.settings
                .max_guesses
                .saturating_sub(question.guesses_by(user_id)),
        )
    }

    pub fn publish(&self, id: &str) -> StoreResult<PublishOutcome> {
        self.publish_at(id, now_ms())
    }

    pub fn publish_at(&self, id: &str, now: i64) -> StoreResult<PublishOutcome> {
        let mut state = self.state.write();
        let Some(question) = state.find_mut(id) else {
            return Ok(PublishOutcome::NotFound);
        };
        if !question.publish(now) {
            return Ok(PublishOutcome::AlreadyPublished);
        }

        info!(question_id = %question.id, "question published");
        self.persist(&state)?;
        Ok(PublishOutcome::Published)
    }

    /// Publish every unpublished question owned by `user_id`.
    /// Returns how many were newly published.
    pub fn publish_all_by_user(&self, user_id: &str) -> StoreResult<usize> {
        self.publish_all_by_user_at(user_id, now_ms())
    }

    pub fn publish_all_by_user_at(&self, user_id: &str, now: i64) -> StoreResult<usize> {
        let mut state = self.state.write();
        let published = state
            .questions
            .iter_mut()
            .filter(|q| q.user_id == user_id)
            .map(|q| q.publish(now))
            .filter(|fresh| *fresh)
            .count();

        if published > 0 {
            info!(user_id = %user_id, count = published, "questions published");
            self.persist(&state)?;
        }
        Ok(published)
    }

    /// Drain the "just published" flags, returning each newly published
    /// question once, whoever published it.
    pub fn first_time_display(&self) -> StoreResult<Vec<String>> {
        let mut state = self.state.write();
        let fresh: Vec<String> = state
            .questions
            .iter_mut()
            .filter(|q| q.just_published)
            .map(|q| {
                q.just_published = false;
                q.pretty_print()
            })
            .collect();

        if !fresh.is_empty() {
            self.persist(&state)?;
        }
        Ok(fresh)
    }

    /// Published questions, one `(id): text` line each
    pub fn list_published(&self) -> Vec<String> {
        self.state
            .read()
            .questions
            .iter()
            .filter(|q| q.published)
            .map(Question::pretty_print)
            .collect()
    }

    /// A user's own questions with answers, marking the published ones
    pub fn list_by_user(&self, user_id: &str) -> Vec<String> {
        self.state
            .read()
            .questions
            .iter()
            .filter(|q| q.user_id == user_id)
            .map(|q| {
                let mut line = q.pretty_print_with_answer();
                if q.published {
                    line.push_str(" (published)");
                }
                line
            })
            .collect()
    }

    /// Remove and return `user_id`'s questions published longer ago than
    /// the expiry window.
    pub fn expire(&self, user_id: &str) -> StoreResult<Vec<Question>> {
        self.expire_at(user_id, now_ms())
    }

    pub fn expire_at(&self, user_id: &str, now: i64) -> StoreResult<Vec<Question>> {
        let expiry_ms = self.expiry_ms();
        let window_ms = self.window_ms();
        let mut state = self.state.write();

        let (expired, kept): (Vec<Question>, Vec<Question>) = std::mem::take(&mut state.questions)
            .into_iter()
            .partition(|q| q.user_id == user_id && q.is_expired(now, expiry_ms));
        state.questions = kept;

        let archive_before = state.expired.len();
        state.expired.retain(|e| now - e.expired_at <= window_ms);
        let pruned = archive_before - state.expired.len();

        state
            .expired
            .extend(expired.iter().cloned().map(|question| ExpiredQuestion {
                question,
                expired_at: now,
            }));

        if !expired.is_empty() || pruned > 0 {
            info!(user_id = %user_id, expired = expired.len(), pruned, "questions expired");
            self.persist(&state)?;
        }
        Ok(expired)
    }

    /// Questions expired within the old-question window, newest first
    pub fn old_questions(&self) -> Vec<String> {
        self.old_questions_at(now_ms())
    }

    pub fn old_questions_at(&self, now: i64) -> Vec<String> {
        let window_ms = self.window_ms();
        let state = self.state.read();
        let mut recent: Vec<&ExpiredQuestion> = state
            .expired
            .iter()
            .filter(|e| now - e.expired_at <= window_ms)
            .collect();
        recent.sort_by(|a, b| b.expired_at.cmp(&a.expired_at));
        recent
            .into_iter()
            .map(|e| e.question.pretty_print_with_answer())
            .collect()
    }

    /// Number of users who answered a question correctly
    pub fn count_answers(&self, id: &str) -> Option<usize> {
        self.state.read().find(id).map(Question::count_answers)
    }

    /// Number of distinct users who guessed on a question
    pub fn count_guesses(&self, id: &str) -> Option<usize> {
        self.state.read().find(id).map(Question::count_guesses)
    }
}
