//! Poll Store
//!
//! Handles poll submission, publication, voting and tallies.

use super::types::{Poll, PollResults, VoteOutcome};
use crate::outcome::{AddOutcome, PublishOutcome, RemoveOutcome, Requester};
use crate::storage::{JsonFile, StoreResult};
use crate::util::{ids_match, now_ms};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// On-disk layout of `polls.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct PollState {
    polls: Vec<Poll>,
}

impl PollState {
    fn find(&self, id: &str) -> Option<&Poll> {
        self.polls.iter().find(|p| ids_match(&p.id, id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Poll> {
        self.polls.iter_mut().find(|p| ids_match(&p.id, id))
    }
}

/// Persistent collection of polls
#[derive(Debug)]
pub struct PollStore {
    file: JsonFile,
    state: RwLock<PollState>,
}

impl PollStore {
    /// Open the store, loading any previously saved polls.
    pub fn open(file: JsonFile) -> StoreResult<Self> {
        let state: PollState = file.load()?;
        info!(path = %file.path().display(), polls = state.polls.len(), "poll store loaded");
        Ok(Self {
            file,
            state: RwLock::new(state),
        })
    }

    fn persist(&self, state: &PollState) -> StoreResult<()> {
        self.file.save(state).inspect_err(|e| {
            error!(error = %e, "failed to persist polls");
        })
    }

    pub fn len(&self) -> usize {
        self.state.read().polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submit a new, unpublished poll. Options are keyed "1", "2", ... in order.
    pub fn add<S: Into<String>>(
        &self,
        user_id: &str,
        id: &str,
        text: &str,
        options: impl IntoIterator<Item = S>,
    ) -> StoreResult<AddOutcome> {
        let mut state = self.state.write();
        if state.find(id).is_some() {
            return Ok(AddOutcome::DuplicateId);
        }

        let poll = Poll::new(user_id, id, text, options, now_ms());
        info!(user_id = %user_id, poll_id = %id, options = poll.options.len(), "poll added");
        state.polls.push(poll);
        self.persist(&state)?;
        Ok(AddOutcome::Added)
    }

    /// Remove a poll regardless of owner.
    pub fn remove(&self, id: &str) -> StoreResult<RemoveOutcome> {
        self.remove_owned(id, Requester::Developer)
    }

    /// Remove a poll if `requester` owns it (or is the developer).
    pub fn remove_owned(&self, id: &str, requester: Requester<'_>) -> StoreResult<RemoveOutcome> {
        let mut state = self.state.write();
        let before = state.polls.len();
        state
            .polls
            .retain(|p| !(ids_match(&p.id, id) && requester.may_manage(&p.user_id)));
        if state.polls.len() == before {
            return Ok(RemoveOutcome::NotFound);
        }

        info!(poll_id = %id, "poll removed");
        self.persist(&state)?;
        Ok(RemoveOutcome::Removed)
    }

    /// Case-insensitive lookup
    pub fn get(&self, id: &str) -> Option<Poll> {
        self.state.read().find(id).cloned()
    }

    pub fn publish(&self, id: &str) -> StoreResult<PublishOutcome> {
        let mut state = self.state.write();
        let Some(poll) = state.find_mut(id) else {
            return Ok(PublishOutcome::NotFound);
        };
        if !poll.publish(now_ms()) {
            return Ok(PublishOutcome::AlreadyPublished);
        }

        info!(poll_id = %poll.id, "poll published");
        self.persist(&state)?;
        Ok(PublishOutcome::Published)
    }

    /// Publish every unpublished poll owned by `user_id`.
    /// Returns how many were newly published.
    pub fn publish_all_by_user(&self, user_id: &str) -> StoreResult<usize> {
        let now = now_ms();
        let mut state = self.state.write();
        let published = state
            .polls
            .iter_mut()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.publish(now))
            .filter(|fresh| *fresh)
            .count();

        if published > 0 {
            info!(user_id = %user_id, count = published, "polls published");
            self.persist(&state)?;
        }
        Ok(published)
    }

    /// Drain the "just published" flags, returning each newly published
    /// poll (with its options) once.
    pub fn first_time_display(&self) -> StoreResult<Vec<String>> {
        let mut state = self.state.write();
        let fresh: Vec<String> = state
            .polls
            .iter_mut()
            .filter(|p| p.just_published)
            .map(|p| {
                p.just_published = false;
                p.pretty_print_with_options()
            })
            .collect();

        if !fresh.is_empty() {
            self.persist(&state)?;
        }
        Ok(fresh)
    }

    /// Published polls with their options
    pub fn list_published(&self) -> Vec<String> {
        self.state
            .read()
            .polls
            .iter()
            .filter(|p| p.published)
            .map(Poll::pretty_print_with_options)
            .collect()
    }

    /// Polls submitted by `user_id`, marking the published ones
    pub fn list_by_user(&self, user_id: &str) -> Vec<String> {
        self.state
            .read()
            .polls
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| {
                let mut line = p.pretty_print();
                if p.published {
                    line.push_str(" (published)");
                }
                line
            })
            .collect()
    }

    /// Record `user_id`'s vote, replacing any earlier vote on the same poll.
    pub fn submit_response(&self, user_id: &str, id: &str, vote: &str) -> StoreResult<VoteOutcome> {
        let mut state = self.state.write();
        let Some(poll) = state.find_mut(id).filter(|p| p.published) else {
            return Ok(VoteOutcome::NotFound);
        };
        let Some(key) = poll.resolve_option(vote).map(|o| o.key.clone()) else {
            return Ok(VoteOutcome::InvalidOption);
        };

        let previous = poll.votes.insert(user_id.to_string(), key.clone());
        info!(
            user_id = %user_id,
            poll_id = %poll.id,
            option = %key,
            replaced = previous.is_some(),
            "vote recorded"
        );
        self.persist(&state)?;
        Ok(VoteOutcome::Accepted)
    }

    /// Live vote counts per option
    pub fn tally(&self, id: &str) -> Option<PollResults> {
        self.state.read().find(id).map(Poll::tally)
    }

    /// Tally rendered for chat: the poll header then `key. option: n votes`
    pub fn display_results(&self, id: &str) -> Option<String> {
        let state = self.state.read();
        let poll = state.find(id)?;
        let results = poll.tally();

        let mut out = poll.pretty_print();
        for option in &results.options {
            out.push_str(&format!(
                "\n    {}. {}: {} vote{}",
                option.key,
                option.text,
                option.votes,
                if option.votes == 1 { "" } else { "s" }
            ));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, PollStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PollStore::open(JsonFile::new(dir.path().join("polls.json"))).unwrap();
        (dir, store)
    }

    fn published_poll(store: &PollStore) {
        store
            .add("U1", "Color", "Favorite color?", ["Red", "Blue", "Green"])
            .unwrap();
        store.publish("color").unwrap();
    }

    #[test]
    fn test_add_duplicate_is_case_insensitive() {
        let (_dir, store) = open_store();
        assert_eq!(
            store.add("U1", "P1", "Q?", ["a", "b"]).unwrap(),
            AddOutcome::Added
        );
        assert_eq!(
            store.add("U2", "p1", "Other?", ["c"]).unwrap(),
            AddOutcome::DuplicateId
        );
        assert!(store.get("p1").is_some());
    }

    #[test]
    fn test_remove_owned() {
        let (_dir, store) = open_store();
        store.add("U1", "p1", "Q?", ["a", "b"]).unwrap();
        assert_eq!(
            store.remove_owned("P1", Requester::User("U2")).unwrap(),
            RemoveOutcome::NotFound
        );
        assert_eq!(
            store.remove_owned("P1", Requester::User("U1")).unwrap(),
            RemoveOutcome::Removed
        );
        assert_eq!(store.remove("p1").unwrap(), RemoveOutcome::NotFound);
    }

    #[test]
    fn test_vote_on_unpublished_poll_is_not_found() {
        let (_dir, store) = open_store();
        store.add("U1", "p1", "Q?", ["a", "b"]).unwrap();
        assert_eq!(
            store.submit_response("U2", "p1", "1").unwrap(),
            VoteOutcome::NotFound
        );
        assert_eq!(
            store.submit_response("U2", "missing", "1").unwrap(),
            VoteOutcome::NotFound
        );
    }

    #[test]
    fn test_invalid_option_leaves_tally_unchanged() {
        let (_dir, store) = open_store();
        published_poll(&store);

        assert_eq!(
            store.submit_response("U2", "color", "1").unwrap(),
            VoteOutcome::Accepted
        );
        assert_eq!(
            store.submit_response("U2", "color", "7").unwrap(),
            VoteOutcome::InvalidOption
        );

        let results = store.tally("color").unwrap();
        assert_eq!(results.total_votes, 1);
        assert_eq!(results.votes_for("Red"), Some(1));
    }

    #[test]
    fn test_second_vote_replaces_first() {
        let (_dir, store) = open_store();
        published_poll(&store);

        store.submit_response("U2", "color", "1").unwrap();
        store.submit_response("U2", "COLOR", "blue").unwrap();
        store.submit_response("U3", "color", "2").unwrap();

        let results = store.tally("color").unwrap();
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.votes_for("Red"), Some(0));
        assert_eq!(results.votes_for("Blue"), Some(2));
    }

    #[test]
    fn test_publish_and_first_time_display() {
        let (_dir, store) = open_store();
        store.add("U1", "p1", "Q?", ["a", "b"]).unwrap();
        store.add("U1", "p2", "R?", ["c", "d"]).unwrap();

        assert_eq!(store.publish("p1").unwrap(), PublishOutcome::Published);
        assert_eq!(store.publish("p1").unwrap(), PublishOutcome::AlreadyPublished);
        assert_eq!(store.publish_all_by_user("U1").unwrap(), 1);
        assert_eq!(store.publish_all_by_user("U1").unwrap(), 0);

        let fresh = store.first_time_display().unwrap();
        assert_eq!(
            fresh,
            vec![
                "(p1): Q?\n    1. a\n    2. b".to_string(),
                "(p2): R?\n    1. c\n    2. d".to_string(),
            ]
        );
        assert!(store.first_time_display().unwrap().is_empty());
        assert_eq!(store.list_published().len(), 2);
        assert_eq!(store.list_by_user("U1"), vec!["(p1): Q? (published)", "(p2): R? (published)"]);
    }

    #[test]
    fn test_display_results() {
        let (_dir, store) = open_store();
        published_poll(&store);
        store.submit_response("U2", "color", "3").unwrap();

        assert_eq!(
            store.display_results("color").unwrap(),
            "(Color): Favorite color?\n    1. Red: 0 votes\n    2. Blue: 0 votes\n    3. Green: 1 vote"
        );
        assert!(store.display_results("nope").is_none());
        assert!(store.tally("nope").is_none());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polls.json");
        {
            let store = PollStore::open(JsonFile::new(&path)).unwrap();
            published_poll(&store);
            store.submit_response("U2", "color", "2").unwrap();
        }

        let store = PollStore::open(JsonFile::new(&path)).unwrap();
        let poll = store.get("color").unwrap();
        assert!(poll.published);
        assert_eq!(poll.options[1].text, "Blue");
        assert_eq!(store.tally("color").unwrap().votes_for("Blue"), Some(1));
        assert_eq!(store.first_time_display().unwrap().len(), 1);
    }
}
