//! Engagement Tracker
//!
//! Associates a posted message with a handler that runs when someone
//! reacts to it. A record lives until its handler reports
//! [`Completion::Complete`] or it grows older than the configured maximum
//! age (5 days by default). Stale records are purged before every lookup.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::util::{now_ms, DAY_MS};

/// What a handler wants after seeing a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Keep watching the message
    Continue,
    /// Done; stop tracking the message
    Complete,
}

/// A reaction delivered to a handler
#[derive(Debug, Clone)]
pub struct ReactionContext {
    /// User who reacted
    pub reacting_user: String,
    /// Emoji name without colons, e.g. `white_check_mark`
    pub emoji: String,
    /// Payload stored at registration time
    pub payload: Value,
    /// User the record was registered for
    pub registered_user: String,
}

/// Reaction callback attached to a tracked message
#[async_trait]
pub trait ReactionHandler: Send + Sync {
    async fn on_reaction(&self, ctx: &ReactionContext) -> Completion;
}

/// What happened to an incoming reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionDispatch {
    /// No live record for that message
    NotTracked,
    /// Handler ran and asked to keep watching
    Continued,
    /// Handler ran and the record was removed
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MessageKey {
    channel: String,
    ts: String,
}

impl MessageKey {
    fn new(channel: &str, ts: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ts: ts.to_string(),
        }
    }
}

struct EngagementRecord {
    user_id: String,
    payload: Value,
    handler: Arc<dyn ReactionHandler>,
    created_at: i64,
    generation: u64,
}

#[derive(Default)]
struct TrackerState {
    records: HashMap<MessageKey, EngagementRecord>,
    next_generation: u64,
}

/// Tracks messages awaiting reactions
pub struct EngagementTracker {
    max_age_ms: i64,
    state: Mutex<TrackerState>,
}

impl std::fmt::Debug for EngagementTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementTracker")
            .field("max_age_ms", &self.max_age_ms)
            .field("records", &self.len())
            .finish()
    }
}

impl Default for EngagementTracker {
    fn default() -> Self {
        Self::new(5)
    }
}

impl EngagementTracker {
    pub fn new(max_age_days: u32) -> Self {
        Self {
            max_age_ms: i64::from(max_age_days) * DAY_MS,
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Watch a message. A later registration for the same channel and
    /// timestamp replaces this one.
    pub fn register(
        &self,
        channel: &str,
        ts: &str,
        user_id: &str,
        payload: Value,
        handler: Arc<dyn ReactionHandler>,
    ) {
        self.register_at(channel, ts, user_id, payload, handler, now_ms());
    }

    pub fn register_at(
        &self,
        channel: &str,
        ts: &str,
        user_id: &str,
        payload: Value,
        handler: Arc<dyn ReactionHandler>,
        now: i64,
    ) {
        let mut state = self.state.lock();
        let generation = state.next_generation;
        state.next_generation += 1;

        let replaced = state
            .records
            .insert(
                MessageKey::new(channel, ts),
                EngagementRecord {
                    user_id: user_id.to_string(),
                    payload,
                    handler,
                    created_at: now,
                    generation,
                },
            )
            .is_some();
        debug!(channel = %channel, ts = %ts, user_id = %user_id, replaced, "message tracked");
    }

    /// Drop records older than the maximum age. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(now_ms())
    }

    pub fn purge_expired_at(&self, now: i64) -> usize {
        let mut state = self.state.lock();
        self.purge_locked(&mut state, now)
    }

    fn purge_locked(&self, state: &mut TrackerState, now: i64) -> usize {
        let before = state.records.len();
        let max_age_ms = self.max_age_ms;
        state
            .records
            .retain(|_, record| now - record.created_at <= max_age_ms);
        let purged = before - state.records.len();
        if purged > 0 {
            debug!(purged, "stale tracked messages dropped");
        }
        purged
    }

    /// Whether a live record exists for the message
    pub fn is_tracked(&self, channel: &str, ts: &str) -> bool {
        self.is_tracked_at(channel, ts, now_ms())
    }

    pub fn is_tracked_at(&self, channel: &str, ts: &str, now: i64) -> bool {
        let mut state = self.state.lock();
        self.purge_locked(&mut state, now);
        state.records.contains_key(&MessageKey::new(channel, ts))
    }

    /// Deliver a reaction to the message's handler, if it is tracked.
    pub async fn on_reaction_added(
        &self,
        channel: &str,
        ts: &str,
        reacting_user: &str,
        emoji: &str,
    ) -> ReactionDispatch {
        self.on_reaction_added_at(channel, ts, reacting_user, emoji, now_ms())
            .await
    }

    pub async fn on_reaction_added_at(
        &self,
        channel: &str,
        ts: &str,
        reacting_user: &str,
        emoji: &str,
        now: i64,
    ) -> ReactionDispatch {
        let key = MessageKey::new(channel, ts);

        // The lock is not held while the handler runs
        let (handler, ctx, generation) = {
            let mut state = self.state.lock();
            self.purge_locked(&mut state, now);
            let Some(record) = state.records.get(&key) else {
                return ReactionDispatch::NotTracked;
            };
            (
                Arc::clone(&record.handler),
                ReactionContext {
                    reacting_user: reacting_user.to_string(),
                    emoji: emoji.to_string(),
                    payload: record.payload.clone(),
                    registered_user: record.user_id.clone(),
                },
                record.generation,
            )
        };

        match handler.on_reaction(&ctx).await {
            Completion::Continue => ReactionDispatch::Continued,
            Completion::Complete => {
                let mut state = self.state.lock();
                // Only drop the record the handler saw, not a newer replacement
                if state
                    .records
                    .get(&key)
                    .is_some_and(|r| r.generation == generation)
                {
                    state.records.remove(&key);
                }
                debug!(channel = %channel, ts = %ts, "tracked message completed");
                ReactionDispatch::Completed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completes on a thumbs-up, counting every call
    #[derive(Default)]
    struct ThumbsUp {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReactionHandler for ThumbsUp {
        async fn on_reaction(&self, ctx: &ReactionContext) -> Completion {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ctx.emoji == "+1" && ctx.payload["question"] == "q1" {
                Completion::Complete
            } else {
                Completion::Continue
            }
        }
    }

    #[tokio::test]
    async fn test_reaction_runs_handler_until_complete() {
        let tracker = EngagementTracker::default();
        let handler = Arc::new(ThumbsUp::default());
        tracker.register(
            "D1",
            "100.1",
            "U1",
            serde_json::json!({"question": "q1"}),
            handler.clone(),
        );

        assert_eq!(
            tracker.on_reaction_added("D1", "100.1", "U2", "eyes").await,
            ReactionDispatch::Continued
        );
        assert!(tracker.is_tracked("D1", "100.1"));

        assert_eq!(
            tracker.on_reaction_added("D1", "100.1", "U2", "+1").await,
            ReactionDispatch::Completed
        );
        assert!(!tracker.is_tracked("D1", "100.1"));
        assert_eq!(
            tracker.on_reaction_added("D1", "100.1", "U2", "+1").await,
            ReactionDispatch::NotTracked
        );
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_untracked_message() {
        let tracker = EngagementTracker::default();
        assert_eq!(
            tracker.on_reaction_added("C1", "1.0", "U1", "+1").await,
            ReactionDispatch::NotTracked
        );
    }

    #[tokio::test]
    async fn test_stale_records_are_purged_before_lookup() {
        let tracker = EngagementTracker::default();
        let handler = Arc::new(ThumbsUp::default());
        let now = 10 * DAY_MS;
        let payload = serde_json::json!({"question": "q1"});
        tracker.register_at(
            "D1",
            "1.0",
            "U1",
            payload.clone(),
            handler.clone(),
            now - 6 * DAY_MS,
        );
        tracker.register_at(
            "D1",
            "2.0",
            "U1",
            payload,
            handler.clone(),
            now - 4 * DAY_MS,
        );

        assert!(!tracker.is_tracked_at("D1", "1.0", now));
        assert!(tracker.is_tracked_at("D1", "2.0", now));
        assert_eq!(
            tracker.on_reaction_added_at("D1", "1.0", "U2", "+1", now).await,
            ReactionDispatch::NotTracked
        );
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn test_later_registration_replaces_earlier() {
        let tracker = EngagementTracker::default();
        let first = Arc::new(ThumbsUp::default());
        let second = Arc::new(ThumbsUp::default());
        tracker.register(
            "C1",
            "5.0",
            "U1",
            serde_json::json!({"question": "q1"}),
            first.clone(),
        );
        tracker.register(
            "C1",
            "5.0",
            "U2",
            serde_json::json!({"question": "q2"}),
            second.clone(),
        );
        assert_eq!(tracker.len(), 1);

        // Second payload is not "q1", so the handler keeps watching
        assert_eq!(
            tracker.on_reaction_added("C1", "5.0", "U3", "+1").await,
            ReactionDispatch::Continued
        );
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_purge_expired_counts() {
        let tracker = EngagementTracker::new(5);
        let handler: Arc<dyn ReactionHandler> = Arc::new(ThumbsUp::default());
        tracker.register_at("C1", "1", "U1", Value::Null, handler.clone(), 0);
        tracker.register_at("C1", "2", "U1", Value::Null, handler, 3 * DAY_MS);

        assert_eq!(tracker.purge_expired_at(6 * DAY_MS), 1);
        assert_eq!(tracker.purge_expired_at(6 * DAY_MS), 0);
        assert!(!tracker.is_empty());
    }
}
