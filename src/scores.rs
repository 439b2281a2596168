//! Score Store
//!
//! Per-user point totals. Each user carries two counters: points earned
//! today and the all-time total. Crediting points bumps both; the daily
//! counter is reset on its own by whoever owns the day boundary.

use crate::storage::{JsonFile, StoreResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{error, info, warn};

/// One user's scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub user_id: String,
    /// Name to show instead of the chat platform's display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub daily: i64,
    #[serde(default)]
    pub total: i64,
}

impl ScoreEntry {
    fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: None,
            daily: 0,
            total: 0,
        }
    }

    /// Display name override, falling back to the raw user ID
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }

    /// Credit both counters, or neither if either would overflow.
    fn credit(&mut self, points: i64) -> bool {
        match (self.daily.checked_add(points), self.total.checked_add(points)) {
            (Some(daily), Some(total)) => {
                self.daily = daily;
                self.total = total;
                true
            }
            _ => false,
        }
    }
}

/// Which counter a board reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Daily,
    AllTime,
}

impl Board {
    fn title(self) -> &'static str {
        match self {
            Board::Daily => "Today's scores",
            Board::AllTime => "Running totals",
        }
    }

    fn points(self, entry: &ScoreEntry) -> i64 {
        match self {
            Board::Daily => entry.daily,
            Board::AllTime => entry.total,
        }
    }
}

/// A row on a scoreboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub user_id: String,
    pub name: String,
    pub points: i64,
}

/// Result of crediting points to an existing user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsOutcome {
    Credited,
    /// The user has no score entry yet; nothing was changed
    UnknownUser,
    /// A counter would leave the `i64` range; nothing was changed
    OutOfRange,
}

/// On-disk layout of `scores.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoreState {
    users: Vec<ScoreEntry>,
}

impl ScoreState {
    fn find(&self, user_id: &str) -> Option<&ScoreEntry> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    fn find_mut(&mut self, user_id: &str) -> Option<&mut ScoreEntry> {
        self.users.iter_mut().find(|u| u.user_id == user_id)
    }
}

/// Persistent scoreboard
#[derive(Debug)]
pub struct ScoreStore {
    file: JsonFile,
    state: RwLock<ScoreState>,
}

impl ScoreStore {
    pub fn open(file: JsonFile) -> StoreResult<Self> {
        let state: ScoreState = file.load()?;
        info!(path = %file.path().display(), users = state.users.len(), "score store loaded");
        Ok(Self {
            file,
            state: RwLock::new(state),
        })
    }

    fn persist(&self, state: &ScoreState) -> StoreResult<()> {
        self.file.save(state).inspect_err(|e| {
            error!(error = %e, "failed to persist scores");
        })
    }

    pub fn user_exists(&self, user_id: &str) -> bool {
        self.state.read().find(user_id).is_some()
    }

    /// Add a user with zero points. Returns `false` if they already exist.
    pub fn create_user(&self, user_id: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        if state.find(user_id).is_some() {
            return Ok(false);
        }
        state.users.push(ScoreEntry::new(user_id));
        info!(user_id = %user_id, "score entry created");
        self.persist(&state)?;
        Ok(true)
    }

    /// Set the display-name override. Returns `false` for unknown users.
    pub fn set_display_name(&self, user_id: &str, name: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        let Some(entry) = state.find_mut(user_id) else {
            return Ok(false);
        };
        entry.display_name = Some(name.to_string());
        self.persist(&state)?;
        Ok(true)
    }

    pub fn display_name(&self, user_id: &str) -> Option<String> {
        self.state
            .read()
            .find(user_id)
            .and_then(|e| e.display_name.clone())
    }

    /// Credit `points` (possibly negative) to both counters of an existing user.
    pub fn add_points(&self, user_id: &str, points: i64) -> StoreResult<PointsOutcome> {
        let mut state = self.state.write();
        let Some(entry) = state.find_mut(user_id) else {
            return Ok(PointsOutcome::UnknownUser);
        };
        if !entry.credit(points) {
            warn!(user_id = %user_id, points, "points out of range, not credited");
            return Ok(PointsOutcome::OutOfRange);
        }
        info!(user_id = %user_id, points, total = entry.total, "points credited");
        self.persist(&state)?;
        Ok(PointsOutcome::Credited)
    }

    /// Create the user if needed, name them if they have no name yet, and
    /// credit `points`, all in one save. Never returns `UnknownUser`.
    pub fn ensure_and_add_points(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        points: i64,
    ) -> StoreResult<PointsOutcome> {
        let mut state = self.state.write();
        let Some(pos) = state.users.iter().position(|u| u.user_id == user_id) else {
            let mut entry = ScoreEntry::new(user_id);
            entry.display_name = display_name.map(str::to_string);
            // A fresh entry starts at zero, so any amount fits
            entry.credit(points);
            info!(user_id = %user_id, points, "score entry created");
            state.users.push(entry);
            self.persist(&state)?;
            return Ok(PointsOutcome::Credited);
        };

        let entry = &mut state.users[pos];
        if !entry.credit(points) {
            warn!(user_id = %user_id, points, "points out of range, not credited");
            return Ok(PointsOutcome::OutOfRange);
        }
        if entry.display_name.is_none() {
            entry.display_name = display_name.map(str::to_string);
        }
        info!(user_id = %user_id, points, total = entry.total, "points credited");
        self.persist(&state)?;
        Ok(PointsOutcome::Credited)
    }

    pub fn daily_total(&self, user_id: &str) -> Option<i64> {
        self.state.read().find(user_id).map(|e| e.daily)
    }

    pub fn all_time_total(&self, user_id: &str) -> Option<i64> {
        self.state.read().find(user_id).map(|e| e.total)
    }

    /// Zero every user's daily counter.
    pub fn reset_daily(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        for entry in state.users.iter_mut() {
            entry.daily = 0;
        }
        info!(users = state.users.len(), "daily scores reset");
        self.persist(&state)
    }

    /// Board rows by points, highest first; ties keep the order users joined.
    pub fn ranked(&self, board: Board) -> Vec<Standing> {
        let mut rows = self.standings(board);
        // sort_by_key is stable
        rows.sort_by_key(|row| Reverse(row.points));
        rows
    }

    /// Board rows alphabetically by display name
    pub fn alphabetical(&self, board: Board) -> Vec<Standing> {
        let mut rows = self.standings(board);
        rows.sort_by_key(|row| row.name.to_lowercase());
        rows
    }

    fn standings(&self, board: Board) -> Vec<Standing> {
        self.state
            .read()
            .users
            .iter()
            .filter(|e| board == Board::AllTime || e.daily != 0)
            .map(|e| Standing {
                user_id: e.user_id.clone(),
                name: e.name().to_string(),
                points: board.points(e),
            })
            .collect()
    }

    pub fn ranked_daily_board(&self) -> String {
        render_ranked(Board::Daily, &self.ranked(Board::Daily))
    }

    pub fn ranked_all_time_board(&self) -> String {
        render_ranked(Board::AllTime, &self.ranked(Board::AllTime))
    }

    /// Both boards, sorted alphabetically instead of by points
    pub fn unranked_boards(&self) -> String {
        let mut out = render_unranked(Board::Daily, &self.alphabetical(Board::Daily));
        out.push('\n');
        out.push_str(&render_unranked(
            Board::AllTime,
            &self.alphabetical(Board::AllTime),
        ));
        out
    }

    /// One user's scores as a sentence
    pub fn user_scores(&self, user_id: &str) -> Option<String> {
        let state = self.state.read();
        let entry = state.find(user_id)?;
        Some(format!(
            "{} has {} today and {} in total",
            entry.name(),
            plural_points(entry.daily),
            plural_points(entry.total)
        ))
    }
}

fn plural_points(points: i64) -> String {
    if points == 1 {
        "1 point".to_string()
    } else {
        format!("{} points", points)
    }
}

fn render_ranked(board: Board, rows: &[Standing]) -> String {
    let mut out = format!("*{}*:\n", board.title());
    if rows.is_empty() {
        out.push_str("    nobody yet\n");
    }
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!("    {}. {}: {}\n", i + 1, row.name, row.points));
    }
    out
}

fn render_unranked(board: Board, rows: &[Standing]) -> String {
    let mut out = format!("*{}*:\n", board.title());
    if rows.is_empty() {
        out.push_str("    nobody yet\n");
    }
    for row in rows {
        out.push_str(&format!("    {}: {}\n", row.name, row.points));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, ScoreStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ScoreStore::open(JsonFile::new(dir.path().join("scores.json"))).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_and_credit() {
        let (_dir, store) = open_store();
        assert!(!store.user_exists("U1"));
        assert_eq!(store.add_points("U1", 1).unwrap(), PointsOutcome::UnknownUser);

        assert!(store.create_user("U1").unwrap());
        assert!(!store.create_user("U1").unwrap());
        assert_eq!(store.add_points("U1", 3).unwrap(), PointsOutcome::Credited);
        assert_eq!(store.add_points("U1", -1).unwrap(), PointsOutcome::Credited);

        assert_eq!(store.daily_total("U1"), Some(2));
        assert_eq!(store.all_time_total("U1"), Some(2));
        assert_eq!(store.daily_total("U9"), None);
    }

    #[test]
    fn test_overflowing_credit_is_refused() {
        let (_dir, store) = open_store();
        assert_eq!(
            store.ensure_and_add_points("U1", Some("alice"), i64::MAX).unwrap(),
            PointsOutcome::Credited
        );
        assert_eq!(
            store.ensure_and_add_points("U1", None, 5).unwrap(),
            PointsOutcome::OutOfRange
        );
        assert_eq!(store.add_points("U1", 1).unwrap(), PointsOutcome::OutOfRange);
        assert_eq!(store.all_time_total("U1"), Some(i64::MAX));
        assert_eq!(store.daily_total("U1"), Some(i64::MAX));

        // Still usable in the other direction
        assert_eq!(store.add_points("U1", -5).unwrap(), PointsOutcome::Credited);
        assert_eq!(store.all_time_total("U1"), Some(i64::MAX - 5));
    }

    #[test]
    fn test_daily_overflow_leaves_total_untouched() {
        let (_dir, store) = open_store();
        store.ensure_and_add_points("U1", None, -10).unwrap();
        store.reset_daily().unwrap();
        assert_eq!(store.add_points("U1", i64::MAX).unwrap(), PointsOutcome::Credited);

        assert_eq!(store.add_points("U1", 1).unwrap(), PointsOutcome::OutOfRange);
        assert_eq!(store.daily_total("U1"), Some(i64::MAX));
        assert_eq!(store.all_time_total("U1"), Some(i64::MAX - 10));
    }

    #[test]
    fn test_reset_daily_keeps_total() {
        let (_dir, store) = open_store();
        store.ensure_and_add_points("U1", Some("alice"), 4).unwrap();
        store.reset_daily().unwrap();
        store.ensure_and_add_points("U1", Some("ignored"), 1).unwrap();

        assert_eq!(store.daily_total("U1"), Some(1));
        assert_eq!(store.all_time_total("U1"), Some(5));
        assert_eq!(store.display_name("U1").as_deref(), Some("alice"));
    }

    #[test]
    fn test_set_display_name() {
        let (_dir, store) = open_store();
        assert!(!store.set_display_name("U1", "alice").unwrap());
        store.create_user("U1").unwrap();
        assert!(store.set_display_name("U1", "alice").unwrap());
        assert_eq!(
            store.user_scores("U1").unwrap(),
            "alice has 0 points today and 0 points in total"
        );
    }

    #[test]
    fn test_ranked_ties_keep_insertion_order() {
        let (_dir, store) = open_store();
        store.ensure_and_add_points("U1", Some("carol"), 2).unwrap();
        store.ensure_and_add_points("U2", Some("bob"), 5).unwrap();
        store.ensure_and_add_points("U3", Some("alice"), 2).unwrap();

        let names: Vec<String> = store
            .ranked(Board::AllTime)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["bob", "carol", "alice"]);

        assert_eq!(
            store.ranked_all_time_board(),
            "*Running totals*:\n    1. bob: 5\n    2. carol: 2\n    3. alice: 2\n"
        );
    }

    #[test]
    fn test_unranked_is_alphabetical() {
        let (_dir, store) = open_store();
        store.ensure_and_add_points("U1", Some("carol"), 2).unwrap();
        store.ensure_and_add_points("U2", Some("Bob"), 5).unwrap();
        store.ensure_and_add_points("U3", Some("alice"), 1).unwrap();
        store.reset_daily().unwrap();
        store.add_points("U1", 1).unwrap();

        assert_eq!(
            store.unranked_boards(),
            "*Today's scores*:\n    carol: 1\n\n*Running totals*:\n    alice: 1\n    Bob: 5\n    carol: 3\n"
        );
    }

    #[test]
    fn test_empty_daily_board() {
        let (_dir, store) = open_store();
        assert_eq!(store.ranked_daily_board(), "*Today's scores*:\n    nobody yet\n");
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        {
            let store = ScoreStore::open(JsonFile::new(&path)).unwrap();
            store.ensure_and_add_points("U1", Some("alice"), 3).unwrap();
            store.ensure_and_add_points("U2", None, 1).unwrap();
            store.reset_daily().unwrap();
            store.add_points("U2", 2).unwrap();
        }

        let store = ScoreStore::open(JsonFile::new(&path)).unwrap();
        assert_eq!(store.all_time_total("U1"), Some(3));
        assert_eq!(store.daily_total("U1"), Some(0));
        assert_eq!(store.daily_total("U2"), Some(2));
        assert_eq!(store.display_name("U1").as_deref(), Some("alice"));
        assert_eq!(store.display_name("U2"), None);
        assert_eq!(
            store.ranked_daily_board(),
            "*Today's scores*:\n    1. U2: 2\n"
        );
    }
}
