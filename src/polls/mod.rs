//! Polling Module
//!
//! User-submitted polls with numbered options and one active vote per user.

pub mod store;
pub mod types;

pub use store::PollStore;
pub use types::{OptionTally, Poll, PollOption, PollResults, VoteOutcome};
