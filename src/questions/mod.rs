//! Questions Module
//!
//! Trivia questions submitted by users: publication, guess-limited answer
//! checking and expiration.

pub mod store;
pub mod types;

pub use store::{QuestionSettings, QuestionStore};
pub use types::{CheckOutcome, ExpiredQuestion, Question, ReviewOutcome};
