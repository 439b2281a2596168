//! qotd library
//!
//! Core of the question-of-the-day bot: question, poll and score stores,
//! answer normalization, reaction tracking, and the command layer that
//! drives them from chat events.

pub mod answers;
pub mod bot;
pub mod channels;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engagement;
pub mod logging;
pub mod outcome;
pub mod polls;
pub mod questions;
pub mod scores;
pub mod storage;
pub mod util;
