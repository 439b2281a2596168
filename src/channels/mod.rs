//! Chat channels
//!
//! The [`ChatClient`] seam plus a console implementation used by the binary.

pub mod client;
pub mod console;

pub use client::{
    is_private_channel, ChannelError, ChannelResult, ChatClient, ChatEvent, DynChatClient,
    IncomingMessage, ReactionEvent,
};
pub use console::{parse_console_line, ConsoleChannel};
