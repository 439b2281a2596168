//! Chat Client Trait
//!
//! The interface the bot uses to talk to a chat workspace, plus the
//! inbound event shapes it reacts to.

use async_trait::async_trait;
use std::sync::Arc;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur in channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Message send to {channel} failed: {message}")]
    SendFailed { channel: String, message: String },

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// A message posted in a channel the bot can see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Channel ID; direct channels start with `D`
    pub channel: String,
    /// Sender ID
    pub user: String,
    /// Raw message text
    pub text: String,
    /// Message timestamp (channel-specific ID)
    pub ts: String,
}

/// A reaction added to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// Channel holding the reacted-to message
    pub channel: String,
    /// Timestamp of the reacted-to message
    pub item_ts: String,
    /// User who reacted
    pub user: String,
    /// Emoji name without colons
    pub emoji: String,
}

/// Anything the bot receives from the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message(IncomingMessage),
    Reaction(ReactionEvent),
}

/// Outbound operations against the chat workspace
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post `text` to `channel`, returning the new message's timestamp
    async fn say(&self, channel: &str, text: &str) -> ChannelResult<String>;

    /// Add a reaction to a message
    async fn react(&self, channel: &str, ts: &str, emoji: &str) -> ChannelResult<()>;

    /// Open (or find) the direct channel with a user
    async fn direct_channel(&self, user_id: &str) -> ChannelResult<String>;

    /// The user's display name, if the workspace knows one
    async fn lookup_display_name(&self, user_id: &str) -> ChannelResult<Option<String>>;
}

/// Type-erased client for storage
pub type DynChatClient = Arc<dyn ChatClient>;

/// Direct (private) channel IDs start with `D`
pub fn is_private_channel(channel: &str) -> bool {
    channel.starts_with('D')
}
