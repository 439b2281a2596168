//! Console Channel
//!
//! Line-oriented stand-in for a chat workspace. Input lines are
//!
//! ```text
//! <channel> <user> <text...>
//! !react <channel> <ts> <user> <emoji>
//! ```
//!
//! and every posted message is printed as `[channel ts] text`.

use super::client::{
    ChannelError, ChannelResult, ChatClient, ChatEvent, IncomingMessage, ReactionEvent,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Console-backed chat client
pub struct ConsoleChannel {
    out: Mutex<Box<dyn Write + Send>>,
    counter: AtomicU64,
    display_names: HashMap<String, String>,
}

impl std::fmt::Debug for ConsoleChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleChannel")
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl ConsoleChannel {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            counter: AtomicU64::new(0),
            display_names: HashMap::new(),
        }
    }

    /// Known display names, keyed by user ID
    pub fn with_display_names(mut self, names: HashMap<String, String>) -> Self {
        self.display_names = names;
        self
    }

    /// Next message timestamp, unique for the lifetime of the channel
    pub fn next_ts(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}.{:06}", chrono::Utc::now().timestamp(), n)
    }

    fn print(&self, channel: &str, line: &str) -> ChannelResult<()> {
        let mut out = self.out.lock();
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| {
                warn!(channel = %channel, error = %e, "console write failed");
                ChannelError::SendFailed {
                    channel: channel.to_string(),
                    message: e.to_string(),
                }
            })
    }

    /// Parse an input line, stamping messages with a fresh timestamp.
    pub fn parse_line(&self, line: &str) -> Option<ChatEvent> {
        parse_console_line(line, || self.next_ts())
    }
}

/// Parse one console line. `next_ts` is only called for messages.
pub fn parse_console_line(line: &str, next_ts: impl FnOnce() -> String) -> Option<ChatEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix("!react") {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let [channel, ts, user, emoji] = parts.as_slice() else {
            return None;
        };
        return Some(ChatEvent::Reaction(ReactionEvent {
            channel: channel.to_string(),
            item_ts: ts.to_string(),
            user: user.to_string(),
            emoji: emoji.trim_matches(':').to_string(),
        }));
    }

    let (channel, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let (user, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if user.is_empty() {
        return None;
    }
    let text = text.trim();
    Some(ChatEvent::Message(IncomingMessage {
        channel: channel.to_string(),
        user: user.to_string(),
        text: text.to_string(),
        ts: next_ts(),
    }))
}

#[async_trait]
impl ChatClient for ConsoleChannel {
    async fn say(&self, channel: &str, text: &str) -> ChannelResult<String> {
        let ts = self.next_ts();
        self.print(channel, &format!("[{} {}] {}", channel, ts, text))?;
        Ok(ts)
    }

    async fn react(&self, channel: &str, ts: &str, emoji: &str) -> ChannelResult<()> {
        self.print(channel, &format!("[{} {}] :{}:", channel, ts, emoji))
    }

    async fn direct_channel(&self, user_id: &str) -> ChannelResult<String> {
        if user_id.trim().is_empty() {
            return Err(ChannelError::UnknownUser(user_id.to_string()));
        }
        Ok(format!("D{}", user_id))
    }

    async fn lookup_display_name(&self, user_id: &str) -> ChannelResult<Option<String>> {
        Ok(self.display_names.get(user_id).cloned())
    }
}
