//! Shared fixtures for bot integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use qotd::bot::QotdBot;
use qotd::channels::{
    ChannelError, ChannelResult, ChatClient, ChatEvent, IncomingMessage, ReactionEvent,
};
use qotd::config::QotdConfig;

pub const BOT: &str = "QOTD";
pub const DEPLOY: &str = "general";
pub const DEVELOPER: &str = "UDEV";

/// A message the bot posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub channel: String,
    pub text: String,
    pub ts: String,
}

/// Chat client that records everything instead of talking to a server
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
    reactions: Mutex<Vec<(String, String, String)>>,
    names: HashMap<String, String>,
    counter: AtomicU64,
    unreachable_channels: Mutex<HashSet<String>>,
    direct_channels_down: AtomicBool,
}

impl RecordingChannel {
    pub fn with_names(names: &[(&str, &str)]) -> Self {
        Self {
            names: names
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Drain everything posted so far
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Texts posted to `channel`, draining the log
    pub fn take_texts(&self, channel: &str) -> Vec<String> {
        self.take()
            .into_iter()
            .filter(|s| s.channel == channel)
            .map(|s| s.text)
            .collect()
    }

    /// Make every later post to `channel` fail
    pub fn fail_channel(&self, channel: &str) {
        self.unreachable_channels.lock().insert(channel.to_string());
    }

    /// Make every later direct channel lookup fail
    pub fn fail_direct_channels(&self) {
        self.direct_channels_down.store(true, Ordering::SeqCst);
    }

    pub fn reactions(&self) -> Vec<(String, String, String)> {
        self.reactions.lock().clone()
    }

    pub fn next_ts(&self) -> String {
        format!("1700000000.{:06}", self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl ChatClient for RecordingChannel {
    async fn say(&self, channel: &str, text: &str) -> ChannelResult<String> {
        if self.unreachable_channels.lock().contains(channel) {
            return Err(ChannelError::SendFailed {
                channel: channel.to_string(),
                message: "channel_not_found".to_string(),
            });
        }
        let ts = self.next_ts();
        self.sent.lock().push(Sent {
            channel: channel.to_string(),
            text: text.to_string(),
            ts: ts.clone(),
        });
        Ok(ts)
    }

    async fn react(&self, channel: &str, ts: &str, emoji: &str) -> ChannelResult<()> {
        self.reactions
            .lock()
            .push((channel.to_string(), ts.to_string(), emoji.to_string()));
        Ok(())
    }

    async fn direct_channel(&self, user_id: &str) -> ChannelResult<String> {
        if self.direct_channels_down.load(Ordering::SeqCst) {
            return Err(ChannelError::UnknownUser(user_id.to_string()));
        }
        Ok(format!("D{}", user_id))
    }

    async fn lookup_display_name(&self, user_id: &str) -> ChannelResult<Option<String>> {
        Ok(self.names.get(user_id).cloned())
    }
}

pub fn test_config(data_dir: &Path) -> QotdConfig {
    QotdConfig {
        data_dir: data_dir.to_path_buf(),
        deploy_channel: DEPLOY.to_string(),
        bot_user_id: BOT.to_string(),
        developer_id: Some(DEVELOPER.to_string()),
        ..QotdConfig::default()
    }
}

/// A bot over a fresh data directory, with alice (U1), bob (U2) and carol (U3)
pub fn open_bot(data_dir: &Path) -> (QotdBot, Arc<RecordingChannel>) {
    let channel = Arc::new(RecordingChannel::with_names(&[
        ("U1", "alice"),
        ("U2", "bob"),
        ("U3", "carol"),
    ]));
    let bot = QotdBot::open(test_config(data_dir), channel.clone()).unwrap();
    (bot, channel)
}

/// Direct message from `user` in their DM channel
pub async fn dm(bot: &QotdBot, chat: &RecordingChannel, user: &str, text: &str) {
    say_in(bot, chat, &format!("D{}", user), user, text).await;
}

/// Message in `channel`, sent verbatim
pub async fn say_in(bot: &QotdBot, chat: &RecordingChannel, channel: &str, user: &str, text: &str) {
    bot.handle_event(ChatEvent::Message(IncomingMessage {
        channel: channel.to_string(),
        user: user.to_string(),
        text: text.to_string(),
        ts: chat.next_ts(),
    }))
    .await;
}

/// Public message mentioning the bot
pub async fn mention(
    bot: &QotdBot,
    chat: &RecordingChannel,
    channel: &str,
    user: &str,
    text: &str,
) {
    say_in(bot, chat, channel, user, &format!("<@{}> {}", BOT, text)).await;
}

pub async fn react(bot: &QotdBot, channel: &str, ts: &str, user: &str, emoji: &str) {
    bot.handle_event(ChatEvent::Reaction(ReactionEvent {
        channel: channel.to_string(),
        item_ts: ts.to_string(),
        user: user.to_string(),
        emoji: emoji.to_string(),
    }))
    .await;
}

/// Add and publish a question as `user`, clearing the chat log
pub async fn published_question(
    bot: &QotdBot,
    chat: &RecordingChannel,
    user: &str,
    id: &str,
    body: &str,
) {
    dm(bot, chat, user, &format!("question {} {}", id, body)).await;
    dm(bot, chat, user, &format!("publish {}", id)).await;
    chat.take();
}
