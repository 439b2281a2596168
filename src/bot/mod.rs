//! QOTD Bot
//!
//! Turns chat events into store operations and replies. Messages are only
//! treated as commands when they start by mentioning the bot or arrive in
//! a direct channel.

mod handlers;
pub mod review;

pub use handlers::POINT_RESPONSES;
pub use review::{ManualReviewHandler, ReviewRequest};

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::channels::{
    is_private_channel, ChannelError, ChatClient, ChatEvent, DynChatClient, IncomingMessage,
    ReactionEvent,
};
use crate::commands::{self, parse, CommandKind, CommandSpec, Scope};
use crate::config::QotdConfig;
use crate::engagement::{EngagementTracker, ReactionDispatch};
use crate::outcome::Requester;
use crate::polls::PollStore;
use crate::questions::QuestionStore;
use crate::scores::ScoreStore;
use crate::storage::{JsonFile, StoreError, StoreResult};

pub const QUESTIONS_FILE: &str = "questions.json";
pub const POLLS_FILE: &str = "polls.json";
pub const SCORES_FILE: &str = "scores.json";

/// Errors surfaced while running a command
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

pub type BotResult<T> = Result<T, BotError>;

/// The bot: stores, chat client and reaction tracking
pub struct QotdBot {
    config: QotdConfig,
    client: DynChatClient,
    questions: Arc<QuestionStore>,
    polls: Arc<PollStore>,
    scores: Arc<ScoreStore>,
    engagement: Arc<EngagementTracker>,
    review: Arc<ManualReviewHandler>,
}

impl std::fmt::Debug for QotdBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QotdBot")
            .field("data_dir", &self.config.data_dir)
            .field("questions", &self.questions.len())
            .field("polls", &self.polls.len())
            .field("tracked_messages", &self.engagement.len())
            .finish()
    }
}

impl QotdBot {
    /// Open the three stores under `config.data_dir`.
    pub fn open(config: QotdConfig, client: DynChatClient) -> StoreResult<Self> {
        let dir = config.data_dir.clone();
        let questions = QuestionStore::open(
            JsonFile::new(dir.join(QUESTIONS_FILE)),
            config.question_settings(),
        )?;
        let polls = PollStore::open(JsonFile::new(dir.join(POLLS_FILE)))?;
        let scores = ScoreStore::open(JsonFile::new(dir.join(SCORES_FILE)))?;

        Ok(Self::new(
            config,
            client,
            Arc::new(questions),
            Arc::new(polls),
            Arc::new(scores),
        ))
    }

    pub fn new(
        config: QotdConfig,
        client: DynChatClient,
        questions: Arc<QuestionStore>,
        polls: Arc<PollStore>,
        scores: Arc<ScoreStore>,
    ) -> Self {
        let engagement = Arc::new(EngagementTracker::new(config.engagement_max_age_days));
        let review = Arc::new(ManualReviewHandler::new(
            Arc::clone(&questions),
            Arc::clone(&scores),
            Arc::clone(&client),
            config.point_channel(),
        ));

        Self {
            config,
            client,
            questions,
            polls,
            scores,
            engagement,
            review,
        }
    }

    pub fn config(&self) -> &QotdConfig {
        &self.config
    }

    pub fn questions(&self) -> &QuestionStore {
        &self.questions
    }

    pub fn polls(&self) -> &PollStore {
        &self.polls
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    pub fn engagement(&self) -> &EngagementTracker {
        &self.engagement
    }

    pub async fn handle_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Message(msg) => self.handle_message(&msg).await,
            ChatEvent::Reaction(reaction) => {
                self.handle_reaction(&reaction).await;
            }
        }
    }

    /// Periodic housekeeping
    pub fn tick(&self) {
        let purged = self.engagement.purge_expired();
        if purged > 0 {
            debug!(purged, "engagement records expired");
        }
    }

    pub async fn handle_reaction(&self, reaction: &ReactionEvent) -> ReactionDispatch {
        let dispatch = self
            .engagement
            .on_reaction_added(
                &reaction.channel,
                &reaction.item_ts,
                &reaction.user,
                &reaction.emoji,
            )
            .await;
        debug!(
            channel = %reaction.channel,
            ts = %reaction.item_ts,
            user_id = %reaction.user,
            emoji = %reaction.emoji,
            ?dispatch,
            "reaction handled"
        );
        dispatch
    }

    /// The command text of a message addressed to the bot, whitespace collapsed
    pub fn command_text(&self, msg: &IncomingMessage) -> Option<String> {
        if msg.user == self.config.bot_user_id {
            return None;
        }
        if let Some(rest) = parse::strip_direct_mention(&msg.text, &self.config.bot_user_id) {
            return Some(parse::collapse_whitespace(rest));
        }
        if is_private_channel(&msg.channel) {
            return Some(parse::collapse_whitespace(&msg.text));
        }
        None
    }

    pub async fn handle_message(&self, msg: &IncomingMessage) {
        let Some(text) = self.command_text(msg) else {
            return;
        };
        let (alias, args) = parse::split_command(&text);
        info!(channel = %msg.channel, user_id = %msg.user, command = %alias, "command received");

        if let Err(e) = self.dispatch(msg, &alias, args).await {
            error!(
                channel = %msg.channel,
                user_id = %msg.user,
                command = %alias,
                error = %e,
                "command failed"
            );
            let apology = match e {
                BotError::Store(_) => "Sorry, I couldn't save that change. Please try again later.",
                BotError::Channel(_) => "Sorry, something went wrong talking to the chat server.",
            };
            if let Err(e) = self.say(&msg.channel, apology).await {
                warn!(channel = %msg.channel, error = %e, "failed to send apology");
            }
        }
    }

    async fn dispatch(&self, msg: &IncomingMessage, alias: &str, args: &str) -> BotResult<()> {
        if alias == "help" {
            self.say(&msg.channel, &commands::help_text()).await?;
            return Ok(());
        }

        let Some(spec) = commands::find(alias) else {
            debug!(command = %alias, "unknown command ignored");
            return Ok(());
        };

        if args == "help" {
            self.say(&msg.channel, spec.help).await?;
            return Ok(());
        }

        if let Some(refusal) = self.refusal(spec, msg) {
            self.say(&msg.channel, &refusal).await?;
            return Ok(());
        }

        match spec.kind {
            CommandKind::Scores => self.scores_cmd(msg, args).await,
            CommandKind::ScoresUnranked => self.scores_unranked(msg).await,
            CommandKind::Question => self.question(msg, args).await,
            CommandKind::Questions => self.list_questions(msg).await,
            CommandKind::RemoveQuestion => self.remove_question(msg, args).await,
            CommandKind::MyQuestions => self.my_questions(msg).await,
            CommandKind::Publish => self.publish(msg, args).await,
            CommandKind::Answer => self.answer(msg, args).await,
            CommandKind::Hello => self.hello(msg).await,
            CommandKind::AddPoints => self.add_points(msg, args).await,
            CommandKind::ExpireOldQuestions => self.expire_old_questions(msg).await,
            CommandKind::OldQuestions => self.old_questions(msg).await,
            CommandKind::Poll => self.poll(msg, args).await,
            CommandKind::Polls => self.list_polls(msg).await,
            CommandKind::PublishPoll => self.publish_poll(msg, args).await,
            CommandKind::Vote => self.vote(msg, args).await,
            CommandKind::Tell => self.tell(msg, args).await,
            CommandKind::DevTell => self.dev_tell(msg, args).await,
            CommandKind::Announce => self.announce(msg, args).await,
            CommandKind::ResetDaily => self.reset_daily(msg).await,
        }
    }

    fn refusal(&self, spec: &CommandSpec, msg: &IncomingMessage) -> Option<String> {
        if spec.dev_only && !self.config.is_developer(&msg.user) {
            return Some(format!(
                "I'm sorry, {}, I'm afraid I can't let you do that.",
                parse::reference_for(&msg.user)
            ));
        }
        let private = is_private_channel(&msg.channel);
        match spec.scope {
            Scope::PublicOnly if private => Some(
                "You can't use this command in a private channel. Use the public channel instead"
                    .to_string(),
            ),
            Scope::PrivateOnly if !private => Some(
                "You can't use this command in a public channel. Message me directly instead"
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn requester<'a>(&self, user_id: &'a str) -> Requester<'a> {
        if self.config.is_developer(user_id) {
            Requester::Developer
        } else {
            Requester::User(user_id)
        }
    }

    /// Post a message, returning its timestamp
    async fn say(&self, channel: &str, text: &str) -> Result<String, ChannelError> {
        info!(channel = %channel, text = %text, "bot says");
        self.client.say(channel, text).await
    }

    async fn needs_more_args(&self, channel: &str) -> BotResult<()> {
        self.say(
            channel,
            "This command needs more arguments! Type \"(command) help\" for usage",
        )
        .await?;
        Ok(())
    }

    async fn display_name(&self, user_id: &str) -> String {
        display_name(&self.scores, self.client.as_ref(), user_id).await
    }

    /// Whether `user_id` names a real user: known to the scoreboard, shaped
    /// like a user ID, or known to the workspace.
    async fn is_known_user(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        if self.scores.user_exists(user_id) || parse::looks_like_user_id(user_id) {
            return true;
        }
        matches!(self.client.lookup_display_name(user_id).await, Ok(Some(_)))
    }
}

/// Scoreboard name override, then the workspace display name, then the ID.
pub(crate) async fn display_name(
    scores: &ScoreStore,
    client: &dyn ChatClient,
    user_id: &str,
) -> String {
    if let Some(name) = scores.display_name(user_id) {
        return name;
    }
    workspace_name(client, user_id)
        .await
        .unwrap_or_else(|| user_id.to_string())
}

/// The workspace display name, if the lookup succeeds
pub(crate) async fn workspace_name(client: &dyn ChatClient, user_id: &str) -> Option<String> {
    match client.lookup_display_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "display name lookup failed");
            None
        }
    }
}

/// Announcement for a newly credited point
pub(crate) fn point_announcement(name: &str, question_id: &str, self_answered: bool) -> String {
    let mut text = if question_id.is_empty() {
        format!("Point for {}!", name)
    } else {
        format!("Point for {} on question {}!", name, question_id)
    };
    if self_answered {
        text.push_str("\nThough they are the one who submitted it :wha:...");
    }
    text
}
