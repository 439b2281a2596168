//! Manual answer review
//!
//! Questions without a stored answer are judged by their submitter: the bot
//! DMs the guess and watches that message. A check mark from the submitter
//! accepts the guess, a cross rejects it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{display_name, point_announcement, workspace_name};
use crate::channels::DynChatClient;
use crate::engagement::{Completion, ReactionContext, ReactionHandler};
use crate::questions::{QuestionStore, ReviewOutcome};
use crate::scores::{PointsOutcome, ScoreStore};

pub const ACCEPT_EMOJI: &[&str] = &["white_check_mark", "heavy_check_mark", "+1"];
pub const REJECT_EMOJI: &[&str] = &["x", "-1"];

/// Payload stored with a review prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub question_id: String,
    pub guesser: String,
    pub guess: String,
}

/// Resolves review prompts from the submitter's reaction
pub struct ManualReviewHandler {
    questions: Arc<QuestionStore>,
    scores: Arc<ScoreStore>,
    client: DynChatClient,
    point_channel: String,
}

impl ManualReviewHandler {
    pub fn new(
        questions: Arc<QuestionStore>,
        scores: Arc<ScoreStore>,
        client: DynChatClient,
        point_channel: &str,
    ) -> Self {
        Self {
            questions,
            scores,
            client,
            point_channel: point_channel.to_string(),
        }
    }

    /// Tell the guesser, logging rather than failing on delivery problems
    async fn notify(&self, user_id: &str, text: &str) {
        let sent = match self.client.direct_channel(user_id).await {
            Ok(dm) => self.client.say(&dm, text).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            warn!(user_id = %user_id, error = %e, "failed to notify user of review");
        }
    }

    async fn accept(&self, reviewer: &str, request: &ReviewRequest) -> Completion {
        let outcome = match self
            .questions
            .mark_correct(&request.guesser, &request.question_id)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // Keep watching so the submitter can react again
                error!(
                    question_id = %request.question_id,
                    error = %e,
                    "failed to record reviewed answer"
                );
                return Completion::Continue;
            }
        };

        match outcome {
            ReviewOutcome::Accepted => {
                let fresh_name = workspace_name(self.client.as_ref(), &request.guesser).await;
                let credited = match self
                    .scores
                    .ensure_and_add_points(&request.guesser, fresh_name.as_deref(), 1)
                {
                    Ok(PointsOutcome::Credited) => true,
                    Ok(outcome) => {
                        warn!(user_id = %request.guesser, ?outcome, "reviewed answer not credited");
                        false
                    }
                    Err(e) => {
                        error!(
                            user_id = %request.guesser,
                            error = %e,
                            "failed to credit reviewed answer"
                        );
                        true
                    }
                };

                let reviewer_name =
                    display_name(&self.scores, self.client.as_ref(), reviewer).await;
                let guesser_name =
                    display_name(&self.scores, self.client.as_ref(), &request.guesser).await;
                self.notify(
                    &request.guesser,
                    &format!(
                        "{} accepted your answer \"{}\" for question {}. I'll give you a point!",
                        reviewer_name, request.guess, request.question_id
                    ),
                )
                .await;

                if credited {
                    let announcement =
                        point_announcement(&guesser_name, &request.question_id, false);
                    if let Err(e) = self.client.say(&self.point_channel, &announcement).await {
                        warn!(channel = %self.point_channel, error = %e, "failed to announce point");
                    }
                }
                info!(
                    question_id = %request.question_id,
                    user_id = %request.guesser,
                    "reviewed answer accepted"
                );
            }
            ReviewOutcome::AlreadyAnswered | ReviewOutcome::NotFound => {
                info!(
                    question_id = %request.question_id,
                    user_id = %request.guesser,
                    ?outcome,
                    "review no longer applies"
                );
            }
        }
        Completion::Complete
    }

    async fn reject(&self, reviewer: &str, request: &ReviewRequest) -> Completion {
        let reviewer_name = display_name(&self.scores, self.client.as_ref(), reviewer).await;
        self.notify(
            &request.guesser,
            &format!(
                "{} didn't accept your answer \"{}\" for question {}.",
                reviewer_name, request.guess, request.question_id
            ),
        )
        .await;
        info!(
            question_id = %request.question_id,
            user_id = %request.guesser,
            "reviewed answer rejected"
        );
        Completion::Complete
    }
}

#[async_trait]
impl ReactionHandler for ManualReviewHandler {
    async fn on_reaction(&self, ctx: &ReactionContext) -> Completion {
        if ctx.reacting_user != ctx.registered_user {
            return Completion::Continue;
        }

        let request: ReviewRequest = match serde_json::from_value(ctx.payload.clone()) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "malformed review payload, dropping");
                return Completion::Complete;
            }
        };

        let emoji = ctx.emoji.as_str();
        if ACCEPT_EMOJI.contains(&emoji) {
            self.accept(&ctx.reacting_user, &request).await
        } else if REJECT_EMOJI.contains(&emoji) {
            self.reject(&ctx.reacting_user, &request).await
        } else {
            Completion::Continue
        }
    }
}
