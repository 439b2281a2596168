//! One method per chat command.

use rand::seq::IndexedRandom;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::review::ReviewRequest;
use super::{point_announcement, workspace_name, BotResult, QotdBot};
use crate::channels::{is_private_channel, IncomingMessage};
use crate::commands::parse;
use crate::engagement::ReactionHandler;
use crate::outcome::{AddOutcome, PublishOutcome, RemoveOutcome};
use crate::polls::VoteOutcome;
use crate::questions::CheckOutcome;
use crate::scores::PointsOutcome;

pub const POINT_RESPONSES: &[&str] = &[
    "Correct! I'll give you a point",
    ":thumbsup:",
    "Correct! :fast_parrot:",
];

const POLL_RESULT_WORDS: &[&str] = &["votes", "status", "results", "check"];

fn people(n: usize) -> &'static str {
    if n == 1 {
        "person"
    } else {
        "people"
    }
}

impl QotdBot {
    pub(super) async fn scores_cmd(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (target, _) = parse::first_word(args);

        let response = if target.is_empty() {
            let mut boards = self.scores.ranked_daily_board();
            boards.push_str(&self.scores.ranked_all_time_board());
            boards
        } else {
            let user_id = parse::id_from_reference(target);
            if !self.is_known_user(&user_id).await {
                "I couldn't find that user. Use `scores help` for usage instructions".to_string()
            } else {
                match self.scores.user_scores(&user_id) {
                    Some(line) => line,
                    None => format!(
                        "{} doesn't have any points yet",
                        self.display_name(&user_id).await
                    ),
                }
            }
        };

        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn scores_unranked(&self, msg: &IncomingMessage) -> BotResult<()> {
        self.say(&msg.channel, &self.scores.unranked_boards()).await?;
        Ok(())
    }

    pub(super) async fn question(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        if args.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }

        let (id, body) = parse::first_word(args);
        if id == "remove" {
            self.say(
                &msg.channel,
                "You probably meant to use `question [identifier] remove`",
            )
            .await?;
            return Ok(());
        }
        if body.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }

        let (text, answer) = parse::split_question(body);
        match text {
            "remove" => self.remove_question_by_id(msg, id).await,
            "count" => self.question_stats(msg, id).await,
            _ => self.add_question(msg, id, text, answer).await,
        }
    }

    async fn add_question(
        &self,
        msg: &IncomingMessage,
        id: &str,
        text: &str,
        answer: &str,
    ) -> BotResult<()> {
        match self.questions.add(&msg.user, id, text, answer)? {
            AddOutcome::Added => {
                let response = format!(
                    "Okay, I added your question with ID {id}.\n\
                     Use `publish` to make your questions publicly available, \
                     or `question {id} remove` to remove it"
                );
                self.say(&msg.channel, &response).await?;
                if answer.is_empty() {
                    self.say(
                        &msg.channel,
                        "Warning: Your question doesn't seem to have a correct answer. \
                         Make sure this is intended before publishing.",
                    )
                    .await?;
                }
            }
            AddOutcome::DuplicateId => {
                self.say(
                    &msg.channel,
                    "A question with this ID already exists right now. Please use a different one",
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn remove_question_by_id(&self, msg: &IncomingMessage, id: &str) -> BotResult<()> {
        let response = match self.questions.remove_owned(id, self.requester(&msg.user))? {
            RemoveOutcome::Removed => "Okay, I removed that question",
            RemoveOutcome::NotFound => "I couldn't find a question of yours with that ID",
        };
        self.say(&msg.channel, response).await?;
        Ok(())
    }

    async fn question_stats(&self, msg: &IncomingMessage, id: &str) -> BotResult<()> {
        let Some(question) = self.questions.get_owned(id, self.requester(&msg.user)) else {
            self.say(&msg.channel, "I couldn't find a question of yours with that ID")
                .await?;
            return Ok(());
        };

        let answers = question.count_answers();
        let guesses = question.count_guesses();
        let missed = guesses.saturating_sub(answers);

        let mut response = format!(
            "{} {} answered question {} correctly",
            answers,
            people(answers),
            question.id
        );
        if answers > 0 {
            response.push_str(":\n");
            let mut names = Vec::with_capacity(answers);
            for user_id in &question.answered_by {
                names.push(format!("-{}", self.display_name(user_id).await));
            }
            response.push_str(&names.join("\n"));
        }

        response.push_str(&format!(
            "\n\n{} {} guessed {}, and {} didn't guess the right answer",
            guesses,
            people(guesses),
            question.id,
            missed
        ));
        if missed > 0 {
            response.push_str(":\n");
            let mut names = Vec::with_capacity(missed);
            for user_id in question.unresolved_guessers() {
                names.push(format!("-{}", self.display_name(user_id).await));
            }
            response.push_str(&names.join("\n"));
        }

        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn list_questions(&self, msg: &IncomingMessage) -> BotResult<()> {
        let listed = self.questions.list_published();
        let response = if listed.is_empty() {
            "There are no currently active questions".to_string()
        } else {
            format!(
                "Here are all the currently active questions:\n{}",
                listed.join("\n")
            )
        };
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn remove_question(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (id, _) = parse::first_word(args);
        if id.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }
        self.remove_question_by_id(msg, id).await
    }

    pub(super) async fn my_questions(&self, msg: &IncomingMessage) -> BotResult<()> {
        let listed = self.questions.list_by_user(&msg.user);
        let response = if listed.is_empty() {
            "You have no questions right now. Use `question` to add some".to_string()
        } else {
            format!("Here are all of your questions:\n{}", listed.join("\n"))
        };
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn publish(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (id, _) = parse::first_word(args);

        let response = if id.is_empty() {
            let count = self.questions.publish_all_by_user(&msg.user)?;
            info!(user_id = %msg.user, count, "questions published");
            "Okay, I've published all of your questions".to_string()
        } else {
            match self.questions.publish(id)? {
                PublishOutcome::Published => format!("Okay, I published question {}.", id),
                PublishOutcome::AlreadyPublished => format!("{} is already published.", id),
                PublishOutcome::NotFound => "I couldn't find a question with that ID.".to_string(),
            }
        };

        let fresh = self.questions.first_time_display()?;
        if !fresh.is_empty() {
            self.say(
                &self.config.deploy_channel,
                &format!("New questions:\n{}", fresh.join("\n")),
            )
            .await?;
        }

        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn answer(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (id, guess) = parse::first_word(args);
        if guess.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }

        let response = match self.questions.check_answer(&msg.user, id, guess)? {
            CheckOutcome::Correct => self.award_answer_point(&msg.user, id).await?,
            CheckOutcome::Incorrect { guesses_left } => {
                let mut response = format!(
                    "Incorrect. You have {} {} left.",
                    guesses_left,
                    if guesses_left == 1 { "guess" } else { "guesses" }
                );
                if guesses_left == 0 {
                    if let Some(question) = self.questions.get(id) {
                        response.push_str(&format!(
                            "\nThe correct answer was \"{}\". If you think your guess(es) should have \
                             been correct, contact {}, who submitted the question.",
                            question.answer,
                            parse::reference_for(&question.user_id)
                        ));
                    }
                }
                response
            }
            CheckOutcome::AlreadyAnswered => "You already answered that question!".to_string(),
            CheckOutcome::MaxGuesses => format!(
                "You've already guessed the maximum number of times, {}.",
                self.questions.settings().max_guesses
            ),
            CheckOutcome::NeedsManual => self.request_manual_review(&msg.user, id, guess).await?,
            CheckOutcome::NotFound => {
                "I couldn't find a question with that ID.\nUse `questions` to find the proper ID."
                    .to_string()
            }
        };

        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    /// Credit a correct answer and announce it. Returns the reply for the answerer.
    async fn award_answer_point(&self, user_id: &str, id: &str) -> BotResult<String> {
        // Canonical capitalisation of the identifier
        let question_id = self
            .questions
            .get(id)
            .map(|q| q.id)
            .unwrap_or_else(|| id.to_string());

        let fresh_name = workspace_name(self.client.as_ref(), user_id).await;
        let credited = self
            .scores
            .ensure_and_add_points(user_id, fresh_name.as_deref(), 1)?;
        if credited == PointsOutcome::OutOfRange {
            return Ok("Correct! Your score can't go any higher, though.".to_string());
        }

        let name = self.display_name(user_id).await;
        let self_answered = self.questions.submitter(&question_id).as_deref() == Some(user_id);
        self.say(
            self.config.point_channel(),
            &point_announcement(&name, &question_id, self_answered),
        )
        .await?;

        let reply = POINT_RESPONSES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("Correct!");
        Ok(reply.to_string())
    }

    /// Ask the submitter to judge a guess by reacting to a direct message.
    async fn request_manual_review(
        &self,
        guesser: &str,
        id: &str,
        guess: &str,
    ) -> BotResult<String> {
        let Some(question) = self.questions.get(id) else {
            return Ok("I couldn't find a question with that ID.".to_string());
        };
        let submitter = question.user_id.clone();
        let submitter_name = self.display_name(&submitter).await;
        let guesser_name = self.display_name(guesser).await;

        let dm = self.client.direct_channel(&submitter).await?;
        let prompt = format!(
            "{} has answered \"{}\" for your question,\n{}\nIs this correct? \
             React with :white_check_mark: to accept it or :x: to reject it.",
            guesser_name,
            guess,
            question.pretty_print()
        );
        let ts = self.say(&dm, &prompt).await?;

        let request = ReviewRequest {
            question_id: question.id.clone(),
            guesser: guesser.to_string(),
            guess: guess.to_string(),
        };
        let handler: Arc<dyn ReactionHandler> = self.review.clone();
        self.engagement
            .register(&dm, &ts, &submitter, json!(request), handler);
        info!(
            question_id = %question.id,
            guesser = %guesser,
            submitter = %submitter,
            "manual review requested"
        );

        Ok(format!(
            "This question needs to be validated manually. I'll ask {} to check your answer.",
            submitter_name
        ))
    }

    pub(super) async fn hello(&self, msg: &IncomingMessage) -> BotResult<()> {
        let response = format!(
            "Hello {}, I'm QOTD Bot!\nYour User ID is: {}\nThis channel's ID is: {}\n\
             Use the `help` command for usage instructions.",
            self.display_name(&msg.user).await,
            msg.user,
            msg.channel
        );
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn add_points(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (target, rest) = parse::first_word(args);
        if target.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }
        let (amount, _) = parse::first_word(rest);

        let user_id = parse::id_from_reference(target);
        if !self.is_known_user(&user_id).await {
            self.say(
                &msg.channel,
                "I couldn't find that user. Use `add-point help` for usage instructions",
            )
            .await?;
            return Ok(());
        }

        let Some(points) = parse::parse_points(amount) else {
            self.say(
                &msg.channel,
                &format!("I couldn't interpret {} as a number. Try again", amount),
            )
            .await?;
            return Ok(());
        };

        let fresh_name = workspace_name(self.client.as_ref(), &user_id).await;
        let outcome = self
            .scores
            .ensure_and_add_points(&user_id, fresh_name.as_deref(), points)?;
        let name = self.display_name(&user_id).await;

        if outcome == PointsOutcome::OutOfRange {
            let response = format!(
                "{} points would put {}'s score out of range, so I left it alone",
                points, name
            );
            self.say(&msg.channel, &response).await?;
            return Ok(());
        }
        info!(by = %msg.user, user_id = %user_id, points, "points added by hand");

        let response = format!(
            "Okay, I gave {} point{} to {}",
            points,
            if points == 1 { "" } else { "s" },
            name
        );
        self.say(&self.config.deploy_channel, &response).await?;
        Ok(())
    }

    pub(super) async fn expire_old_questions(&self, msg: &IncomingMessage) -> BotResult<()> {
        let expired = self.questions.expire(&msg.user)?;
        if expired.is_empty() {
            let response = format!(
                "No questions of yours older than {} hours were found",
                self.questions.settings().expiry_hours
            );
            self.say(&msg.channel, &response).await?;
            return Ok(());
        }

        let mut lines = Vec::new();
        for question in &expired {
            lines.push(question.pretty_print_with_answer());
            if !question.answered_by.is_empty() {
                lines.push("    Answered by:".to_string());
            }
            for user_id in &question.answered_by {
                lines.push(format!("        -{}", self.display_name(user_id).await));
            }
            lines.push("\n".to_string());
        }
        let response = format!("The following questions have expired:\n{}", lines.join("\n"));

        if msg.channel != self.config.deploy_channel {
            self.say(&self.config.deploy_channel, &response).await?;
        }
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn old_questions(&self, msg: &IncomingMessage) -> BotResult<()> {
        let hours = self.questions.settings().old_question_window_hours;
        let old = self.questions.old_questions();
        let response = if old.is_empty() {
            format!(
                "I couldn't find any questions that were expired in the last {} hours",
                hours
            )
        } else {
            format!(
                "Here are all of the questions I found that were expired in the last {} hours:\n\n{}",
                hours,
                old.join("\n")
            )
        };
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn poll(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        if args.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }

        let (id, body) = parse::first_word(args);
        if id == "remove" {
            self.say(&msg.channel, "You probably meant to use `poll [identifier] remove`")
                .await?;
            return Ok(());
        }
        if body.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }

        let (text, options) = parse::split_poll(body);

        if text == "remove" {
            let response = match self.polls.remove_owned(id, self.requester(&msg.user))? {
                RemoveOutcome::Removed => "Okay, I removed that poll",
                RemoveOutcome::NotFound => "I couldn't find a poll of yours with that ID",
            };
            self.say(&msg.channel, response).await?;
            return Ok(());
        }

        if POLL_RESULT_WORDS.contains(&text) {
            let response = self
                .polls
                .display_results(id)
                .unwrap_or_else(|| "I couldn't find a poll with that ID".to_string());
            self.say(&msg.channel, &response).await?;
            return Ok(());
        }

        let response = match self.polls.add(&msg.user, id, text, options)? {
            AddOutcome::Added => {
                let preview = self
                    .polls
                    .get(id)
                    .map(|p| p.pretty_print_with_options())
                    .unwrap_or_default();
                format!(
                    "Okay, I added your poll with ID {id}.\nIt looks like this:\n\n\n{preview}\n\n\n\
                     Use `publish-poll` to make your poll publicly available, \
                     or `poll {id} remove` to remove it"
                )
            }
            AddOutcome::DuplicateId => {
                "A poll with this ID already exists right now. Please use a different one"
                    .to_string()
            }
        };
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn list_polls(&self, msg: &IncomingMessage) -> BotResult<()> {
        let listed = self.polls.list_published();
        let response = if listed.is_empty() {
            "There are no currently active polls".to_string()
        } else {
            format!("Here are all the currently active polls:\n{}", listed.join("\n"))
        };
        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn publish_poll(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (id, _) = parse::first_word(args);

        let response = if id.is_empty() {
            let count = self.polls.publish_all_by_user(&msg.user)?;
            info!(user_id = %msg.user, count, "polls published");
            "Okay, I've published all of your polls".to_string()
        } else {
            match self.polls.publish(id)? {
                PublishOutcome::Published => format!("Okay, I published poll {}.", id),
                PublishOutcome::AlreadyPublished => format!("{} is already published.", id),
                PublishOutcome::NotFound => "I couldn't find a poll with that ID.".to_string(),
            }
        };

        let fresh = self.polls.first_time_display()?;
        if !fresh.is_empty() {
            self.say(
                &self.config.deploy_channel,
                &format!("New polls:\n{}", fresh.join("\n")),
            )
            .await?;
        }

        self.say(&msg.channel, &response).await?;
        Ok(())
    }

    pub(super) async fn vote(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let (id, choice) = parse::first_word(args);
        if choice.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }

        match self.polls.submit_response(&msg.user, id, choice)? {
            VoteOutcome::Accepted => {
                self.client.react(&msg.channel, &msg.ts, "thumbsup").await?;
            }
            VoteOutcome::NotFound => {
                self.say(&msg.channel, "I couldn't find a poll with that ID.")
                    .await?;
            }
            VoteOutcome::InvalidOption => {
                self.say(
                    &msg.channel,
                    &format!("I couldn't find an option that matches \"{}\".", choice),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Split `<@user> message`, replying on bad input
    async fn relay_target<'a>(
        &self,
        msg: &IncomingMessage,
        args: &'a str,
    ) -> BotResult<Option<(String, &'a str)>> {
        let (target, text) = parse::first_word(args);
        if text.is_empty() {
            self.needs_more_args(&msg.channel).await?;
            return Ok(None);
        }
        let user_id = parse::id_from_reference(target);
        if !self.is_known_user(&user_id).await {
            self.say(
                &msg.channel,
                "I couldn't find that user. Use `tell help` for usage instructions",
            )
            .await?;
            return Ok(None);
        }
        Ok(Some((user_id, text)))
    }

    pub(super) async fn tell(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let Some((user_id, text)) = self.relay_target(msg, args).await? else {
            return Ok(());
        };
        let response = format!(
            "Hey {}, {} says {}",
            parse::reference_for(&user_id),
            parse::reference_for(&msg.user),
            text
        );
        self.say(&self.config.deploy_channel, &response).await?;
        Ok(())
    }

    pub(super) async fn dev_tell(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        let Some((user_id, text)) = self.relay_target(msg, args).await? else {
            return Ok(());
        };
        let dm = self.client.direct_channel(&user_id).await?;
        self.say(&dm, text).await?;
        info!(by = %msg.user, user_id = %user_id, "message relayed");
        if is_private_channel(&msg.channel) && msg.channel != dm {
            self.say(&msg.channel, "Okay, I passed that on").await?;
        }
        Ok(())
    }

    pub(super) async fn announce(&self, msg: &IncomingMessage, args: &str) -> BotResult<()> {
        if args.is_empty() {
            return self.needs_more_args(&msg.channel).await;
        }
        self.say(&self.config.deploy_channel, args).await?;
        if is_private_channel(&msg.channel) {
            self.say(&msg.channel, "Okay, I announced that").await?;
        }
        Ok(())
    }

    pub(super) async fn reset_daily(&self, msg: &IncomingMessage) -> BotResult<()> {
        self.scores.reset_daily()?;
        self.say(&msg.channel, "Okay, I reset everyone's scores for today")
            .await?;
        Ok(())
    }
}
