//! Command table
//!
//! Every chat command the bot understands: aliases, help text, and where it
//! may be used. Dispatch lives in the bot; this module only describes.

pub mod parse;

/// Which command an alias resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Scores,
    ScoresUnranked,
    Question,
    Questions,
    RemoveQuestion,
    MyQuestions,
    Publish,
    Answer,
    Hello,
    AddPoints,
    ExpireOldQuestions,
    OldQuestions,
    Poll,
    Polls,
    PublishPoll,
    Vote,
    Tell,
    DevTell,
    Announce,
    ResetDaily,
}

/// Help listing section, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Misc,
    Scoring,
    Questions,
    Polls,
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::Misc => "Misc",
            Category::Scoring => "Scoring and Points",
            Category::Questions => "Questions and Answers",
            Category::Polls => "Polls",
        }
    }

    const ALL: [Category; 4] = [
        Category::Misc,
        Category::Scoring,
        Category::Questions,
        Category::Polls,
    ];
}

/// Where a command may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Anywhere,
    /// Rejected in direct channels
    PublicOnly,
    /// Rejected outside direct channels
    PrivateOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub kind: CommandKind,
    pub aliases: &'static [&'static str],
    pub category: Category,
    pub help: &'static str,
    pub scope: Scope,
    /// Only the configured developer may run it
    pub dev_only: bool,
    /// Left out of the `help` listing
    pub hidden: bool,
}

const fn command(
    kind: CommandKind,
    aliases: &'static [&'static str],
    category: Category,
    help: &'static str,
) -> CommandSpec {
    CommandSpec {
        kind,
        aliases,
        category,
        help,
        scope: Scope::Anywhere,
        dev_only: false,
        hidden: false,
    }
}

const fn scoped(spec: CommandSpec, scope: Scope) -> CommandSpec {
    CommandSpec { scope, ..spec }
}

const fn hidden(spec: CommandSpec) -> CommandSpec {
    CommandSpec {
        hidden: true,
        ..spec
    }
}

const fn dev(spec: CommandSpec) -> CommandSpec {
    CommandSpec {
        dev_only: true,
        hidden: true,
        ..spec
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    command(
        CommandKind::Scores,
        &["points", "score", "scores"],
        Category::Scoring,
        "`scores <@ user>` - prints a list of today's scores and running totals, for `<@ user>` if given, for everyone otherwise",
    ),
    command(
        CommandKind::ScoresUnranked,
        &["score-unranked", "scores-unranked"],
        Category::Scoring,
        "`scores-unranked` - prints a list of today's scores and running totals, sorted alphabetically instead of by ranking",
    ),
    scoped(
        command(
            CommandKind::Question,
            &["q", "question"],
            Category::Questions,
            "`question [identifier] [question] : <answer>` - creates a question with a reference tag `identifier`.\n\
             `question [identifier] remove` - removes the question with the corresponding ID.\n\
             `question [identifier] count` - shows stats on who has answered/guessed a question.",
        ),
        Scope::PrivateOnly,
    ),
    command(
        CommandKind::Questions,
        &["qs", "questions"],
        Category::Questions,
        "`questions` - prints a list of today's published questions",
    ),
    command(
        CommandKind::RemoveQuestion,
        &["rq", "remove", "remove-question"],
        Category::Questions,
        "`remove [identifier]` - removes the question with the corresponding ID",
    ),
    command(
        CommandKind::MyQuestions,
        &["my-questions"],
        Category::Questions,
        "`my-questions` - prints a list of your questions, published or not",
    ),
    command(
        CommandKind::Publish,
        &["publish"],
        Category::Questions,
        "`publish <identifier>` - publishes the corresponding question if `identifier` given. Publishes all of your questions otherwise.",
    ),
    scoped(
        command(
            CommandKind::Answer,
            &["a", "answer"],
            Category::Questions,
            "`answer [identifier] [your answer]` - Must be used in a private channel. Checks your `answer` for the corresponding question.",
        ),
        Scope::PrivateOnly,
    ),
    command(
        CommandKind::Hello,
        &["hi", "hello", "hola"],
        Category::Misc,
        "`hello` - says hi back and some basic information",
    ),
    scoped(
        command(
            CommandKind::AddPoints,
            &["add-point", "add-points"],
            Category::Scoring,
            "`add-point(s) [@ user] <# points>` - gives `# points` to `@ user` if specified, 1 point by default",
        ),
        Scope::PublicOnly,
    ),
    command(
        CommandKind::ExpireOldQuestions,
        &["expire-old-questions"],
        Category::Questions,
        "`expire-old-questions` - removes all of your questions published more than 18 hours ago",
    ),
    command(
        CommandKind::OldQuestions,
        &["old-questions", "expired-questions", "old-answers"],
        Category::Questions,
        "`old-questions` - gets a list of questions that were expired in the last 24 hours",
    ),
    command(
        CommandKind::Poll,
        &["poll", "p"],
        Category::Polls,
        "`poll [identifier] [question] : [option 1] : [option 2] : ...` - creates a poll with a reference tag `identifier`.\n\
         `poll [identifier] remove` - removes the poll with the corresponding ID.\n\
         `poll [identifier] votes` - shows current vote counts for a poll.",
    ),
    command(
        CommandKind::Polls,
        &["polls"],
        Category::Polls,
        "`polls` - prints a list of the currently active polls",
    ),
    command(
        CommandKind::PublishPoll,
        &["publish-poll", "publish-polls"],
        Category::Polls,
        "`publish-poll <identifier>` - publishes your poll with the specified identifier, or all of your polls",
    ),
    command(
        CommandKind::Vote,
        &["respond", "poll-answer", "poll-respond", "answer-poll", "vote"],
        Category::Polls,
        "`vote [identifier] [option]` - votes on a poll, by option number or option text",
    ),
    hidden(command(
        CommandKind::Tell,
        &["tell", "say", "trash-talk"],
        Category::Misc,
        "`tell [@ user] [message]` - passes `message` on to `@ user` in the deploy channel",
    )),
    dev(command(
        CommandKind::DevTell,
        &["dev-say", "dev-tell", "dev-talk"],
        Category::Misc,
        "`dev-tell [@ user] [message]` - sends `message` to `@ user` directly, as the bot",
    )),
    dev(command(
        CommandKind::Announce,
        &["announce"],
        Category::Misc,
        "`announce [text]` - posts `text` in the deploy channel",
    )),
    dev(command(
        CommandKind::ResetDaily,
        &["reset-daily"],
        Category::Scoring,
        "`reset-daily` - zeroes everyone's daily score",
    )),
];

/// Look up a command by (lowercased) alias
pub fn find(alias: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.aliases.contains(&alias))
}

/// The full `help` listing, grouped by category with sorted entries
pub fn help_text() -> String {
    let mut sections = Vec::new();
    for category in Category::ALL {
        let mut entries: Vec<&str> = COMMANDS
            .iter()
            .filter(|c| c.category == category && !c.hidden)
            .map(|c| c.help)
            .collect();
        if entries.is_empty() {
            continue;
        }
        entries.sort_unstable();

        let mut section = format!("*{}*:\n", category.title());
        for line in entries.iter().flat_map(|help| help.lines()) {
            section.push_str("    ");
            section.push_str(line);
            section.push_str("\n\n");
        }
        sections.push(section);
    }

    format!(
        "Here's a list of commands I know:\n\n{}",
        sections.join("\n\n").trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_aliases_are_unique() {
        let mut seen = HashSet::new();
        for spec in COMMANDS {
            for alias in spec.aliases {
                assert!(seen.insert(*alias), "duplicate alias {alias}");
                assert_eq!(alias.to_lowercase(), *alias);
            }
        }
    }

    #[test]
    fn test_find_by_alias() {
        assert_eq!(find("qs").unwrap().kind, CommandKind::Questions);
        assert_eq!(find("vote").unwrap().kind, CommandKind::Vote);
        assert_eq!(find("add-points").unwrap().scope, Scope::PublicOnly);
        assert_eq!(find("answer").unwrap().scope, Scope::PrivateOnly);
        assert!(find("announce").unwrap().dev_only);
        assert_eq!(find("trash-talk").unwrap().kind, CommandKind::Tell);
        assert!(!find("say").unwrap().dev_only);
        assert!(find("dev-talk").unwrap().dev_only);
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_help_text_groups_and_hides_dev_commands() {
        let help = help_text();
        assert!(help.starts_with("Here's a list of commands I know:\n\n*Misc*:\n    `hello`"));
        let scoring = help.find("*Scoring and Points*").unwrap();
        let questions = help.find("*Questions and Answers*").unwrap();
        let polls = help.find("*Polls*").unwrap();
        assert!(scoring < questions && questions < polls);
        assert!(help.contains("    `question [identifier] remove` - removes"));
        assert!(!help.contains("announce"));
        assert!(!help.contains("reset-daily"));
        assert!(!help.contains("`tell"));
        assert!(!help.contains("dev-tell"));
        assert!(!help.ends_with('\n'));
    }
}
