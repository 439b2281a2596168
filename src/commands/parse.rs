//! Argument parsing for chat commands.

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// If `text` starts with a mention of `bot_id` (`<@BOTID> ...`), return the
/// rest of the message.
pub fn strip_direct_mention<'a>(text: &'a str, bot_id: &str) -> Option<&'a str> {
    let rest = text.trim_start().strip_prefix("<@")?;
    let end = rest.find('>')?;
    let mentioned = rest[..end].split('|').next().unwrap_or("");
    if mentioned != bot_id {
        return None;
    }
    Some(rest[end + 1..].trim())
}

/// Split `text` into a lowercased command alias and its argument string.
pub fn split_command(text: &str) -> (String, &str) {
    match text.split_once(' ') {
        Some((alias, args)) => (alias.to_lowercase(), args.trim()),
        None => (text.to_lowercase(), ""),
    }
}

/// Split off the first space-separated word; the rest may be empty.
pub fn first_word(args: &str) -> (&str, &str) {
    match args.split_once(' ') {
        Some((word, rest)) => (word, rest.trim()),
        None => (args, ""),
    }
}

/// `<@U123>` or `@U123` to `U123`
pub fn id_from_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '@'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `<@U123>`
pub fn reference_for(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

/// Whether `id` has the shape of a workspace user ID (`U...` or `W...`).
pub fn looks_like_user_id(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('U' | 'W'))
        && id.len() > 1
        && chars.all(|c| c.is_ascii_alphanumeric())
}

/// Lenient point count: the digits in `input`, negated when it starts
/// with `-`. Empty input means 1.
pub fn parse_points(input: &str) -> Option<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Some(1);
    }
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    if input.starts_with('-') {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

/// `question text : answer`, split on the last colon. No colon means no answer.
pub fn split_question(body: &str) -> (&str, &str) {
    match body.rfind(':') {
        Some(i) => (body[..i].trim(), body[i + 1..].trim()),
        None => (body.trim(), ""),
    }
}

/// `question : option 1 : option 2 : ...`
pub fn split_poll(body: &str) -> (&str, Vec<&str>) {
    let mut parts = body.split(" : ");
    let question = parts.next().unwrap_or("").trim();
    let options = parts.map(str::trim).collect();
    (question, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  This   is:\t some \n text "), "This is: some text");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_strip_direct_mention() {
        assert_eq!(strip_direct_mention("<@UBOT> scores", "UBOT"), Some("scores"));
        assert_eq!(strip_direct_mention("<@UBOT|qotd>  help ", "UBOT"), Some("help"));
        assert_eq!(strip_direct_mention("<@UOTHER> scores", "UBOT"), None);
        assert_eq!(strip_direct_mention("hey <@UBOT> scores", "UBOT"), None);
        assert_eq!(strip_direct_mention("<@UBOT", "UBOT"), None);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("Scores <@U1>"), ("scores".to_string(), "<@U1>"));
        assert_eq!(split_command("help"), ("help".to_string(), ""));
    }

    #[test]
    fn test_id_from_reference() {
        assert_eq!(id_from_reference("<@U123>"), "U123");
        assert_eq!(id_from_reference("@U123"), "U123");
        assert_eq!(id_from_reference("U123"), "U123");
    }

    #[test]
    fn test_looks_like_user_id() {
        assert!(looks_like_user_id("U88LK3JN9"));
        assert!(looks_like_user_id("W012"));
        assert!(!looks_like_user_id("C61L4NENS"));
        assert!(!looks_like_user_id("U"));
        assert!(!looks_like_user_id("U1 2"));
        assert!(!looks_like_user_id(""));
    }

    #[test]
    fn test_parse_points() {
        assert_eq!(parse_points(""), Some(1));
        assert_eq!(parse_points("5"), Some(5));
        assert_eq!(parse_points("-3"), Some(-3));
        assert_eq!(parse_points("+2pts"), Some(2));
        assert_eq!(parse_points("lots"), None);
        assert_eq!(parse_points("-"), None);
        assert_eq!(parse_points("99999999999999999999"), None);
    }

    #[test]
    fn test_split_question_uses_last_colon() {
        assert_eq!(
            split_question("What time is it: really? : noon"),
            ("What time is it: really?", "noon")
        );
        assert_eq!(split_question("Who am I?"), ("Who am I?", ""));
        assert_eq!(split_question("Who am I? :"), ("Who am I?", ""));
    }

    #[test]
    fn test_split_poll() {
        assert_eq!(
            split_poll("Favorite color? : Red : Blue"),
            ("Favorite color?", vec!["Red", "Blue"])
        );
        assert_eq!(split_poll("votes"), ("votes", Vec::<&str>::new()));
    }
}
