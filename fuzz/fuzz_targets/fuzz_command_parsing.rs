#![no_main]

use libfuzzer_sys::fuzz_target;

use qotd::commands::{self, parse};

fuzz_target!(|data: &str| {
    // Chat text is untrusted: every slicing helper must hold up against
    // multi-byte characters, stray brackets and empty segments.
    let stripped = parse::strip_direct_mention(data, "UBOT").unwrap_or(data);
    let text = parse::collapse_whitespace(stripped);
    let (alias, args) = parse::split_command(&text);
    let _ = commands::find(&alias);

    let (first, rest) = parse::first_word(args);
    let user_id = parse::id_from_reference(first);
    let _ = parse::looks_like_user_id(&user_id);
    let _ = parse::parse_points(rest);

    let (question, answer) = parse::split_question(rest);
    assert!(!answer.contains(':'), "answer split on the last colon");
    let _ = question;

    let (_, options) = parse::split_poll(rest);
    for option in options {
        assert_eq!(option, option.trim());
    }
});
