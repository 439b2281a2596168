#![no_main]

use libfuzzer_sys::fuzz_target;

use qotd::channels::{parse_console_line, ChatEvent};

fuzz_target!(|data: &str| {
    let event = parse_console_line(data, || "1700000000.000001".to_string());
    if let Some(ChatEvent::Message(msg)) = event {
        assert!(!msg.channel.is_empty());
        assert!(!msg.user.is_empty());
    }
});
