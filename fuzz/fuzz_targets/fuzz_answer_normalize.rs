#![no_main]

use libfuzzer_sys::fuzz_target;

use qotd::answers::{answers_match, normalize};

fuzz_target!(|data: &str| {
    let normalized = normalize(data);

    // Never leaves padding behind
    assert_eq!(normalized.trim(), normalized);
    assert!(!normalized.contains("  "));

    let _ = answers_match(data, &normalized);
});
