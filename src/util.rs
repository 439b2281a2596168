//! Small helpers shared by the stores.

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Question and poll identifiers compare case-insensitively.
pub fn ids_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_ignores_case() {
        assert!(ids_match("Q1", "q1"));
        assert!(ids_match("ÄBC", "äbc"));
        assert!(!ids_match("q1", "q2"));
    }
}
