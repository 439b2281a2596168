//! Answer normalization.
//!
//! Answers are compared after lower-casing, collapsing whitespace and
//! dropping the articles "a", "an" and "the" as whole words, so "The Great Wall"
//! and "great wall" match. The stored answer text is never rewritten.

const STOPWORDS: [&str; 3] = ["a", "an", "the"];

/// Reduce an answer to its canonical comparable form.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    lowered
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two answers are equal once normalized.
pub fn answers_match(expected: &str, given: &str) -> bool {
    normalize(expected) == normalize(given)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_articles_and_case() {
        assert_eq!(normalize("  The Great   Wall "), "great wall");
        assert_eq!(normalize("a great Wall"), "great wall");
        assert_eq!(normalize("An Apple a day"), "apple day");
    }

    #[test]
    fn test_normalize_only_stopwords_is_empty() {
        assert_eq!(normalize("the a an"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_articles_inside_words_survive() {
        assert_eq!(normalize("Theater"), "theater");
        assert_eq!(normalize("Anathema"), "anathema");
    }

    #[test]
    fn test_answers_match() {
        assert!(answers_match("The Great Wall", "great wall"));
        assert!(answers_match("The Great Wall", "a great Wall"));
        assert!(!answers_match("The Great Wall", "great walls"));
    }
}
