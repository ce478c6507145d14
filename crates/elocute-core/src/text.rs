//! Text normalization for reference and recognized text.

/// What recognizers return when they hear nothing.
pub const NO_SPEECH_SENTINEL: &str = "No speech detected";

const PUNCTUATION: &[char] = &[
    '.', '?', '!', ',', ':', ';', '-', '"', '\'', '(', ')', '/', '[', ']', '{', '}', '…', '‘',
    '’', '“', '”',
];

/// Lowercase `raw` and strip punctuation.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect()
}

/// Normalize `raw` and split it into words.
pub fn words(raw: &str) -> Vec<String> {
    normalize(raw)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Returns `true` if a transcript carries no speech: empty, blank or the sentinel.
pub fn is_no_speech(transcript: &str) -> bool {
    let trimmed = transcript.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_SPEECH_SENTINEL)
}

/// Number of whitespace-separated tokens, as used for speaking rate.
pub fn word_count(raw: &str) -> usize {
    raw.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(
            words("The quick, brown fox... jumps!"),
            vec!["the", "quick", "brown", "fox", "jumps"]
        );
    }

    #[test]
    fn hyphens_and_apostrophes_join_words() {
        assert_eq!(words("Don't well-known"), vec!["dont", "wellknown"]);
    }

    #[test]
    fn brackets_quotes_and_ellipsis() {
        assert_eq!(
            words("\u{201c}Wait\u{2026}\u{201d} (she said) [softly] {x}/y"),
            vec!["wait", "she", "said", "softly", "xy"]
        );
    }

    #[test]
    fn empty_input_yields_no_words() {
        assert!(words("").is_empty());
        assert!(words("   ").is_empty());
        assert!(words("?!.").is_empty());
    }

    #[test]
    fn no_speech_detection() {
        assert!(is_no_speech(""));
        assert!(is_no_speech("  "));
        assert!(is_no_speech("No speech detected"));
        assert!(is_no_speech("no speech detected "));
        assert!(!is_no_speech("hello"));
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  one two\tthree\n"), 3);
        assert_eq!(word_count(""), 0);
    }
}
