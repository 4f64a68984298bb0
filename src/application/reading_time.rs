//! Reading-time estimates for post bodies.

const CHARS_PER_MINUTE: usize = 500;
const WORDS_PER_MINUTE: usize = 400;

/// Minutes to read `text` at 500 characters per minute, rounded up, never below one.
pub fn calculate_reading_time(text: Option<&str>) -> u32 {
    let chars = text.map(|value| value.chars().count()).unwrap_or_default();
    let minutes = chars.div_ceil(CHARS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Word-based estimate at 400 words per minute, rounded to nearest.
///
/// Used for bodies written in space-separated languages; absent bodies report
/// `fallback`.
pub fn estimate_reading_time_words(body: Option<&str>, fallback: u32) -> u32 {
    let Some(body) = body else {
        return fallback;
    };
    // An empty body still counts as one word.
    let words = body.split_whitespace().count().max(1);
    let minutes = (words + WORDS_PER_MINUTE / 2) / WORDS_PER_MINUTE;
    u32::try_from(minutes.max(1)).unwrap_or(u32::MAX)
}

pub fn format_reading_time(minutes: u32) -> String {
    format!("{minutes}分で読めます")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_estimate_rounds_up() {
        assert_eq!(calculate_reading_time(None), 1);
        assert_eq!(calculate_reading_time(Some("")), 1);
        assert_eq!(calculate_reading_time(Some(&"あ".repeat(500))), 1);
        assert_eq!(calculate_reading_time(Some(&"あ".repeat(501))), 2);
        assert_eq!(calculate_reading_time(Some(&"a".repeat(2400))), 5);
    }

    #[test]
    fn word_estimate_rounds_to_nearest() {
        let words = |n: usize| vec!["word"; n].join(" ");
        assert_eq!(estimate_reading_time_words(None, 5), 5);
        assert_eq!(estimate_reading_time_words(Some(""), 5), 1);
        assert_eq!(estimate_reading_time_words(Some(&words(599)), 5), 1);
        assert_eq!(estimate_reading_time_words(Some(&words(600)), 5), 2);
        assert_eq!(estimate_reading_time_words(Some(&words(1000)), 5), 3);
    }

    #[test]
    fn formats_in_japanese() {
        assert_eq!(format_reading_time(3), "3分で読めます");
    }
}
