use crate::types::Segment;

/// Default number of words admitted into the summarization prompt.
pub const DEFAULT_MAX_WORDS: usize = 5000;

/// Keep the first `max_words` whitespace-separated words, joined by single spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join timed segments into plain text, dropping timing.
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| seg.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
