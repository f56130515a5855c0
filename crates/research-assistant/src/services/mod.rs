//! Orchestrators behind the HTTP API.
//!
//! - [`SearchOrchestrator`]: arXiv search, PDF extraction, store ingestion
//! - [`QaOrchestrator`]: question answering over selected papers
//! - [`WritingOrchestrator`]: improvement plans, reviews and future work

mod qa;
mod search;
mod writing;

pub use qa::{FigureIntent, QaOptions, QaOrchestrator};
pub use search::SearchOrchestrator;
pub use writing::{SUMMARY_MARKER, WritingOrchestrator, trim_to_marker};

/// First `max` characters of `text`, cut on a char boundary.
///
/// Returns `None` when no cut was needed.
fn cut_chars(text: &str, max: usize) -> Option<&str> {
    text.char_indices().nth(max).map(|(byte, _)| &text[..byte])
}

/// Truncate to `max` characters, appending `...` when anything was cut.
pub(crate) fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    match cut_chars(text, max) {
        Some(head) => format!("{head}..."),
        None => text.to_string(),
    }
}

/// Truncate to `max` characters.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    cut_chars(text, max).unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("ααααα", 3), "ααα...");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }
}
