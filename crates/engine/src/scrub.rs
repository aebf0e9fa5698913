//! Output cleanup before delivery.
//!
//! Strips boilerplate disclaimer lines that models prepend regardless of
//! instructions. Scrubbing is line-based and conservative: a line is dropped
//! only when it is dominated by disclaimer phrasing, and if scrubbing would
//! leave nothing a short fallback is returned instead of an empty answer.

/// Returned when scrubbing removes the entire answer.
const EMPTY_FALLBACK: &str =
    "I don't have a concrete answer for that. Could you rephrase or narrow the question?";

/// Lines containing these phrases are treated as disclaimers.
const DISCLAIMER_PHRASES: &[&str] = &[
    "as an ai",
    "as a language model",
    "i am an ai",
    "i'm just an ai",
    "i cannot provide professional advice",
    "this is not professional advice",
    "consult a professional",
    "my knowledge cutoff",
    "knowledge cut-off",
];

/// Drop disclaimer lines from a model answer.
pub fn strip_disclaimers(answer: &str) -> String {
    let kept: Vec<&str> = answer
        .lines()
        .filter(|line| !is_disclaimer_line(line))
        .collect();

    let cleaned = kept.join("\n").trim().to_string();
    if cleaned.is_empty() {
        tracing::debug!("answer was entirely disclaimers, using fallback");
        EMPTY_FALLBACK.to_string()
    } else {
        cleaned
    }
}

fn is_disclaimer_line(line: &str) -> bool {
    let lowered = line.to_lowercase();
    DISCLAIMER_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclaimer_lines_are_dropped() {
        let answer = "As an AI language model, I can't promise outcomes.\n\
                      Focus on distributed systems fundamentals.\n\
                      Remember, this is not professional advice.";
        assert_eq!(
            strip_disclaimers(answer),
            "Focus on distributed systems fundamentals."
        );
    }

    #[test]
    fn test_clean_answer_passes_through() {
        let answer = "Practice coding daily.\nRead production code.";
        assert_eq!(strip_disclaimers(answer), answer);
    }

    #[test]
    fn test_all_disclaimers_yields_fallback() {
        let answer = "As an AI, I cannot say.\nConsult a professional.";
        assert_eq!(strip_disclaimers(answer), EMPTY_FALLBACK);
    }

    #[test]
    fn test_whitespace_only_yields_fallback() {
        assert_eq!(strip_disclaimers("   \n  "), EMPTY_FALLBACK);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let answer = "MY KNOWLEDGE CUTOFF prevents this.\nUse Rust 2021 edition.";
        assert_eq!(strip_disclaimers(answer), "Use Rust 2021 edition.");
    }
}
