use crate::error::NO_GOOD_QUESTIONS_MESSAGE;
use std::cmp::Ordering;

fn word_count(question: &str) -> usize {
    question.split_whitespace().count()
}

/// Longer questions first, ties broken by lexicographic order of the text.
pub fn rank_order(left: &str, right: &str) -> Ordering {
    word_count(right)
        .cmp(&word_count(left))
        .then_with(|| left.cmp(right))
}

pub fn rank(mut questions: Vec<String>) -> Vec<String> {
    questions.sort_by(|left, right| rank_order(left, right));
    questions
}

/// Ranks `questions` and keeps the first `limit`. An empty input yields the
/// "could not generate" sentinel.
pub fn select(questions: Vec<String>, limit: usize) -> Vec<String> {
    if questions.is_empty() {
        return vec![NO_GOOD_QUESTIONS_MESSAGE.to_string()];
    }

    rank(questions).into_iter().take(limit).collect()
}
