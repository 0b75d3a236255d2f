//! Question Builder
//!
//! Turns vocabulary entries into multiple-choice questions.
//!
//! Rules:
//! - Only valid entries (non-empty phrase and meaning) are used, in input order
//! - The first `min(max_count, valid)` entries become questions, no shuffling
//! - Distractors come from a circular forward scan starting at the next entry,
//!   skipping meanings that are empty, equal to the answer, or already chosen
//! - The correct meaning is always the first choice; callers that want the
//!   answer position randomized use [`crate::shuffle::shuffle_choices`]

use crate::types::{QuizQuestion, VocabularyEntry, DISTRACTOR_COUNT, MAX_CHOICES};

/// Build up to `max_count` questions from `entries`.
///
/// Degenerate input (no valid entries, a single distinct meaning) yields
/// fewer questions or fewer choices, never an error.
pub fn build_questions(entries: &[VocabularyEntry], max_count: usize) -> Vec<QuizQuestion> {
    let valid: Vec<&VocabularyEntry> = entries.iter().filter(|entry| entry.is_valid()).collect();
    let take = max_count.min(valid.len());

    (0..take).map(|index| build_question(&valid, index)).collect()
}

fn build_question(valid: &[&VocabularyEntry], index: usize) -> QuizQuestion {
    let entry = valid[index];
    let distractors = collect_distractors(valid, index);

    let choices: Vec<String> = std::iter::once(entry.mean.as_str())
        .chain(distractors)
        .take(MAX_CHOICES)
        .map(str::to_string)
        .collect();
    let answer_index = choices
        .iter()
        .position(|choice| *choice == entry.mean)
        .unwrap_or(0);

    QuizQuestion {
        id: format!("{}-{}", entry.phrase, index),
        prompt: format!("What does \"{}\" mean?", entry.phrase),
        choices,
        answer_index,
        phrase: entry.phrase.clone(),
        mean: entry.mean.clone(),
        context_en: entry.example_en.clone(),
        context_ja: entry.example_ja.clone(),
    }
}

fn collect_distractors<'a>(valid: &[&'a VocabularyEntry], index: usize) -> Vec<&'a str> {
    let correct = valid[index].mean.as_str();
    let mut distractors: Vec<&'a str> = Vec::with_capacity(DISTRACTOR_COUNT);

    for offset in 1..valid.len() {
        if distractors.len() >= DISTRACTOR_COUNT {
            break;
        }
        let candidate = valid[(index + offset) % valid.len()].mean.as_str();
        if candidate.is_empty() || candidate == correct || distractors.contains(&candidate) {
            continue;
        }
        distractors.push(candidate);
    }

    distractors
}
