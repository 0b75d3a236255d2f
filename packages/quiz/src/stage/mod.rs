//! Stage Computer
//!
//! Partitions a data-set's valid vocabulary into fixed-size, contiguous
//! stages and slices one stage back out for question building.
//!
//! - `normalized = max(1, base_question_count)`
//! - `total_stages = ceil(total_words / normalized)`
//! - stage `k` covers `[(k-1) * normalized, min(k * normalized, total_words))`
//!
//! Stage ids encode the data-set key, the normalized size and the stage
//! number, so changing the per-stage size never reuses progress recorded
//! against differently sized stages.
//!
//! [`cache::StageDefinitionCache`] wraps [`create_stage_definitions`] with a
//! persisted cache; results are identical with or without it.

pub mod cache;

use crate::question::build_questions;
use crate::shuffle::shuffle_items;
use crate::types::{QuizQuestion, StageDefinition, VocabularyEntry};

// ==================== Types ====================

/// Input for stage generation, one data-set at a time.
#[derive(Debug, Clone, Copy)]
pub struct StageDefinitionInput<'a> {
    pub dataset_key: &'a str,
    /// Display label used for stage titles
    pub label: &'a str,
    pub vocab: &'a [VocabularyEntry],
    /// Configured questions per stage (may be zero or negative)
    pub base_question_count: i64,
}

/// Stage counts derived from vocabulary and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinitionSummary {
    pub total_words: usize,
    pub normalized_question_count: usize,
    pub total_stages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDefinitionResult {
    pub stages: Vec<StageDefinition>,
    pub total_words: usize,
    pub normalized_question_count: usize,
}

/// How the filtered vocabulary is ordered before a stage is sliced out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SliceOrder {
    /// Data-set order
    #[default]
    Natural,
    /// Shuffle the filtered list first; a seed makes it reproducible
    Shuffled { seed: Option<u64> },
}

// ==================== Partitioning ====================

/// Clamp the configured per-stage size to at least one question.
pub fn normalize_question_count(count: i64) -> usize {
    usize::try_from(count.max(1)).unwrap_or(usize::MAX)
}

/// Entries usable for questions, in original order. Same rule as the
/// question builder.
pub fn filter_valid_entries(vocab: &[VocabularyEntry]) -> Vec<&VocabularyEntry> {
    vocab.iter().filter(|entry| entry.is_valid()).collect()
}

pub fn build_stage_id(dataset_key: &str, normalized_question_count: usize, stage_number: u32) -> String {
    format!("{}-q{}-stage{}", dataset_key, normalized_question_count, stage_number)
}

pub(crate) fn stage_title(label: &str, stage_number: u32) -> String {
    format!("{} Stage {}", label, stage_number)
}

pub fn calculate_stage_summary(vocab: &[VocabularyEntry], base_question_count: i64) -> StageDefinitionSummary {
    let total_words = vocab.iter().filter(|entry| entry.is_valid()).count();
    let normalized_question_count = normalize_question_count(base_question_count);
    let total_stages = if total_words == 0 {
        0
    } else {
        total_words.div_ceil(normalized_question_count)
    };

    StageDefinitionSummary {
        total_words,
        normalized_question_count,
        total_stages,
    }
}

pub(crate) fn build_stage_definitions(
    dataset_key: &str,
    label: &str,
    summary: &StageDefinitionSummary,
) -> Vec<StageDefinition> {
    let size = summary.normalized_question_count;

    (0..summary.total_stages)
        .map(|index| {
            let stage_number = index as u32 + 1;
            let start_index = index * size;
            let remaining = summary.total_words.saturating_sub(start_index);

            StageDefinition {
                stage_id: build_stage_id(dataset_key, size, stage_number),
                dataset_key: dataset_key.to_string(),
                title: stage_title(label, stage_number),
                stage_number,
                start_index,
                question_count: size.min(remaining),
                base_question_count: size,
            }
        })
        .collect()
}

/// Compute stage definitions without any cache.
pub fn create_stage_definitions(input: &StageDefinitionInput<'_>) -> StageDefinitionResult {
    let summary = calculate_stage_summary(input.vocab, input.base_question_count);
    let stages = build_stage_definitions(input.dataset_key, input.label, &summary);

    StageDefinitionResult {
        stages,
        total_words: summary.total_words,
        normalized_question_count: summary.normalized_question_count,
    }
}

// ==================== Stage questions ====================

/// Build the questions for one stage.
///
/// The vocabulary is filtered first, then (optionally) shuffled, then
/// sliced. A stage that no longer fits the vocabulary yields whatever part
/// of its range still exists.
pub fn build_stage_questions(
    vocab: &[VocabularyEntry],
    stage: &StageDefinition,
    order: SliceOrder,
) -> Vec<QuizQuestion> {
    let filtered = filter_valid_entries(vocab);
    let ordered = match order {
        SliceOrder::Natural => filtered,
        SliceOrder::Shuffled { seed } => shuffle_items(&filtered, seed),
    };

    let start = stage.start_index.min(ordered.len());
    let end = start.saturating_add(stage.question_count).min(ordered.len());
    let stage_entries: Vec<VocabularyEntry> =
        ordered[start..end].iter().map(|entry| (*entry).clone()).collect();

    build_questions(&stage_entries, stage.question_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> Vec<VocabularyEntry> {
        [("one", "1"), ("two", "2"), ("three", "3"), ("four", "4"), ("five", "5")]
            .iter()
            .map(|(phrase, mean)| VocabularyEntry::new(*phrase, *mean))
            .collect()
    }

    fn words(count: usize) -> Vec<VocabularyEntry> {
        (0..count)
            .map(|i| VocabularyEntry::new(format!("word{i}"), format!("mean{i}")))
            .collect()
    }

    fn input<'a>(vocab: &'a [VocabularyEntry], base: i64) -> StageDefinitionInput<'a> {
        StageDefinitionInput {
            dataset_key: "reiwa3",
            label: "Reiwa 3",
            vocab,
            base_question_count: base,
        }
    }

    #[test]
    fn test_normalize_question_count() {
        assert_eq!(normalize_question_count(0), 1);
        assert_eq!(normalize_question_count(-5), 1);
        assert_eq!(normalize_question_count(1), 1);
        assert_eq!(normalize_question_count(20), 20);
    }

    #[test]
    fn test_five_words_two_per_stage() {
        let vocab = numbers();
        let result = create_stage_definitions(&input(&vocab, 2));

        assert_eq!(result.total_words, 5);
        assert_eq!(result.normalized_question_count, 2);
        let counts: Vec<usize> = result.stages.iter().map(|s| s.question_count).collect();
        assert_eq!(counts, vec![2, 2, 1]);

        let questions = build_stage_questions(&vocab, &result.stages[1], SliceOrder::Natural);
        let phrases: Vec<&str> = questions.iter().map(|q| q.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["three", "four"]);
    }

    #[test]
    fn test_stage_metadata() {
        let vocab = numbers();
        let result = create_stage_definitions(&input(&vocab, 2));
        let last = &result.stages[2];

        assert_eq!(last.stage_id, "reiwa3-q2-stage3");
        assert_eq!(last.title, "Reiwa 3 Stage 3");
        assert_eq!(last.stage_number, 3);
        assert_eq!(last.start_index, 4);
        assert_eq!(last.base_question_count, 2);
        assert_eq!(last.dataset_key, "reiwa3");
    }

    #[test]
    fn test_stage_ids_depend_on_size() {
        let vocab = words(10);
        let small = create_stage_definitions(&input(&vocab, 2));
        let large = create_stage_definitions(&input(&vocab, 5));

        assert_ne!(small.stages[0].stage_id, large.stages[0].stage_id);
    }

    #[test]
    fn test_counts_cover_all_words() {
        for total in [1, 7, 20, 21, 99] {
            for base in [-3, 0, 1, 3, 20, 150] {
                let vocab = words(total);
                let result = create_stage_definitions(&input(&vocab, base));
                let sum: usize = result.stages.iter().map(|s| s.question_count).sum();
                assert_eq!(sum, total);

                for pair in result.stages.windows(2) {
                    assert_eq!(pair[1].start_index, pair[0].start_index + pair[0].question_count);
                    assert_eq!(pair[1].stage_number, pair[0].stage_number + 1);
                }
                let last = result.stages.last().unwrap();
                assert!(last.question_count <= result.normalized_question_count);
            }
        }
    }

    #[test]
    fn test_no_valid_words_no_stages() {
        let vocab = vec![VocabularyEntry::new("", "x"), VocabularyEntry::new("y", "")];
        let result = create_stage_definitions(&input(&vocab, 20));

        assert!(result.stages.is_empty());
        assert_eq!(result.total_words, 0);
    }

    #[test]
    fn test_filter_then_slice() {
        let mut vocab = numbers();
        vocab.insert(1, VocabularyEntry::new("broken", ""));
        let result = create_stage_definitions(&input(&vocab, 2));
        assert_eq!(result.total_words, 5);

        let questions = build_stage_questions(&vocab, &result.stages[0], SliceOrder::Natural);
        let phrases: Vec<&str> = questions.iter().map(|q| q.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["one", "two"]);
    }

    #[test]
    fn test_stale_stage_degrades() {
        let vocab = numbers();
        let result = create_stage_definitions(&input(&vocab, 2));
        let shorter = &vocab[..3];

        let partial = build_stage_questions(shorter, &result.stages[1], SliceOrder::Natural);
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].phrase, "three");

        let gone = build_stage_questions(shorter, &result.stages[2], SliceOrder::Natural);
        assert!(gone.is_empty());
    }

    #[test]
    fn test_shuffled_slice_is_reproducible() {
        let vocab = words(30);
        let result = create_stage_definitions(&input(&vocab, 10));
        let order = SliceOrder::Shuffled { seed: Some(20250101) };

        let first = build_stage_questions(&vocab, &result.stages[0], order);
        let second = build_stage_questions(&vocab, &result.stages[0], order);
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);

        let natural = build_stage_questions(&vocab, &result.stages[0], SliceOrder::Natural);
        assert_ne!(first, natural);
    }
}
