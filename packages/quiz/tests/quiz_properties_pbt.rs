//! Property-Based Tests for the quiz progression engine
//!
//! Tests the following invariants:
//! - Question building: count, choice bounds, uniqueness, answer position
//! - Stage partitioning: coverage, contiguity, last-stage remainder
//! - Progress merging: best accuracy never drops, cleared never reverts
//! - Unlock map: first open, sequential gating, cleared stays open
//! - Persistence round trip of well-formed progress documents

use proptest::prelude::*;

use danci_quiz::progress::{build_stage_unlock_map, ProgressStore};
use danci_quiz::storage::MemoryStore;
use danci_quiz::{
    build_questions, create_stage_definitions, StageDefinitionInput, StageProgressEntry,
    StageProgressState, StageResultPayload, VocabularyEntry,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_f64_0_1() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_entry() -> impl Strategy<Value = VocabularyEntry> {
    // 短字符串让重复释义和空字段足够常见
    ("[a-d]{0,2}", "[w-z]{0,1}").prop_map(|(phrase, mean)| VocabularyEntry::new(phrase, mean))
}

fn arb_vocab() -> impl Strategy<Value = Vec<VocabularyEntry>> {
    prop::collection::vec(arb_entry(), 0..40)
}

fn arb_progress_entry(stage_id: String) -> impl Strategy<Value = StageProgressEntry> {
    (
        arb_f64_0_1(),          // best_accuracy
        any::<bool>(),          // cleared
        0u32..=1000u32,         // attempts
        0i64..=4_000_000_000_000i64, // last_played_at
        arb_f64_0_1(),          // last_accuracy
        any::<bool>(),          // has_attempted
    )
        .prop_map(
            move |(best_accuracy, cleared, attempts, last_played_at, last_accuracy, has_attempted)| {
                StageProgressEntry {
                    stage_id: stage_id.clone(),
                    best_accuracy,
                    cleared,
                    attempts,
                    last_played_at,
                    last_accuracy,
                    has_attempted,
                }
            },
        )
}

fn arb_progress_state() -> impl Strategy<Value = StageProgressState> {
    prop::collection::btree_set("[a-z0-9-]{1,16}", 0..8).prop_flat_map(|ids| {
        ids.into_iter()
            .map(|id| arb_progress_entry(id.clone()).prop_map(move |entry| (id.clone(), entry)))
            .collect::<Vec<_>>()
            .prop_map(|pairs| pairs.into_iter().collect::<StageProgressState>())
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn questions_respect_choice_invariants(vocab in arb_vocab(), max_count in 0usize..50) {
        let valid = vocab.iter().filter(|entry| entry.is_valid()).count();
        let questions = build_questions(&vocab, max_count);

        prop_assert_eq!(questions.len(), max_count.min(valid));
        for question in &questions {
            prop_assert!(!question.choices.is_empty() && question.choices.len() <= 4);
            prop_assert_eq!(&question.choices[question.answer_index], &question.mean);
            prop_assert_eq!(question.choices.iter().filter(|c| **c == question.mean).count(), 1);

            let mut unique = question.choices.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), question.choices.len());
        }
    }

    #[test]
    fn stages_partition_valid_words(vocab in arb_vocab(), base in -5i64..30) {
        let result = create_stage_definitions(&StageDefinitionInput {
            dataset_key: "pbt",
            label: "PBT",
            vocab: &vocab,
            base_question_count: base,
        });
        let valid = vocab.iter().filter(|entry| entry.is_valid()).count();

        prop_assert_eq!(result.total_words, valid);
        prop_assert_eq!(result.normalized_question_count, base.max(1) as usize);
        prop_assert_eq!(result.stages.iter().map(|s| s.question_count).sum::<usize>(), valid);

        let mut expected_start = 0;
        for (index, stage) in result.stages.iter().enumerate() {
            prop_assert_eq!(stage.stage_number as usize, index + 1);
            prop_assert_eq!(stage.start_index, expected_start);
            prop_assert!(stage.question_count >= 1);
            prop_assert!(stage.question_count <= result.normalized_question_count);
            expected_start += stage.question_count;
        }
        if let Some(last) = result.stages.last() {
            let remainder = valid - last.start_index;
            prop_assert_eq!(last.question_count, remainder);
        }
    }

    #[test]
    fn recorded_results_are_monotonic(runs in prop::collection::vec((0u32..=12, 0u32..=10), 1..12)) {
        let store = ProgressStore::new(MemoryStore::new());
        let mut previous = StageProgressEntry::untouched("s");

        for (correct_count, total_count) in runs {
            let state = store.record_stage_result(&StageResultPayload {
                stage_id: "s".to_string(),
                correct_count,
                total_count,
            });
            let entry = state["s"].clone();

            prop_assert!(entry.best_accuracy >= previous.best_accuracy);
            prop_assert!(entry.best_accuracy <= 1.0);
            prop_assert!(entry.last_accuracy <= 1.0);
            prop_assert!(!previous.cleared || entry.cleared);
            prop_assert_eq!(entry.attempts, previous.attempts + 1);
            prop_assert!(entry.has_attempted);
            previous = entry;
        }
    }

    #[test]
    fn unlock_map_follows_cleared_flags(flags in prop::collection::vec(any::<bool>(), 0..12)) {
        let vocab: Vec<VocabularyEntry> = (0..flags.len())
            .map(|i| VocabularyEntry::new(format!("w{i}"), format!("m{i}")))
            .collect();
        let stages = create_stage_definitions(&StageDefinitionInput {
            dataset_key: "pbt",
            label: "PBT",
            vocab: &vocab,
            base_question_count: 1,
        })
        .stages;

        let mut progress = StageProgressState::new();
        for (stage, cleared) in stages.iter().zip(&flags) {
            let mut entry = StageProgressEntry::untouched(stage.stage_id.as_str());
            entry.cleared = *cleared;
            entry.has_attempted = *cleared;
            progress.insert(stage.stage_id.clone(), entry);
        }

        let map = build_stage_unlock_map(&stages, &progress);
        prop_assert_eq!(map.len(), stages.len());
        for (index, stage) in stages.iter().enumerate() {
            let expected = index == 0 || flags[index - 1] || flags[index];
            prop_assert_eq!(map[&stage.stage_id], expected);
        }
    }

    #[test]
    fn save_load_round_trip(state in arb_progress_state()) {
        let store = ProgressStore::new(MemoryStore::new());
        store.save(&state);
        let loaded = store.load();
        prop_assert_eq!(&loaded, &state);

        store.save(&loaded);
        prop_assert_eq!(store.load(), state);
    }
}
