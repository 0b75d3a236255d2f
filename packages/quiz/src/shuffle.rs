//! Seeded shuffling
//!
//! Every source of ordering randomness in the engine goes through here so
//! that callers (and tests) can force a deterministic order with a seed.
//! Question building and stage slicing themselves never shuffle.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::types::QuizQuestion;

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Returns a shuffled copy of `items`. Same seed, same permutation.
pub fn shuffle_items<T: Clone>(items: &[T], seed: Option<u64>) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut rng_for(seed));
    shuffled
}

/// Returns `question` with its choices permuted and `answer_index` moved
/// along with the correct meaning.
pub fn shuffle_choices(question: &QuizQuestion, seed: Option<u64>) -> QuizQuestion {
    let choices = shuffle_items(&question.choices, seed);
    let answer_index = choices
        .iter()
        .position(|choice| *choice == question.mean)
        .unwrap_or(0);

    QuizQuestion {
        choices,
        answer_index,
        ..question.clone()
    }
}
