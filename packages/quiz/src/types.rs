//! Common Types and Constants
//!
//! Shared data structures used across the question, stage, leveling and
//! progress modules. Persisted shapes keep camelCase field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// ==================== Constants ====================

/// Minimum accuracy required to mark a stage cleared
pub const STAGE_CLEAR_THRESHOLD: f64 = 0.9;

/// XP granted per correct answer
pub const XP_PER_CORRECT: u64 = 10;

/// XP granted per incorrect answer (participation reward)
pub const XP_PER_INCORRECT: u64 = 3;

/// Upper bound on choices shown for one question
pub const MAX_CHOICES: usize = 4;

/// Distractors collected per question
pub const DISTRACTOR_COUNT: usize = MAX_CHOICES - 1;

/// Questions per stage when no setting exists for a data-set
pub const DEFAULT_QUESTION_COUNT: i64 = 20;

// ==================== Vocabulary ====================

/// One word/meaning pair as supplied by a vocabulary data-set.
///
/// `null` or missing `phrase`/`mean` fields read as empty strings, which
/// makes the entry invalid rather than failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub phrase: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub mean: String,
    /// Example sentence (English)
    #[serde(default, rename = "onePhrase", skip_serializing_if = "Option::is_none")]
    pub example_en: Option<String>,
    /// Example sentence (translation)
    #[serde(default, rename = "onePhraseJa", skip_serializing_if = "Option::is_none")]
    pub example_ja: Option<String>,
    /// Frequency count in the source corpus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl VocabularyEntry {
    pub fn new(phrase: impl Into<String>, mean: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            mean: mean.into(),
            ..Self::default()
        }
    }

    /// An entry is usable for quizzes iff both phrase and meaning are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.phrase.is_empty() && !self.mean.is_empty()
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ==================== Quiz ====================

/// A multiple-choice question. `choices[answer_index] == mean` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    pub phrase: String,
    pub mean: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_ja: Option<String>,
}

impl QuizQuestion {
    pub fn is_correct(&self, choice_index: usize) -> bool {
        choice_index == self.answer_index
    }
}

// ==================== Stages ====================

/// One stage: a contiguous slice of a data-set's valid vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDefinition {
    pub stage_id: String,
    pub dataset_key: String,
    pub title: String,
    /// 1-based
    pub stage_number: u32,
    pub start_index: usize,
    pub question_count: usize,
    /// Normalized per-stage size this stage was produced with
    pub base_question_count: usize,
}

// ==================== Progress ====================

/// Per-stage mastery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgressEntry {
    pub stage_id: String,
    pub best_accuracy: f64,
    pub cleared: bool,
    pub attempts: u32,
    /// Unix milliseconds
    pub last_played_at: i64,
    pub last_accuracy: f64,
    pub has_attempted: bool,
}

impl StageProgressEntry {
    /// Record for a stage that has never been opened.
    pub fn untouched(stage_id: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            best_accuracy: 0.0,
            cleared: false,
            attempts: 0,
            last_played_at: 0,
            last_accuracy: 0.0,
            has_attempted: false,
        }
    }

    pub fn status(&self) -> StageStatus {
        if self.cleared {
            StageStatus::Cleared
        } else if self.has_attempted {
            StageStatus::Attempted
        } else {
            StageStatus::Untouched
        }
    }
}

/// Stage lifecycle: `Untouched -> Attempted -> Cleared` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Untouched,
    Attempted,
    Cleared,
}

/// Progress document: stage id -> record
pub type StageProgressState = BTreeMap<String, StageProgressEntry>;

/// Stage id -> playable
pub type StageUnlockState = BTreeMap<String, bool>;

// ==================== Leveling ====================

/// Level and progress within the level, derived from cumulative XP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    pub xp_into_level: u64,
    pub xp_for_next_level: u64,
    pub xp_till_next_level: u64,
    /// [0, 1]
    pub progress_ratio: f64,
}
