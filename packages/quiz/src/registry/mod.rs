//! Data-set registry
//!
//! A [`Registry`] is built once per session by [`merge_registry`] from the
//! built-in catalogue and the player's imported sets, then passed by
//! reference to whoever needs it. Looking up an unknown key is a caller
//! bug and fails with [`QuizError::UnknownDataset`].

mod player;

pub use player::{ImportOutcome, PlayerRegistryStore};

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};
use crate::types::{VocabularyEntry, DEFAULT_QUESTION_COUNT};

/// One playable data-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub key: String,
    pub label: String,
    pub section_label: String,
    pub vocab: Vec<VocabularyEntry>,
    pub default_question_count: i64,
}

impl RegistryEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>, vocab: Vec<VocabularyEntry>) -> Self {
        let label = label.into();
        Self {
            key: key.into(),
            section_label: label.clone(),
            label,
            vocab,
            default_question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

/// A data-set imported by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRegistryEntry {
    pub id: String,
    pub key: String,
    pub label: String,
    pub vocab: Vec<VocabularyEntry>,
}

impl From<&PlayerRegistryEntry> for RegistryEntry {
    fn from(entry: &PlayerRegistryEntry) -> Self {
        RegistryEntry::new(entry.key.clone(), entry.label.clone(), entry.vocab.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

/// Built-in entries first, then the player's, in their given order.
pub fn merge_registry(base: Vec<RegistryEntry>, player: &[PlayerRegistryEntry]) -> Registry {
    let mut entries = base;
    entries.extend(player.iter().map(RegistryEntry::from));
    Registry { entries }
}

impl Registry {
    /// First entry with `key`; an unknown key is an error.
    pub fn get(&self, key: &str) -> QuizResult<&RegistryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .ok_or_else(|| QuizError::UnknownDataset(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
