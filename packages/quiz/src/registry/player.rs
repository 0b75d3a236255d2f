//! Player-imported data-sets, persisted under `playerRegistry:v1`.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::warn;

use super::PlayerRegistryEntry;
use crate::error::{QuizError, QuizResult};
use crate::storage::{load_document, now_millis, save_document, Clock, KeyValueStore, PLAYER_REGISTRY_KEY};
use crate::types::VocabularyEntry;

/// Imported words must carry string `phrase` and `mean`.
#[derive(Debug, Clone, Deserialize)]
struct ImportedWord {
    phrase: String,
    mean: String,
    #[serde(default, rename = "onePhrase")]
    example_en: Option<String>,
    #[serde(default, rename = "onePhraseJa")]
    example_ja: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}

impl From<ImportedWord> for VocabularyEntry {
    fn from(word: ImportedWord) -> Self {
        VocabularyEntry {
            phrase: word.phrase,
            mean: word.mean,
            example_en: word.example_en,
            example_ja: word.example_ja,
            count: word.count,
        }
    }
}

/// Stored or imported entry; `id` may be missing in older documents.
#[derive(Debug, Clone, Deserialize)]
struct PlayerRegistryInput {
    #[serde(default)]
    id: Option<String>,
    key: String,
    label: String,
    vocab: Vec<ImportedWord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Entry(PlayerRegistryInput),
    Entries(Vec<PlayerRegistryInput>),
    Vocab(Vec<ImportedWord>),
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Full registry after the import
    pub entries: Vec<PlayerRegistryEntry>,
    pub words_added: usize,
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

pub struct PlayerRegistryStore<S> {
    store: S,
    clock: Clock,
}

impl<S: KeyValueStore> PlayerRegistryStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: now_millis,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn create_id(&self, base: &str, index: usize) -> String {
        let slug = slugify(base);
        let slug = if slug.is_empty() { "custom" } else { slug.as_str() };
        format!("player-{}-{}-{}-{}", slug, (self.clock)(), index, random_suffix())
    }

    /// Fill in missing ids and replace duplicated ones.
    fn normalize(&self, inputs: Vec<PlayerRegistryInput>) -> (Vec<PlayerRegistryEntry>, bool) {
        let mut used_ids = HashSet::new();
        let mut changed = false;

        let entries = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let mut id = input.id.unwrap_or_default();
                if id.is_empty() || used_ids.contains(&id) {
                    let base = if input.key.is_empty() { input.label.as_str() } else { input.key.as_str() };
                    id = self.create_id(base, index);
                    changed = true;
                }
                used_ids.insert(id.clone());

                PlayerRegistryEntry {
                    id,
                    key: input.key,
                    label: input.label,
                    vocab: input.vocab.into_iter().map(VocabularyEntry::from).collect(),
                }
            })
            .collect();

        (entries, changed)
    }

    fn load_inputs(&self) -> Vec<PlayerRegistryInput> {
        match load_document::<Vec<PlayerRegistryInput>, _>(&self.store, PLAYER_REGISTRY_KEY) {
            Ok(inputs) => inputs.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to load player registry");
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[PlayerRegistryEntry]) {
        if let Err(err) = save_document(&self.store, PLAYER_REGISTRY_KEY, entries) {
            warn!(error = %err, "failed to persist player registry");
        }
    }

    /// Imported sets; an id repair is written back immediately.
    pub fn load(&self) -> Vec<PlayerRegistryEntry> {
        let (entries, changed) = self.normalize(self.load_inputs());
        if changed {
            self.save(&entries);
        }
        entries
    }

    /// Import a JSON file. Accepts one `{key, label, vocab}` object, an
    /// array of them, or a bare array of `{phrase, mean}` words (key and
    /// label then come from the file name).
    pub fn import_json(&self, file_name: &str, raw: &str) -> QuizResult<ImportOutcome> {
        if !file_name.to_lowercase().ends_with(".json") {
            return Err(QuizError::InvalidImport("only JSON files can be imported".to_string()));
        }

        let payload: ImportPayload = serde_json::from_str(raw).map_err(|_| {
            QuizError::InvalidImport(
                "use an array of items with \"phrase\" and \"mean\", or a JSON object with \"key\", \"label\" and \"vocab\""
                    .to_string(),
            )
        })?;

        let incoming = match payload {
            ImportPayload::Entry(entry) => vec![entry],
            ImportPayload::Entries(entries) => entries,
            ImportPayload::Vocab(vocab) if !vocab.is_empty() => {
                vec![self.entry_from_file_name(file_name, vocab)]
            }
            ImportPayload::Vocab(_) => Vec::new(),
        };
        if incoming.is_empty() {
            return Err(QuizError::InvalidImport("the file contains no data-sets".to_string()));
        }

        let words_added = incoming.iter().map(|entry| entry.vocab.len()).sum();
        let mut inputs = self.load_inputs();
        inputs.extend(incoming);

        let (entries, _) = self.normalize(inputs);
        self.save(&entries);

        Ok(ImportOutcome {
            entries,
            words_added,
        })
    }

    fn entry_from_file_name(&self, file_name: &str, vocab: Vec<ImportedWord>) -> PlayerRegistryInput {
        let base_name = strip_json_extension(file_name).trim();
        let slug = slugify(base_name);
        let key = if slug.is_empty() {
            format!("player-{}", (self.clock)())
        } else {
            format!("player-{}", slug)
        };
        let label = if base_name.is_empty() {
            "Player Extra".to_string()
        } else {
            base_name.to_string()
        };

        let id = self.create_id(if base_name.is_empty() { key.as_str() } else { base_name }, 0);

        PlayerRegistryInput {
            id: Some(id),
            key,
            label,
            vocab,
        }
    }

    pub fn remove(&self, id: &str) -> Vec<PlayerRegistryEntry> {
        let remaining: Vec<PlayerRegistryEntry> =
            self.load().into_iter().filter(|entry| entry.id != id).collect();
        self.save(&remaining);
        remaining
    }
}

fn strip_json_extension(file_name: &str) -> &str {
    let split = file_name.len().saturating_sub(".json".len());
    match file_name.get(split..) {
        Some(ext) if ext.eq_ignore_ascii_case(".json") => &file_name[..split],
        _ => file_name,
    }
}
