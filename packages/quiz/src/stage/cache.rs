//! Stage definition cache
//!
//! Persists computed stage layouts under their own storage key, keyed by
//! `(data-set, normalized size)`. An entry is reused only when it matches
//! the freshly computed summary; anything else is recomputed. Titles are
//! always rebuilt from the current label.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    build_stage_definitions, build_stage_id, calculate_stage_summary, stage_title,
    StageDefinitionInput, StageDefinitionResult, StageDefinitionSummary,
};
use crate::storage::{
    load_document, now_millis, save_document, Clock, KeyValueStore, StorageError,
    STAGE_DEFINITION_CACHE_KEY,
};
use crate::types::StageDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageDefinitionCacheEntry {
    total_words: usize,
    normalized_question_count: usize,
    stages: Vec<StageDefinition>,
    saved_at: i64,
}

pub fn build_stage_cache_key(dataset_key: &str, normalized_question_count: usize) -> String {
    format!("{}-q{}", dataset_key, normalized_question_count)
}

pub struct StageDefinitionCache<S> {
    store: S,
    clock: Clock,
}

impl<S: KeyValueStore> StageDefinitionCache<S> {
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

    /// Same contract as [`super::create_stage_definitions`], reusing a
    /// persisted layout when it is still valid.
    ///
    /// The cache document is read once per call. A failed read is not
    /// followed by a write, so one call logs at most one warning.
    pub fn create_stage_definitions(&self, input: &StageDefinitionInput<'_>) -> StageDefinitionResult {
        let summary = calculate_stage_summary(input.vocab, input.base_question_count);
        let cache_key = build_stage_cache_key(input.dataset_key, summary.normalized_question_count);
        let cache = self.load_cache();

        let cached = cache
            .as_ref()
            .and_then(|cache| cached_stages(cache, &cache_key, input, &summary));

        let stages = match cached {
            Some(stages) => {
                debug!(cache_key = %cache_key, "stage definition cache hit");
                stages
            }
            None => {
                debug!(cache_key = %cache_key, "stage definition cache miss");
                let stages = build_stage_definitions(input.dataset_key, input.label, &summary);
                if let Some(cache) = cache {
                    self.store_stages(cache, &cache_key, &summary, &stages);
                }
                stages
            }
        };

        StageDefinitionResult {
            stages,
            total_words: summary.total_words,
            normalized_question_count: summary.normalized_question_count,
        }
    }

    /// Drop every cached layout.
    pub fn clear(&self) {
        if let Err(err) = self.store.remove_item(STAGE_DEFINITION_CACHE_KEY) {
            warn!(error = %err, "failed to clear stage definition cache");
        }
    }

    /// `None` when storage could not be read at all; a corrupt document
    /// reads as an empty map and is overwritten on the next store.
    fn load_cache(&self) -> Option<Map<String, Value>> {
        match load_document::<Value, _>(&self.store, STAGE_DEFINITION_CACHE_KEY) {
            Ok(None) => Some(Map::new()),
            Ok(Some(Value::Object(map))) => Some(map),
            Ok(Some(_)) => {
                warn!("stage definition cache is not an object, discarding");
                Some(Map::new())
            }
            Err(StorageError::Serialization(err)) => {
                warn!(error = %err, "stage definition cache is corrupt, discarding");
                Some(Map::new())
            }
            Err(err) => {
                warn!(error = %err, "failed to read stage definition cache");
                None
            }
        }
    }

    fn store_stages(
        &self,
        mut cache: Map<String, Value>,
        cache_key: &str,
        summary: &StageDefinitionSummary,
        stages: &[StageDefinition],
    ) {
        let entry = StageDefinitionCacheEntry {
            total_words: summary.total_words,
            normalized_question_count: summary.normalized_question_count,
            stages: stages.to_vec(),
            saved_at: (self.clock)(),
        };

        let value = match serde_json::to_value(&entry) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to serialize stage definitions");
                return;
            }
        };
        cache.insert(cache_key.to_string(), value);

        if let Err(err) = save_document(&self.store, STAGE_DEFINITION_CACHE_KEY, &cache) {
            warn!(error = %err, "failed to persist stage definition cache");
        }
    }
}

fn cached_stages(
    cache: &Map<String, Value>,
    cache_key: &str,
    input: &StageDefinitionInput<'_>,
    summary: &StageDefinitionSummary,
) -> Option<Vec<StageDefinition>> {
    let raw = cache.get(cache_key)?;
    let entry = match StageDefinitionCacheEntry::deserialize(raw) {
        Ok(entry) => entry,
        Err(err) => {
            warn!(cache_key = %cache_key, error = %err, "stage definition cache entry is corrupt, discarding");
            return None;
        }
    };

    if !entry_matches(&entry, input.dataset_key, summary) {
        return None;
    }

    Some(
        entry
            .stages
            .into_iter()
            .map(|stage| StageDefinition {
                dataset_key: input.dataset_key.to_string(),
                title: stage_title(input.label, stage.stage_number),
                base_question_count: summary.normalized_question_count,
                ..stage
            })
            .collect(),
    )
}

/// Freshness is `total_words`; the layout check also rejects entries that
/// were edited or truncated by hand.
fn entry_matches(entry: &StageDefinitionCacheEntry, dataset_key: &str, summary: &StageDefinitionSummary) -> bool {
    let size = summary.normalized_question_count;
    if entry.total_words != summary.total_words
        || entry.normalized_question_count != size
        || entry.stages.len() != summary.total_stages
    {
        return false;
    }

    entry.stages.iter().enumerate().all(|(index, stage)| {
        let stage_number = index as u32 + 1;
        let start_index = index * size;
        stage.stage_number == stage_number
            && stage.start_index == start_index
            && stage.question_count == size.min(summary.total_words - start_index)
            && stage.stage_id == build_stage_id(dataset_key, size, stage_number)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::create_stage_definitions;
    use crate::storage::MemoryStore;
    use crate::types::VocabularyEntry;
    use std::sync::Arc;

    fn fixed_clock() -> i64 {
        1_700_000_000_000
    }

    fn words(count: usize) -> Vec<VocabularyEntry> {
        (0..count)
            .map(|i| VocabularyEntry::new(format!("word{i}"), format!("mean{i}")))
            .collect()
    }

    fn input<'a>(vocab: &'a [VocabularyEntry], label: &'a str, base: i64) -> StageDefinitionInput<'a> {
        StageDefinitionInput {
            dataset_key: "reiwa5",
            label,
            vocab,
            base_question_count: base,
        }
    }

    fn cache_document(store: &MemoryStore) -> Map<String, Value> {
        load_document::<Map<String, Value>, _>(store, STAGE_DEFINITION_CACHE_KEY)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_miss_then_hit_matches_uncached() {
        let store = Arc::new(MemoryStore::new());
        let cache = StageDefinitionCache::new(Arc::clone(&store)).with_clock(fixed_clock);
        let vocab = words(45);

        let first = cache.create_stage_definitions(&input(&vocab, "Reiwa 5", 20));
        let doc = cache_document(&store);
        assert!(doc.contains_key("reiwa5-q20"));
        assert_eq!(doc["reiwa5-q20"]["savedAt"], 1_700_000_000_000i64);
        assert_eq!(doc["reiwa5-q20"]["totalWords"], 45);

        let second = cache.create_stage_definitions(&input(&vocab, "Reiwa 5", 20));
        let uncached = create_stage_definitions(&input(&vocab, "Reiwa 5", 20));
        assert_eq!(first, uncached);
        assert_eq!(second, uncached);
    }

    #[test]
    fn test_label_change_regenerates_titles() {
        let store = Arc::new(MemoryStore::new());
        let cache = StageDefinitionCache::new(Arc::clone(&store));
        let vocab = words(5);

        cache.create_stage_definitions(&input(&vocab, "Old", 2));
        let result = cache.create_stage_definitions(&input(&vocab, "New", 2));

        assert!(result.stages.iter().all(|s| s.title.starts_with("New Stage")));
    }

    #[test]
    fn test_word_count_change_invalidates() {
        let store = Arc::new(MemoryStore::new());
        let cache = StageDefinitionCache::new(Arc::clone(&store));

        let small = words(4);
        cache.create_stage_definitions(&input(&small, "L", 2));

        let large = words(7);
        let result = cache.create_stage_definitions(&input(&large, "L", 2));
        assert_eq!(result.total_words, 7);
        assert_eq!(result.stages.len(), 4);
        assert_eq!(cache_document(&store)["reiwa5-q2"]["totalWords"], 7);
    }

    #[test]
    fn test_sizes_are_cached_separately() {
        let store = Arc::new(MemoryStore::new());
        let cache = StageDefinitionCache::new(Arc::clone(&store));
        let vocab = words(10);

        cache.create_stage_definitions(&input(&vocab, "L", 2));
        cache.create_stage_definitions(&input(&vocab, "L", 0));

        let doc = cache_document(&store);
        assert!(doc.contains_key("reiwa5-q2"));
        assert!(doc.contains_key("reiwa5-q1"));
    }

    #[test]
    fn test_corrupt_document_recomputes() {
        let store = Arc::new(MemoryStore::new());
        store.set_item(STAGE_DEFINITION_CACHE_KEY, "{oops").unwrap();
        let cache = StageDefinitionCache::new(Arc::clone(&store));
        let vocab = words(5);

        let result = cache.create_stage_definitions(&input(&vocab, "L", 2));
        assert_eq!(result, create_stage_definitions(&input(&vocab, "L", 2)));
        assert!(cache_document(&store).contains_key("reiwa5-q2"));
    }

    #[test]
    fn test_tampered_entry_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let cache = StageDefinitionCache::new(Arc::clone(&store));
        let vocab = words(5);
        cache.create_stage_definitions(&input(&vocab, "L", 2));

        let mut doc = cache_document(&store);
        doc["reiwa5-q2"]["stages"][1]["startIndex"] = Value::from(3);
        save_document(&*store, STAGE_DEFINITION_CACHE_KEY, &doc).unwrap();

        let result = cache.create_stage_definitions(&input(&vocab, "L", 2));
        assert_eq!(result.stages[1].start_index, 2);
    }

    #[test]
    fn test_unavailable_storage_still_computes() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let cache = StageDefinitionCache::new(Arc::clone(&store));
        let vocab = words(5);

        let result = cache.create_stage_definitions(&input(&vocab, "L", 2));
        assert_eq!(result, create_stage_definitions(&input(&vocab, "L", 2)));
    }

    #[test]
    fn test_clear_removes_document() {
        let store = Arc::new(MemoryStore::new());
        let cache = StageDefinitionCache::new(Arc::clone(&store));
        let vocab = words(5);
        cache.create_stage_definitions(&input(&vocab, "L", 2));

        cache.clear();
        assert_eq!(store.get_item(STAGE_DEFINITION_CACHE_KEY).unwrap(), None);
    }
}
