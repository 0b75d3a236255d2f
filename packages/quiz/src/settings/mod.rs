//! Per-data-set quiz settings.
//!
//! Defaults come from the registry (`default_question_count`); stored
//! values overlay them key by key. The stored count is kept as entered and
//! only normalized when stages are computed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::QuizResult;
use crate::registry::Registry;
use crate::storage::{load_document, save_document, KeyValueStore, USER_CONFIG_KEY};
use crate::types::DEFAULT_QUESTION_COUNT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetConfig {
    /// Questions per stage
    pub max_count: i64,
    pub section_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserConfig {
    pub data_sets: BTreeMap<String, DataSetConfig>,
}

impl UserConfig {
    pub fn from_registry(registry: &Registry) -> Self {
        let data_sets = registry
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.key.clone(),
                    DataSetConfig {
                        max_count: entry.default_question_count,
                        section_id: entry.section_label.clone(),
                    },
                )
            })
            .collect();
        Self { data_sets }
    }

    /// Configured questions per stage for `key`.
    pub fn question_count(&self, key: &str) -> i64 {
        self.data_sets
            .get(key)
            .map(|config| config.max_count)
            .unwrap_or(DEFAULT_QUESTION_COUNT)
    }
}

pub struct UserConfigStore<S> {
    store: S,
}

impl<S: KeyValueStore> UserConfigStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registry defaults overlaid with whatever stored entries still parse.
    pub fn load(&self, registry: &Registry) -> UserConfig {
        let mut config = UserConfig::from_registry(registry);

        let stored = match load_document::<Map<String, Value>, _>(&self.store, USER_CONFIG_KEY) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to load user config");
                return config;
            }
        };

        for (key, value) in stored {
            if let Ok(data_set) = serde_json::from_value::<DataSetConfig>(value) {
                config.data_sets.insert(key, data_set);
            }
        }
        config
    }

    pub fn save(&self, config: &UserConfig) {
        if let Err(err) = save_document(&self.store, USER_CONFIG_KEY, config) {
            warn!(error = %err, "failed to persist user config");
        }
    }

    /// Change the per-stage question count for a registered data-set.
    pub fn set_max_count(&self, registry: &Registry, key: &str, max_count: i64) -> QuizResult<UserConfig> {
        let entry = registry.get(key)?;
        let mut config = self.load(registry);

        config
            .data_sets
            .entry(key.to_string())
            .and_modify(|data_set| data_set.max_count = max_count)
            .or_insert_with(|| DataSetConfig {
                max_count,
                section_id: entry.section_label.clone(),
            });

        self.save(&config);
        Ok(config)
    }
}
