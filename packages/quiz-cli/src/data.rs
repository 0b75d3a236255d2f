//! Built-in data-sets: every `<key>.json` file in the data directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use danci_quiz::{RegistryEntry, VocabularyEntry};
use serde::Deserialize;
use tracing::{debug, warn};

/// A data file is either a bare word list or an object carrying a label.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataFile {
    Labeled {
        label: String,
        #[serde(default, rename = "defaultQuestionCount")]
        default_question_count: Option<i64>,
        vocab: Vec<VocabularyEntry>,
    },
    Words(Vec<VocabularyEntry>),
}

fn parse_data_file(key: &str, raw: &str) -> serde_json::Result<RegistryEntry> {
    let entry = match serde_json::from_str::<DataFile>(raw)? {
        DataFile::Words(vocab) => RegistryEntry::new(key, key, vocab),
        DataFile::Labeled {
            label,
            default_question_count,
            vocab,
        } => {
            let mut entry = RegistryEntry::new(key, label, vocab);
            if let Some(count) = default_question_count {
                entry.default_question_count = count;
            }
            entry
        }
    };
    Ok(entry)
}

/// Sorted by key. A missing directory yields no data-sets; a file that
/// does not parse is skipped with a warning.
pub fn load_data_sets(dir: &Path) -> Result<Vec<RegistryEntry>> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "data directory not found");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if path.is_file() && is_json {
            paths.push(path);
        }
    }
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        match parse_data_file(key, &raw) {
            Ok(entry) => {
                debug!(key, words = entry.vocab.len(), "loaded data-set");
                entries.push(entry);
            }
            Err(err) => warn!(error = %err, path = %path.display(), "skipping unreadable data-set"),
        }
    }
    Ok(entries)
}
