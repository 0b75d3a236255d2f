//! Cumulative experience and session history.
//!
//! XP lives under `test-results:xp` as `{ "totalXp": n }`; each test id
//! keeps its own session log under `test-results:session:<testId>`.
//! Persistence problems are warned and never propagated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::QuizResult;
use crate::leveling::{calculate_level_progress, get_experience_points, ExperienceGain, LevelSystemConfig};
use crate::storage::{load_document, save_document, KeyValueStore, RESULTS_SESSION_PREFIX, TOTAL_XP_KEY};
use crate::types::LevelProgress;

/// One finished quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub started_at: i64,
    pub finished_at: i64,
    pub duration_ms: i64,
    pub section_id: String,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub gained_xp: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDocument {
    #[serde(default)]
    session_history: Vec<SessionRecord>,
}

pub fn session_key(test_id: &str) -> String {
    format!("{}:{}", RESULTS_SESSION_PREFIX, test_id)
}

pub struct ResultsStore<S> {
    store: S,
}

impl<S: KeyValueStore> ResultsStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load_total_xp(&self) -> u64 {
        match load_document::<Value, _>(&self.store, TOTAL_XP_KEY) {
            Ok(Some(doc)) => doc
                .get("totalXp")
                .and_then(Value::as_f64)
                .map(|xp| xp.max(0.0) as u64)
                .unwrap_or(0),
            Ok(None) => 0,
            Err(err) => {
                warn!(error = %err, "failed to load total XP");
                0
            }
        }
    }

    fn save_total_xp(&self, total_xp: u64) {
        let doc = serde_json::json!({ "totalXp": total_xp });
        if let Err(err) = save_document(&self.store, TOTAL_XP_KEY, &doc) {
            warn!(error = %err, "failed to persist total XP");
        }
    }

    /// Add (or remove) XP; the total never drops below zero.
    pub fn apply_xp(&self, delta: i64) -> u64 {
        let current = self.load_total_xp();
        let next = if delta >= 0 {
            current.saturating_add(delta as u64)
        } else {
            current.saturating_sub(delta.unsigned_abs())
        };
        self.save_total_xp(next);
        next
    }

    /// Credit one session's answers and persist the new total.
    pub fn apply_session(&self, correct_count: usize, incorrect_count: usize) -> ExperienceGain {
        let gain = get_experience_points(correct_count, incorrect_count, self.load_total_xp());
        self.save_total_xp(gain.next_total_xp);
        gain
    }

    pub fn level_progress(&self, config: &LevelSystemConfig) -> QuizResult<LevelProgress> {
        let total = i64::try_from(self.load_total_xp()).unwrap_or(i64::MAX);
        calculate_level_progress(total, config)
    }

    pub fn session_history(&self, test_id: &str) -> Vec<SessionRecord> {
        match load_document::<SessionDocument, _>(&self.store, &session_key(test_id)) {
            Ok(doc) => doc.unwrap_or_default().session_history,
            Err(err) => {
                warn!(error = %err, test_id, "failed to load session history");
                Vec::new()
            }
        }
    }

    pub fn add_session(&self, test_id: &str, record: SessionRecord) -> Vec<SessionRecord> {
        let mut history = self.session_history(test_id);
        history.push(record);

        let doc = SessionDocument {
            session_history: history,
        };
        if let Err(err) = save_document(&self.store, &session_key(test_id), &doc) {
            warn!(error = %err, test_id, "failed to persist session history");
        }
        doc.session_history
    }
}
