//! Stage Progress Store
//!
//! Persists per-stage mastery under one storage key and derives which
//! stages are playable.
//!
//! Per-stage lifecycle: `Untouched -> Attempted -> Cleared`. Once cleared a
//! stage never reverts; `best_accuracy` only grows and `attempts` only
//! increases. Records are merged, never overwritten wholesale.
//!
//! Loading never fails: unreadable storage, malformed JSON or an unexpected
//! shape yields an empty state and a single warning. Failed writes are
//! warned and the returned in-memory state stays authoritative.

mod migration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::storage::{
    load_document, now_millis, save_document, Clock, KeyValueStore, StorageError, STAGE_PROGRESS_KEY,
};
use crate::types::{
    StageDefinition, StageProgressEntry, StageProgressState, StageUnlockState, STAGE_CLEAR_THRESHOLD,
};

use migration::upgrade_entry;

// ==================== Types ====================

/// Why a stored progress document could not be used.
#[derive(Error, Debug)]
pub enum ProgressDocumentError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("progress document root is not an object")]
    NonObjectRoot,

    #[error("progress entry {0:?} is not an object")]
    NonObjectEntry(String),
}

/// Outcome of one finished stage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResultPayload {
    pub stage_id: String,
    pub correct_count: u32,
    pub total_count: u32,
}

/// Aggregate view over a list of stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_stages: usize,
    pub cleared_stages: usize,
    pub attempted_stages: usize,
    pub average_best_accuracy: f64,
}

// ==================== Store ====================

pub struct ProgressStore<S> {
    store: S,
    clock: Clock,
}

impl<S: KeyValueStore> ProgressStore<S> {
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

    /// Read and upgrade the progress document, reporting what went wrong.
    pub fn try_load(&self) -> Result<StageProgressState, ProgressDocumentError> {
        let root = match load_document::<Value, _>(&self.store, STAGE_PROGRESS_KEY)? {
            Some(root) => root,
            None => return Ok(StageProgressState::new()),
        };
        let Value::Object(entries) = root else {
            return Err(ProgressDocumentError::NonObjectRoot);
        };

        let mut state = StageProgressState::new();
        for (stage_id, raw) in &entries {
            let Value::Object(fields) = raw else {
                return Err(ProgressDocumentError::NonObjectEntry(stage_id.clone()));
            };
            state.insert(stage_id.clone(), upgrade_entry(stage_id, fields));
        }

        Ok(state)
    }

    /// Progress for every stage ever touched; empty on any failure.
    pub fn load(&self) -> StageProgressState {
        match self.try_load() {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "failed to load stage progress");
                StageProgressState::new()
            }
        }
    }

    /// Write the whole state. Failures are logged, not returned.
    pub fn save(&self, state: &StageProgressState) {
        if let Err(err) = save_document(&self.store, STAGE_PROGRESS_KEY, state) {
            warn!(error = %err, "failed to persist stage progress");
        }
    }

    /// Mark a stage as opened. Accuracy, attempts and cleared are left
    /// alone; calling it again only refreshes `last_played_at`.
    pub fn record_stage_attempt(&self, stage_id: &str) -> StageProgressState {
        let mut state = self.load();
        let now = (self.clock)();

        let entry = state
            .entry(stage_id.to_string())
            .or_insert_with(|| StageProgressEntry::untouched(stage_id));
        entry.has_attempted = true;
        entry.last_played_at = now;

        self.save(&state);
        state
    }

    /// Merge a finished run into the stage's record and persist.
    pub fn record_stage_result(&self, payload: &StageResultPayload) -> StageProgressState {
        let mut state = self.load();
        let accuracy = compute_accuracy(payload.correct_count, payload.total_count);
        let now = (self.clock)();

        let entry = state
            .entry(payload.stage_id.clone())
            .or_insert_with(|| StageProgressEntry::untouched(payload.stage_id.as_str()));
        entry.best_accuracy = entry.best_accuracy.max(accuracy);
        entry.cleared = entry.cleared || accuracy >= STAGE_CLEAR_THRESHOLD;
        entry.attempts = entry.attempts.saturating_add(1);
        entry.last_played_at = now;
        entry.last_accuracy = accuracy;
        entry.has_attempted = true;

        self.save(&state);
        state
    }
}

/// `correct / total` capped at 1; zero when nothing was answered.
pub fn compute_accuracy(correct_count: u32, total_count: u32) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    (f64::from(correct_count) / f64::from(total_count)).min(1.0)
}

fn is_cleared(progress: &StageProgressState, stage_id: &str) -> bool {
    progress.get(stage_id).is_some_and(|entry| entry.cleared)
}

// ==================== Derived views ====================

/// The first stage is always open; any other stage opens once the stage
/// before it is cleared, and a cleared stage stays open regardless.
pub fn build_stage_unlock_map(stages: &[StageDefinition], progress: &StageProgressState) -> StageUnlockState {
    stages
        .iter()
        .enumerate()
        .map(|(index, stage)| {
            let unlocked = index == 0
                || is_cleared(progress, &stages[index - 1].stage_id)
                || is_cleared(progress, &stage.stage_id);
            (stage.stage_id.clone(), unlocked)
        })
        .collect()
}

pub fn summarize(stages: &[StageDefinition], progress: &StageProgressState) -> ProgressSummary {
    let entries: Vec<&StageProgressEntry> = stages
        .iter()
        .filter_map(|stage| progress.get(&stage.stage_id))
        .collect();

    let average_best_accuracy = if stages.is_empty() {
        0.0
    } else {
        entries.iter().map(|entry| entry.best_accuracy).sum::<f64>() / stages.len() as f64
    };

    ProgressSummary {
        total_stages: stages.len(),
        cleared_stages: entries.iter().filter(|entry| entry.cleared).count(),
        attempted_stages: entries.iter().filter(|entry| entry.has_attempted).count(),
        average_best_accuracy,
    }
}
