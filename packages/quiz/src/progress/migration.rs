//! Upgrade pass for persisted progress entries.
//!
//! Every entry read from storage goes through [`upgrade_entry`] exactly
//! once; consumers only ever see the current schema.

use serde_json::{Map, Value};

use crate::types::StageProgressEntry;

/// Entry shape as found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PersistedShape {
    Current,
    /// Written before `hasAttempted` existed; being stored at all means
    /// the stage was opened.
    LegacyWithoutAttemptFlag,
}

pub(crate) fn classify(fields: &Map<String, Value>) -> PersistedShape {
    if fields.contains_key("hasAttempted") {
        PersistedShape::Current
    } else {
        PersistedShape::LegacyWithoutAttemptFlag
    }
}

fn accuracy_field(fields: &Map<String, Value>, name: &str) -> f64 {
    fields
        .get(name)
        .and_then(Value::as_f64)
        .map(|value| value.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

fn attempts_field(fields: &Map<String, Value>) -> u32 {
    match fields.get("attempts").and_then(Value::as_f64) {
        Some(value) if value > 0.0 => value.min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

fn timestamp_field(fields: &Map<String, Value>) -> i64 {
    let value = fields.get("lastPlayedAt");
    value
        .and_then(Value::as_i64)
        .or_else(|| value.and_then(Value::as_f64).map(|ms| ms as i64))
        .unwrap_or(0)
}

/// Default missing or mistyped fields and bring the entry to the current
/// schema. The stage id always comes from the document key.
pub(crate) fn upgrade_entry(stage_id: &str, fields: &Map<String, Value>) -> StageProgressEntry {
    let has_attempted = match classify(fields) {
        PersistedShape::Current => fields
            .get("hasAttempted")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        PersistedShape::LegacyWithoutAttemptFlag => true,
    };

    StageProgressEntry {
        stage_id: stage_id.to_string(),
        best_accuracy: accuracy_field(fields, "bestAccuracy"),
        cleared: fields.get("cleared").and_then(Value::as_bool).unwrap_or(false),
        attempts: attempts_field(fields),
        last_played_at: timestamp_field(fields),
        last_accuracy: accuracy_field(fields, "lastAccuracy"),
        has_attempted,
    }
}
