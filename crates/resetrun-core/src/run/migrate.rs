//! Loading run stores from any shape the app has ever written.
//!
//! Three shapes are recognized by sniffing fields:
//!
//! - **Current**: `runStartDate` + `completionsByDate`, with lock and
//!   idempotency fields.
//! - **Flat**: the same layout written before the lock and idempotency
//!   fields existed.
//! - **Original**: `currentRun.startDate` + `currentRun.completedDays`, where
//!   completed days are cycle indices 1..=7 instead of date keys.
//!
//! Anything else yields a fresh store. Loading never fails.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use super::store::{DailyGoal, RunStore};
use crate::date_key::DateKey;

/// Which persisted layout a store was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreShape {
    Current,
    Flat,
    Original,
    /// Unrecognized or corrupt input replaced by a fresh store.
    Fresh,
}

const LOCK_FIELDS: [&str; 3] = [
    "lastCompletionDate",
    "settingsLockedForDate",
    "lastSettingsChangeDate",
];

impl RunStore {
    /// Parse persisted JSON, falling back to a fresh store on any problem.
    pub fn from_json(raw: &str, today: DateKey) -> (Self, StoreShape) {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value, today),
            Err(e) => {
                tracing::warn!("run store is not valid JSON, starting fresh: {e}");
                (Self::fresh(today), StoreShape::Fresh)
            }
        }
    }

    /// Migrate any known shape into a store, validating each field on its own.
    pub fn from_value(value: &Value, today: DateKey) -> (Self, StoreShape) {
        if let Some(obj) = value.as_object() {
            if let Some(store) = from_current(obj, today) {
                let shape = if LOCK_FIELDS.iter().any(|f| obj.contains_key(*f)) {
                    StoreShape::Current
                } else {
                    StoreShape::Flat
                };
                return (store, shape);
            }
            if let Some(store) = from_original(obj, today) {
                tracing::info!(
                    run_start_date = %store.run_start_date,
                    migrated_days = store.completed_dates.len(),
                    "migrated run store from original shape"
                );
                return (store, StoreShape::Original);
            }
        }
        tracing::warn!("unrecognized run store shape, starting fresh");
        (Self::fresh(today), StoreShape::Fresh)
    }

    /// Current or flat shape only, as synchronized between devices.
    pub(crate) fn from_current_value(value: &Value, today: DateKey) -> Option<Self> {
        value.as_object().and_then(|obj| from_current(obj, today))
    }
}

fn parse_key(value: Option<&Value>) -> Option<DateKey> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateKey::parse(s).ok())
}

fn from_current(obj: &Map<String, Value>, today: DateKey) -> Option<RunStore> {
    let run_start_date = parse_key(obj.get("runStartDate"))?;
    let counts = obj.get("completionsByDate")?.as_object()?;

    let mut store = RunStore::fresh(run_start_date);

    if let Some(goal) = obj
        .get("dailyGoal")
        .and_then(Value::as_i64)
        .and_then(|g| DailyGoal::new(g).ok())
    {
        store.daily_goal = goal;
    }

    for (raw_key, raw_count) in counts {
        let Ok(key) = DateKey::parse(raw_key) else {
            continue;
        };
        if let Some(count) = raw_count.as_u64().and_then(|c| u32::try_from(c).ok()) {
            store.completions_by_date.insert(key, count);
        }
    }

    let credited = obj
        .get("completedDates")
        .or_else(|| obj.get("completedDateKeys"))
        .and_then(Value::as_array);
    for raw in credited.into_iter().flatten() {
        let Some(key) = parse_key(Some(raw)) else {
            continue;
        };
        // Keys outside the cycle would break the seven-day bound.
        if store.cycle_expired(key) || store.completed_dates.contains(&key) {
            continue;
        }
        // A credit needs recorded completions and cannot precede its day.
        if key > today || store.completions_on(key) == 0 {
            tracing::debug!(key = %key, "dropping unbacked credited day");
            continue;
        }
        store.completed_dates.push(key);
    }

    store.last_completion_date = parse_key(obj.get("lastCompletionDate"));
    store.settings_locked_for_date = parse_key(obj.get("settingsLockedForDate"));
    store.last_settings_change_date = parse_key(obj.get("lastSettingsChangeDate"));
    store.total_resets = obj.get("totalResets").and_then(Value::as_u64).unwrap_or(0);

    Some(store)
}

/// Start date of the original shape: a date key, an RFC 3339 instant or
/// epoch milliseconds, read in the local time zone.
fn original_start(value: &Value) -> Option<DateKey> {
    if let Some(raw) = value.as_str() {
        if let Ok(key) = DateKey::parse(raw) {
            return Some(key);
        }
        return DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| DateKey::new(dt.with_timezone(&Local).date_naive()));
    }
    value
        .as_i64()
        .and_then(DateTime::from_timestamp_millis)
        .map(DateKey::from_instant)
}

fn day_index(value: &Value) -> Option<i64> {
    let index = match value.as_i64() {
        Some(i) => i,
        None => {
            let f = value.as_f64()?;
            if !f.is_finite() || f.fract() != 0.0 {
                return None;
            }
            f as i64
        }
    };
    (1..=7).contains(&index).then_some(index)
}

fn from_original(obj: &Map<String, Value>, today: DateKey) -> Option<RunStore> {
    let run = obj.get("currentRun")?.as_object()?;
    let start = original_start(run.get("startDate")?)?;

    let mut store = RunStore::fresh(start);
    let goal = store.daily_goal.get();

    let mut indices: Vec<i64> = run
        .get("completedDays")
        .and_then(Value::as_array)
        .map(|days| days.iter().filter_map(day_index).collect())
        .unwrap_or_default();
    indices.sort_unstable();
    indices.dedup();

    for index in indices {
        let Some(key) = start.plus_days(index - 1).filter(|k| *k <= today) else {
            continue;
        };
        store.completed_dates.push(key);
        store.completions_by_date.insert(key, goal);
    }

    store.total_resets = obj
        .get("stats")
        .and_then(|s| s.get("totalResets"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Some(store)
}
