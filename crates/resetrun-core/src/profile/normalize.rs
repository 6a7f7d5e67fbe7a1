//! Field-by-field validation of untrusted profile documents.
//!
//! A remote store can return a document that parses but makes no sense (a
//! negative duration, an unknown mode). Each field is checked on its own and
//! replaced by the matching field of a trusted baseline when it fails, so one
//! bad field never discards the rest. An explicit `null` clears the lock
//! fields; `null` preferences keep the baseline's.

use serde_json::Value;

use super::types::{Profile, ProfileLocks};
use crate::date_key::DateKey;
use crate::preferences::PreferenceSet;
use crate::run::RunStore;

/// Validate `input` against `fallback`. Run state is checked as of `today`.
pub fn normalize_profile(input: &Value, fallback: &Profile, today: DateKey) -> Profile {
    let onboarding_complete = input
        .get("onboardingComplete")
        .and_then(Value::as_bool)
        .unwrap_or(fallback.onboarding_complete);

    let preferences = match input.get("preferences") {
        Some(raw) => PreferenceSet::normalize(raw, fallback.preferences.as_ref()),
        None => fallback.preferences.clone(),
    };

    Profile {
        onboarding_complete,
        preferences,
        run_state: normalize_run_state(input.get("runState"), fallback.run_state.as_ref(), today),
        locks: normalize_locks(input.get("locks"), &fallback.locks),
    }
}

fn normalize_run_state(
    input: Option<&Value>,
    fallback: Option<&RunStore>,
    today: DateKey,
) -> Option<RunStore> {
    input
        .and_then(|raw| RunStore::from_current_value(raw, today))
        .or_else(|| fallback.cloned())
}

fn normalize_locks(input: Option<&Value>, fallback: &ProfileLocks) -> ProfileLocks {
    let Some(obj) = input.and_then(Value::as_object) else {
        return fallback.clone();
    };
    ProfileLocks {
        daily_lock_date: match obj.get("dailyLockDate") {
            Some(Value::Null) => None,
            Some(Value::String(raw)) => DateKey::parse(raw).ok().or(fallback.daily_lock_date),
            _ => fallback.daily_lock_date,
        },
        run_lock_until: match obj.get("runLockUntil") {
            Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            _ => fallback.run_lock_until.clone(),
        },
    }
}
