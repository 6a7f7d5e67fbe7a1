//! User goals: daily reset count, preferred modes and session length.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::protocols::{upgrade_preferred_modes, Mode, SessionLength, MODES};
use crate::run::DailyGoal;

/// Who is asking for preferences.
///
/// Guests never see preferences left behind by a signed-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Guest,
    SignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSet {
    pub daily_resets: DailyGoal,
    /// Non-empty, no duplicates; order drives default display.
    pub preferred_modes: Vec<Mode>,
    pub preferred_duration: SessionLength,
    /// Opaque to the engine.
    #[serde(default)]
    pub reminder_time: Option<String>,
}

impl Default for PreferenceSet {
    fn default() -> Self {
        Self {
            daily_resets: DailyGoal::default(),
            preferred_modes: MODES.to_vec(),
            preferred_duration: SessionLength::Five,
            reminder_time: None,
        }
    }
}

impl PreferenceSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.preferred_modes.is_empty() {
            return Err(ValidationError::EmptyCollection("preferredModes".into()));
        }
        for (i, mode) in self.preferred_modes.iter().enumerate() {
            if self.preferred_modes[..i].contains(mode) {
                return Err(ValidationError::DuplicateMode(mode.to_string()));
            }
        }
        Ok(())
    }

    /// Build a preference set from untrusted JSON.
    ///
    /// Without a valid `preferredDuration` the whole document is rejected and
    /// `fallback` is returned. Other fields fall back one at a time.
    pub fn normalize(value: &Value, fallback: Option<&PreferenceSet>) -> Option<PreferenceSet> {
        let Some(obj) = value.as_object() else {
            return fallback.cloned();
        };

        let Some(preferred_duration) = obj
            .get("preferredDuration")
            .and_then(Value::as_i64)
            .and_then(|m| SessionLength::try_from(m).ok())
        else {
            return fallback.cloned();
        };

        let daily_resets = obj
            .get("dailyResets")
            .and_then(Value::as_i64)
            .and_then(|g| DailyGoal::new(g).ok())
            .or_else(|| fallback.map(|f| f.daily_resets))
            .unwrap_or_default();

        let modes: Vec<Mode> = obj
            .get("preferredModes")
            .and_then(Value::as_array)
            .map(|raw| {
                raw.iter()
                    .filter_map(Value::as_str)
                    .filter_map(|s| s.parse::<Mode>().ok())
                    .collect()
            })
            .unwrap_or_default();
        let preferred_modes = if modes.is_empty() {
            fallback
                .map(|f| f.preferred_modes.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| MODES.to_vec())
        } else {
            upgrade_preferred_modes(&modes)
        };

        let reminder_time = obj
            .get("reminderTime")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(PreferenceSet {
            daily_resets,
            preferred_modes,
            preferred_duration,
            reminder_time,
        })
    }

    /// Parse a persisted preference blob; `None` when unusable.
    pub fn from_json(raw: &str) -> Option<PreferenceSet> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::normalize(&value, None),
            Err(e) => {
                tracing::warn!("preference blob is not valid JSON: {e}");
                None
            }
        }
    }
}
