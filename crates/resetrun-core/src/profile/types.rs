use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_key::DateKey;
use crate::preferences::PreferenceSet;
use crate::run::RunStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLocks {
    #[serde(default)]
    pub daily_lock_date: Option<DateKey>,
    /// Opaque to the engine; carried through sync untouched.
    #[serde(default)]
    pub run_lock_until: Option<String>,
}

/// Everything synchronized for one signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub onboarding_complete: bool,
    pub preferences: Option<PreferenceSet>,
    pub run_state: Option<RunStore>,
    #[serde(default)]
    pub locks: ProfileLocks,
}

impl Profile {
    /// Profile describing the device's local state.
    pub fn from_local(run_state: Option<RunStore>, preferences: Option<PreferenceSet>) -> Self {
        let daily_lock_date = run_state
            .as_ref()
            .and_then(|r| r.settings_locked_for_date);
        Self {
            onboarding_complete: preferences.is_some(),
            preferences,
            run_state,
            locks: ProfileLocks {
                daily_lock_date,
                run_lock_until: None,
            },
        }
    }
}

/// Locally cached copy of the last reconciled profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedProfile {
    pub uid: String,
    pub profile: Profile,
    pub cached_at: DateTime<Utc>,
}

/// Partial update merged over the current profile.
///
/// `preferences: Some(None)` clears preferences; `None` leaves them alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub onboarding_complete: Option<bool>,
    pub preferences: Option<Option<PreferenceSet>>,
    pub run_state: Option<RunStore>,
    pub locks: Option<ProfileLocks>,
}

impl ProfilePatch {
    pub fn merged_over(self, base: &Profile) -> Profile {
        Profile {
            onboarding_complete: self.onboarding_complete.unwrap_or(base.onboarding_complete),
            preferences: self.preferences.unwrap_or_else(|| base.preferences.clone()),
            run_state: self.run_state.or_else(|| base.run_state.clone()),
            locks: self.locks.unwrap_or_else(|| base.locks.clone()),
        }
    }
}
