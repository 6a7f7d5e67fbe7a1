//! Daily settings lock.
//!
//! Starting a session or changing settings freezes goal, mode and duration
//! edits for the rest of that calendar day. The lock is a pair of date keys on
//! the run store and expires on its own once the day is over.

use serde::Serialize;

use super::store::RunStore;
use crate::date_key::DateKey;

/// Derived lock view for the settings surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsLockStatus {
    pub locked: bool,
    pub locked_for: Option<DateKey>,
    /// First day edits are allowed again, while locked.
    pub unlocks_on: Option<DateKey>,
}

impl RunStore {
    /// Freeze settings for `today`.
    pub fn lock_for_today(&mut self, today: DateKey) {
        self.settings_locked_for_date = Some(today);
        self.last_settings_change_date = Some(today);
    }

    /// Freeze settings because a session started, unless already frozen.
    ///
    /// Returns true if the lock was newly applied.
    pub fn lock_on_session_start(&mut self, today: DateKey) -> bool {
        if self.is_locked(today) {
            return false;
        }
        self.lock_for_today(today);
        true
    }

    pub fn is_locked(&self, today: DateKey) -> bool {
        self.settings_locked_for_date == Some(today)
            || self.last_settings_change_date == Some(today)
    }

    /// Clear lock fields left over from an earlier day.
    pub fn expire_stale_lock(&mut self, today: DateKey) {
        if self.settings_locked_for_date.is_some_and(|d| d != today) {
            self.settings_locked_for_date = None;
        }
        if self.last_settings_change_date.is_some_and(|d| d != today) {
            self.last_settings_change_date = None;
        }
    }

    pub fn lock_status(&self, today: DateKey) -> SettingsLockStatus {
        let locked = self.is_locked(today);
        SettingsLockStatus {
            locked,
            locked_for: locked.then_some(today),
            unlocks_on: locked.then(|| today.next()),
        }
    }
}
