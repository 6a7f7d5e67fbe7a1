//! Persisting front end over the run store.
//!
//! Every call loads the store for the clock's today, applies one operation
//! and writes the result back.

use serde::Serialize;
use std::sync::Arc;

use super::lock::SettingsLockStatus;
use super::recorder::CompletionOutcome;
use super::store::{CycleDay, DailyGoal, RunStore};
use crate::date_key::{Clock, DateKey};
use crate::error::{StorageError, ValidationError};
use crate::preferences::{Audience, PreferenceSet};
use crate::storage::LocalState;

/// Snapshot for the run surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub today: DateKey,
    pub day_number: i64,
    pub store: RunStore,
    pub lock: SettingsLockStatus,
    pub cycle: Vec<CycleDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub store: RunStore,
    pub outcome: CompletionOutcome,
}

/// Result of a guarded settings edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    Applied,
    /// Settings were already changed or a session started today.
    Locked { unlocks_on: DateKey },
    Invalid(ValidationError),
    Unchanged,
}

pub struct RunTracker {
    local: LocalState,
    clock: Arc<dyn Clock>,
    audience: Audience,
}

impl RunTracker {
    pub fn new(local: LocalState, clock: Arc<dyn Clock>, audience: Audience) -> Self {
        Self {
            local,
            clock,
            audience,
        }
    }

    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    pub fn local(&self) -> &LocalState {
        &self.local
    }

    pub fn load(&self) -> RunStore {
        self.local.load_run_store(self.today())
    }

    fn save(&self, store: &RunStore) -> Result<(), StorageError> {
        self.local.save_run_store(store).inspect_err(|e| {
            tracing::warn!("failed to save run store: {e}");
        })
    }

    pub fn status(&self) -> RunStatus {
        let today = self.today();
        let store = self.load();
        RunStatus {
            today,
            day_number: store.day_number(today),
            lock: store.lock_status(today),
            cycle: store.cycle_days(),
            store,
        }
    }

    /// Record a finished (or abandoned) session and persist the store.
    pub fn record_completion(&self, completed: bool) -> Result<Completion, StorageError> {
        let today = self.today();
        let mut store = self.load();
        let outcome = store.record_completion(completed, today);
        self.save(&store)?;

        if outcome.completed_day_now {
            tracing::info!(
                day = outcome.day_index + 1,
                credited = outcome.completed_count,
                "day credited"
            );
        } else {
            tracing::debug!(
                today = %today,
                count = store.completions_on(today),
                "completion recorded"
            );
        }
        Ok(Completion { store, outcome })
    }

    /// Freeze settings for the rest of today. Returns true if newly locked.
    pub fn lock_today(&self) -> Result<bool, StorageError> {
        let today = self.today();
        let mut store = self.load();
        if !store.lock_on_session_start(today) {
            return Ok(false);
        }
        self.save(&store)?;
        tracing::debug!(today = %today, "settings locked");
        Ok(true)
    }

    /// A session started: settings freeze for the day.
    pub fn begin_session(&self) -> Result<bool, StorageError> {
        self.lock_today()
    }

    /// Current preferences, or the defaults when none are visible.
    pub fn settings(&self) -> PreferenceSet {
        self.local
            .load_preferences(self.audience)
            .unwrap_or_default()
    }

    pub fn lock_status(&self) -> SettingsLockStatus {
        self.load().lock_status(self.today())
    }

    /// Replace the preference set unless today is locked.
    ///
    /// `Locked` and `Invalid` write nothing. `Applied` saves the preferences,
    /// mirrors the daily goal into the run store and locks the day.
    pub fn apply_settings(&self, prefs: PreferenceSet) -> Result<SettingsChange, StorageError> {
        let today = self.today();
        let mut store = self.load();

        if store.is_locked(today) {
            return Ok(SettingsChange::Locked {
                unlocks_on: today.next(),
            });
        }
        if let Err(e) = prefs.validate() {
            return Ok(SettingsChange::Invalid(e));
        }
        if self.settings() == prefs && store.daily_goal == prefs.daily_resets {
            return Ok(SettingsChange::Unchanged);
        }

        self.local.save_preferences(&prefs).inspect_err(|e| {
            tracing::warn!("failed to save preferences: {e}");
        })?;
        store.daily_goal = prefs.daily_resets;
        store.lock_for_today(today);
        self.save(&store)?;

        tracing::info!(goal = %prefs.daily_resets, "settings applied, locked until tomorrow");
        Ok(SettingsChange::Applied)
    }

    /// Change only the daily goal, under the same lock as [`Self::apply_settings`].
    pub fn set_daily_goal(&self, goal: i64) -> Result<SettingsChange, StorageError> {
        let goal = match DailyGoal::new(goal) {
            Ok(goal) => goal,
            Err(e) => {
                // The lock takes precedence over validation.
                let today = self.today();
                if self.load().is_locked(today) {
                    return Ok(SettingsChange::Locked {
                        unlocks_on: today.next(),
                    });
                }
                return Ok(SettingsChange::Invalid(e));
            }
        };
        let prefs = PreferenceSet {
            daily_resets: goal,
            ..self.settings()
        };
        self.apply_settings(prefs)
    }
}

impl std::fmt::Debug for RunTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunTracker")
            .field("today", &self.today())
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}
