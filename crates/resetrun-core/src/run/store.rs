//! The persisted 7-day run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::date_key::{day_offset, DateKey};
use crate::error::ValidationError;

/// Number of calendar days in one cycle.
pub const CYCLE_LENGTH: i64 = 7;

/// Completions required to credit a calendar day (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct DailyGoal(u8);

impl DailyGoal {
    pub const MIN: DailyGoal = DailyGoal(1);
    pub const MAX: DailyGoal = DailyGoal(3);

    pub fn new(goal: i64) -> Result<Self, ValidationError> {
        match goal {
            1..=3 => Ok(DailyGoal(goal as u8)),
            other => Err(ValidationError::InvalidDailyGoal(other)),
        }
    }

    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for DailyGoal {
    fn default() -> Self {
        DailyGoal::MIN
    }
}

impl TryFrom<i64> for DailyGoal {
    type Error = ValidationError;

    fn try_from(goal: i64) -> Result<Self, Self::Error> {
        DailyGoal::new(goal)
    }
}

impl From<DailyGoal> for i64 {
    fn from(goal: DailyGoal) -> Self {
        i64::from(goal.0)
    }
}

impl fmt::Display for DailyGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One 7-day cycle of completions plus the daily settings lock.
///
/// Serialized with the camelCase field names used by every app revision;
/// `completedDates` is also accepted as `completedDateKeys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStore {
    /// Cycle day 1.
    pub run_start_date: DateKey,
    pub daily_goal: DailyGoal,
    /// Raw completion counts per day of the current cycle.
    #[serde(default)]
    pub completions_by_date: BTreeMap<DateKey, u32>,
    /// Credited days, in the order they were credited. Never holds duplicates.
    #[serde(default, alias = "completedDateKeys")]
    pub completed_dates: Vec<DateKey>,
    /// Most recent credited day.
    #[serde(default)]
    pub last_completion_date: Option<DateKey>,
    #[serde(default)]
    pub settings_locked_for_date: Option<DateKey>,
    #[serde(default)]
    pub last_settings_change_date: Option<DateKey>,
    /// Lifetime count of recorded completions, credited or not.
    #[serde(default)]
    pub total_resets: u64,
}

/// Per-day view of the active cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleDay {
    /// 1-based day number within the cycle.
    pub day: u8,
    pub key: DateKey,
    pub completions: u32,
    pub credited: bool,
}

impl RunStore {
    /// Empty cycle starting today with a goal of one completion per day.
    pub fn fresh(today: DateKey) -> Self {
        Self {
            run_start_date: today,
            daily_goal: DailyGoal::default(),
            completions_by_date: BTreeMap::new(),
            completed_dates: Vec::new(),
            last_completion_date: None,
            settings_locked_for_date: None,
            last_settings_change_date: None,
            total_resets: 0,
        }
    }

    /// Offset of `key` from cycle day 1.
    pub fn day_index(&self, key: DateKey) -> i64 {
        day_offset(self.run_start_date, key)
    }

    /// 1-based cycle day of `key` (day 1 is `run_start_date`).
    pub fn day_number(&self, key: DateKey) -> i64 {
        self.day_index(key) + 1
    }

    /// Whether `today` falls outside day offsets 0..=6.
    pub fn cycle_expired(&self, today: DateKey) -> bool {
        !(0..CYCLE_LENGTH).contains(&self.day_index(today))
    }

    /// Hard restart of the cycle at `today`.
    ///
    /// Credited days and counts are discarded. Goal, locks and the lifetime
    /// total survive.
    pub fn restart_cycle(&mut self, today: DateKey) {
        self.run_start_date = today;
        self.completions_by_date.clear();
        self.completed_dates.clear();
        self.last_completion_date = None;
    }

    /// Restart the cycle when `today` is outside it. Returns true on restart.
    pub fn restart_if_expired(&mut self, today: DateKey) -> bool {
        if !self.cycle_expired(today) {
            return false;
        }
        tracing::info!(
            run_start_date = %self.run_start_date,
            today = %today,
            "run cycle expired, starting a new one"
        );
        self.restart_cycle(today);
        true
    }

    /// Bring a freshly loaded store in line with `today`: stale locks are
    /// dropped and an expired cycle restarts.
    pub fn settle(&mut self, today: DateKey) {
        self.expire_stale_lock(today);
        self.restart_if_expired(today);
    }

    pub fn completions_on(&self, key: DateKey) -> u32 {
        self.completions_by_date.get(&key).copied().unwrap_or(0)
    }

    pub fn is_credited(&self, key: DateKey) -> bool {
        self.completed_dates.contains(&key)
    }

    pub fn credited_days(&self) -> usize {
        self.completed_dates.len()
    }

    /// The seven days of the active cycle.
    pub fn cycle_days(&self) -> Vec<CycleDay> {
        (0..CYCLE_LENGTH)
            .filter_map(|offset| {
                let key = self.run_start_date.plus_days(offset)?;
                Some(CycleDay {
                    day: (offset + 1) as u8,
                    key,
                    completions: self.completions_on(key),
                    credited: self.is_credited(key),
                })
            })
            .collect()
    }

    /// Change the daily goal. Out-of-range values leave the store untouched.
    ///
    /// Returns true if the goal changed.
    pub fn set_daily_goal(&mut self, goal: i64) -> bool {
        match DailyGoal::new(goal) {
            Ok(goal) if goal != self.daily_goal => {
                self.daily_goal = goal;
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::debug!("ignoring daily goal change: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).unwrap()
    }

    #[test]
    fn fresh_store_defaults() {
        let store = RunStore::fresh(key("2024-01-01"));
        assert_eq!(store.run_start_date, key("2024-01-01"));
        assert_eq!(store.daily_goal.get(), 1);
        assert!(store.completions_by_date.is_empty());
        assert!(store.completed_dates.is_empty());
        assert_eq!(store.total_resets, 0);
        assert!(store.settings_locked_for_date.is_none());
        assert!(store.last_completion_date.is_none());
    }

    #[test]
    fn daily_goal_range() {
        assert!(DailyGoal::new(0).is_err());
        assert!(DailyGoal::new(4).is_err());
        assert!(DailyGoal::new(-1).is_err());
        assert_eq!(DailyGoal::new(3).unwrap(), DailyGoal::MAX);
    }

    #[test]
    fn set_daily_goal_rejects_out_of_range() {
        let mut store = RunStore::fresh(key("2024-01-01"));
        let before = store.clone();
        assert!(!store.set_daily_goal(7));
        assert!(!store.set_daily_goal(0));
        assert_eq!(store, before);
        assert!(!store.set_daily_goal(1));
        assert!(store.set_daily_goal(2));
        assert_eq!(store.daily_goal.get(), 2);
    }

    #[test]
    fn cycle_window_is_offsets_zero_to_six() {
        let store = RunStore::fresh(key("2024-01-01"));
        assert!(!store.cycle_expired(key("2024-01-01")));
        assert!(!store.cycle_expired(key("2024-01-07")));
        assert!(store.cycle_expired(key("2024-01-08")));
        assert!(store.cycle_expired(key("2023-12-31")));
        assert_eq!(store.day_number(key("2024-01-07")), 7);
    }

    #[test]
    fn restart_keeps_goal_and_total() {
        let mut store = RunStore::fresh(key("2024-01-01"));
        store.daily_goal = DailyGoal::new(2).unwrap();
        store.total_resets = 12;
        store.completions_by_date.insert(key("2024-01-02"), 2);
        store.completed_dates.push(key("2024-01-02"));
        store.last_completion_date = Some(key("2024-01-02"));

        assert!(store.restart_if_expired(key("2024-01-10")));
        assert_eq!(store.run_start_date, key("2024-01-10"));
        assert!(store.completed_dates.is_empty());
        assert!(store.completions_by_date.is_empty());
        assert!(store.last_completion_date.is_none());
        assert_eq!(store.daily_goal.get(), 2);
        assert_eq!(store.total_resets, 12);
    }

    #[test]
    fn cycle_days_lists_seven_days() {
        let mut store = RunStore::fresh(key("2024-01-30"));
        store.completions_by_date.insert(key("2024-02-01"), 1);
        store.completed_dates.push(key("2024-02-01"));
        let days = store.cycle_days();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].key, key("2024-01-30"));
        assert_eq!(days[6].key, key("2024-02-05"));
        assert!(days[2].credited);
        assert_eq!(days[2].completions, 1);
        assert!(!days[3].credited);
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let mut store = RunStore::fresh(key("2024-01-01"));
        store.completions_by_date.insert(key("2024-01-01"), 1);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["runStartDate"], "2024-01-01");
        assert_eq!(json["dailyGoal"], 1);
        assert_eq!(json["completionsByDate"]["2024-01-01"], 1);
        assert!(json["completedDates"].as_array().unwrap().is_empty());
        assert!(json["settingsLockedForDate"].is_null());
    }
}
