//! Recording finished sessions against the run.

use serde::Serialize;

use super::store::{RunStore, CYCLE_LENGTH};
use crate::date_key::DateKey;

/// Signals produced by one call to [`RunStore::record_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub today_key: DateKey,
    /// Offset of today from cycle day 1, after any restart.
    pub day_index: i64,
    /// Credited days in the cycle after this call.
    pub completed_count: usize,
    /// Today became a credited day with this call.
    pub completed_day_now: bool,
    /// Today was already credited before this call.
    pub already_completed_today: bool,
    /// This call credited the seventh day of the cycle.
    pub hit_day_seven: bool,
    /// The cycle had expired and was restarted at today.
    pub cycle_restarted: bool,
}

impl RunStore {
    /// Record a finished session on `today`.
    ///
    /// An expired cycle restarts first. A day is credited at most once; repeat
    /// sessions still bump the raw count and the lifetime total. With
    /// `completed == false` only the cycle restart can happen.
    pub fn record_completion(&mut self, completed: bool, today: DateKey) -> CompletionOutcome {
        let cycle_restarted = self.restart_if_expired(today);
        let day_index = self.day_index(today);
        debug_assert!((0..CYCLE_LENGTH).contains(&day_index));

        let already_completed_today =
            self.last_completion_date == Some(today) || self.is_credited(today);
        let mut completed_day_now = false;

        if completed {
            let count = self.completions_by_date.entry(today).or_insert(0);
            *count = count.saturating_add(1);
            let reached_goal = *count >= self.daily_goal.get();

            if !already_completed_today && reached_goal {
                self.completed_dates.push(today);
                self.last_completion_date = Some(today);
                completed_day_now = true;
            }
            self.total_resets = self.total_resets.saturating_add(1);
        }

        let completed_count = self.completed_dates.len();
        let hit_day_seven = completed_day_now && completed_count as i64 == CYCLE_LENGTH;

        tracing::debug!(
            today = %today,
            day_index,
            completed_count,
            completed_day_now,
            already_completed_today,
            hit_day_seven,
            "recorded completion"
        );

        CompletionOutcome {
            today_key: today,
            day_index,
            completed_count,
            completed_day_now,
            already_completed_today,
            hit_day_seven,
            cycle_restarted,
        }
    }
}
