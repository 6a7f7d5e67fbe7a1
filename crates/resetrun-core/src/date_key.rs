//! Calendar-day keys and clocks.
//!
//! A [`DateKey`] names one calendar day in the device's local time zone and
//! renders as a zero-padded `YYYY-MM-DD` string, so string order equals
//! chronological order. Day arithmetic is done on calendar dates rather than
//! elapsed time, which keeps offsets stable across daylight-saving shifts.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::ValidationError;

const KEY_FORMAT: &str = "%Y-%m-%d";

/// Identifier of one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Key of the local calendar day containing `instant`.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&Local).date_naive())
    }

    /// Key of the calendar day containing `instant` in the instant's own zone.
    pub fn in_zone<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    /// Strict `YYYY-MM-DD` parsing.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let bytes = raw.as_bytes();
        let shaped = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shaped {
            return Err(ValidationError::InvalidDateKey(raw.to_string()));
        }
        NaiveDate::parse_from_str(raw, KEY_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDateKey(raw.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Key `days` calendar days away (negative goes backwards).
    pub fn plus_days(&self, days: i64) -> Option<Self> {
        self.0
            .checked_add_signed(TimeDelta::try_days(days)?)
            .map(Self)
    }

    /// Key for the following calendar day.
    pub fn next(&self) -> Self {
        self.0.succ_opt().map(Self).unwrap_or(*self)
    }

    /// Local midnight at the start of this day, as UTC.
    ///
    /// Falls back to UTC midnight when local midnight does not exist
    /// (zones that skip 00:00 on a DST change).
    pub fn local_midnight(&self) -> DateTime<Utc> {
        let naive = self.0.and_time(NaiveTime::MIN);
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

/// Key for the current local calendar day of `instant`.
pub fn date_key(instant: DateTime<Utc>) -> DateKey {
    DateKey::from_instant(instant)
}

/// Whole calendar days from `start` to `end` (`end - start`).
pub fn day_offset(start: DateKey, end: DateKey) -> i64 {
    end.0.signed_duration_since(start.0).num_days()
}

/// Key for the calendar day after the one containing `instant`.
pub fn next_date_key(instant: DateTime<Utc>) -> DateKey {
    DateKey::from_instant(instant).next()
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Source of "now" for everything that needs today's key.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> DateKey {
        DateKey::from_instant(self.now())
    }
}

/// Wall clock in the device's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a calendar day; can be moved forward or back.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<DateKey>,
}

impl FixedClock {
    pub fn new(today: DateKey) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: DateKey) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = today;
    }

    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = guard.plus_days(days) {
            *guard = next;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        // Noon keeps the instant inside the same local day in every zone.
        let today = *self.today.lock().unwrap_or_else(|e| e.into_inner());
        today.local_midnight() + chrono::Duration::hours(12)
    }

    fn today(&self) -> DateKey {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).unwrap()
    }

    #[test]
    fn renders_zero_padded() {
        let k = DateKey::from_ymd(2024, 1, 5).unwrap();
        assert_eq!(k.to_string(), "2024-01-05");
    }

    #[test]
    fn parse_rejects_unpadded_and_garbage() {
        assert!(DateKey::parse("2024-1-5").is_err());
        assert!(DateKey::parse("2024-02-30").is_err());
        assert!(DateKey::parse("not a date").is_err());
        assert!(DateKey::parse("2024-01-05T00:00:00Z").is_err());
        assert!(DateKey::parse("").is_err());
    }

    #[test]
    fn day_offset_counts_calendar_days() {
        assert_eq!(day_offset(key("2024-01-01"), key("2024-01-10")), 9);
        assert_eq!(day_offset(key("2024-01-10"), key("2024-01-01")), -9);
        assert_eq!(day_offset(key("2024-02-28"), key("2024-03-01")), 2);
        assert_eq!(day_offset(key("2023-12-31"), key("2024-01-01")), 1);
    }

    #[test]
    fn day_offset_across_dst_transition_is_whole_days() {
        // US and EU spring-forward weekends.
        assert_eq!(day_offset(key("2024-03-09"), key("2024-03-11")), 2);
        assert_eq!(day_offset(key("2024-03-30"), key("2024-04-01")), 2);
        assert_eq!(day_offset(key("2024-10-26"), key("2024-10-28")), 2);
    }

    #[test]
    fn in_zone_ignores_time_of_day() {
        let zone = FixedOffset::east_opt(-5 * 3600).unwrap();
        let early = zone.with_ymd_and_hms(2024, 6, 1, 0, 0, 1).unwrap();
        let late = zone.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap();
        assert_eq!(DateKey::in_zone(&early), DateKey::in_zone(&late));
        assert_eq!(DateKey::in_zone(&late).to_string(), "2024-06-01");
    }

    #[test]
    fn next_rolls_over_month_and_year() {
        assert_eq!(key("2024-01-31").next(), key("2024-02-01"));
        assert_eq!(key("2024-12-31").next(), key("2025-01-01"));
        assert_eq!(key("2024-02-28").next(), key("2024-02-29"));
    }

    #[test]
    fn plus_days_out_of_range_is_none() {
        assert_eq!(key("2024-01-01").plus_days(i64::MAX), None);
        assert_eq!(key("2024-01-01").plus_days(i64::MIN), None);
        assert_eq!(key("2024-01-01").plus_days(10_000_000), None);
        assert_eq!(key("2024-01-01").plus_days(-1), Some(key("2023-12-31")));
    }

    #[test]
    fn next_date_key_follows_date_key() {
        let now = Utc::now();
        assert_eq!(day_offset(date_key(now), next_date_key(now)), 1);
    }

    #[test]
    fn serde_uses_plain_string() {
        let json = serde_json::to_string(&key("2024-07-04")).unwrap();
        assert_eq!(json, "\"2024-07-04\"");
        let back: DateKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2024-07-04"));
        assert!(serde_json::from_str::<DateKey>("\"07/04/2024\"").is_err());
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(key("2024-01-01"));
        assert_eq!(clock.today(), key("2024-01-01"));
        clock.advance_days(1);
        assert_eq!(clock.today(), key("2024-01-02"));
        assert_eq!(DateKey::from_instant(clock.now()), key("2024-01-02"));
    }

    fn arb_key() -> impl Strategy<Value = DateKey> {
        (1970i32..2100, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| DateKey::from_ymd(y, m, d).unwrap())
    }

    proptest! {
        #[test]
        fn offset_to_self_is_zero(a in arb_key()) {
            prop_assert_eq!(day_offset(a, a), 0);
        }

        #[test]
        fn offset_is_non_negative_when_ordered(a in arb_key(), b in arb_key()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(day_offset(lo, hi) >= 0);
            prop_assert_eq!(day_offset(lo, hi), -day_offset(hi, lo));
        }

        #[test]
        fn plus_days_inverts_offset(a in arb_key(), n in -400i64..400) {
            let b = a.plus_days(n).unwrap();
            prop_assert_eq!(day_offset(a, b), n);
        }

        #[test]
        fn string_order_matches_date_order(a in arb_key(), b in arb_key()) {
            prop_assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
        }
    }
}
