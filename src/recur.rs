//! Recurrence rules for tasks and calendar events
//!
//! A rule is a frequency plus an interval ("every 2 weeks"). Expansion
//! produces concrete occurrence timestamps inside a query window. Monthly
//! steps clamp the day-of-month, so a rule anchored on Jan 31 lands on
//! Feb 28 (or 29) rather than skipping the month.

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on occurrences produced for a single rule per query.
const MAX_OCCURRENCES: usize = 500;

/// How often a recurring item repeats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Freq {
    Daily,
    Weekly,
    Monthly,
}

impl Freq {
    /// Parse from a lowercase string (API input)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Freq::Daily),
            "weekly" => Some(Freq::Weekly),
            "monthly" => Some(Freq::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Freq::Daily => "daily",
            Freq::Weekly => "weekly",
            Freq::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Freq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurrence rule attached to a task or event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recurrence {
    /// Base frequency
    pub freq: Freq,
    /// Repeat every N units of the frequency (>= 1)
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

impl Recurrence {
    pub fn new(freq: Freq, interval: u32) -> Self {
        Self {
            freq,
            interval: interval.max(1),
        }
    }

    /// Advance one step from an occurrence timestamp (ms since epoch).
    ///
    /// Falls back to the input timestamp if the date arithmetic overflows,
    /// which only happens near the chrono range limits.
    pub fn next_after(&self, ts_ms: i64) -> i64 {
        let interval = self.interval.max(1);
        let dt = match Utc.timestamp_millis_opt(ts_ms).single() {
            Some(dt) => dt,
            None => return ts_ms,
        };

        let next: Option<DateTime<Utc>> = match self.freq {
            Freq::Daily => dt.checked_add_signed(Duration::days(i64::from(interval))),
            Freq::Weekly => dt.checked_add_signed(Duration::weeks(i64::from(interval))),
            Freq::Monthly => dt.checked_add_months(Months::new(interval)),
        };

        next.map(|dt| dt.timestamp_millis()).unwrap_or(ts_ms)
    }

    /// Expand occurrences of a rule anchored at `first` within `[from, to)`.
    ///
    /// Returns occurrence start timestamps in ascending order, capped at
    /// [`MAX_OCCURRENCES`].
    pub fn occurrences_between(&self, first: i64, from: i64, to: i64) -> Vec<i64> {
        let mut out = Vec::new();
        if to <= from {
            return out;
        }

        let mut ts = first;
        while ts < to {
            if ts >= from {
                out.push(ts);
                if out.len() >= MAX_OCCURRENCES {
                    break;
                }
            }

            let next = self.next_after(ts);
            if next <= ts {
                // Non-advancing step; bail out rather than loop forever
                break;
            }
            ts = next;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_daily_step() {
        let rule = Recurrence::new(Freq::Daily, 1);
        assert_eq!(rule.next_after(ms(2024, 3, 1)), ms(2024, 3, 2));

        let rule = Recurrence::new(Freq::Daily, 3);
        assert_eq!(rule.next_after(ms(2024, 3, 1)), ms(2024, 3, 4));
    }

    #[test]
    fn test_weekly_step() {
        let rule = Recurrence::new(Freq::Weekly, 2);
        assert_eq!(rule.next_after(ms(2024, 3, 1)), ms(2024, 3, 15));
    }

    #[test]
    fn test_monthly_clamps_day_of_month() {
        let rule = Recurrence::new(Freq::Monthly, 1);
        // Jan 31 + 1 month lands on Feb 29 (2024 is a leap year)
        assert_eq!(rule.next_after(ms(2024, 1, 31)), ms(2024, 2, 29));
        // Non-leap year clamps to Feb 28
        assert_eq!(rule.next_after(ms(2023, 1, 31)), ms(2023, 2, 28));
    }

    #[test]
    fn test_zero_interval_treated_as_one() {
        let rule = Recurrence::new(Freq::Daily, 0);
        assert_eq!(rule.next_after(ms(2024, 3, 1)), ms(2024, 3, 2));
    }

    #[test]
    fn test_occurrences_within_window() {
        let rule = Recurrence::new(Freq::Weekly, 1);
        let first = ms(2024, 3, 1);
        let occurrences = rule.occurrences_between(first, first, ms(2024, 3, 29));
        assert_eq!(
            occurrences,
            vec![ms(2024, 3, 1), ms(2024, 3, 8), ms(2024, 3, 15), ms(2024, 3, 22)]
        );
    }

    #[test]
    fn test_occurrences_skip_before_window() {
        let rule = Recurrence::new(Freq::Daily, 1);
        let first = ms(2024, 3, 1);
        let occurrences = rule.occurrences_between(first, ms(2024, 3, 10), ms(2024, 3, 13));
        assert_eq!(occurrences, vec![ms(2024, 3, 10), ms(2024, 3, 11), ms(2024, 3, 12)]);
    }

    #[test]
    fn test_empty_window() {
        let rule = Recurrence::new(Freq::Daily, 1);
        assert!(rule.occurrences_between(0, 100, 100).is_empty());
        assert!(rule.occurrences_between(0, 200, 100).is_empty());
    }

    #[test]
    fn test_occurrence_cap() {
        let rule = Recurrence::new(Freq::Daily, 1);
        let first = ms(2020, 1, 1);
        let occurrences = rule.occurrences_between(first, first, ms(2030, 1, 1));
        assert_eq!(occurrences.len(), 500);
    }

    #[test]
    fn test_serde_round_trip() {
        let rule = Recurrence::new(Freq::Monthly, 2);
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"freq":"monthly","interval":2}"#);
        let parsed: Recurrence = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn test_interval_defaults_to_one() {
        let parsed: Recurrence = serde_json::from_str(r#"{"freq":"daily"}"#).unwrap();
        assert_eq!(parsed.interval, 1);
    }
}
