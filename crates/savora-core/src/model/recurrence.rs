// ── Recurrence rules ──
//
// Offers persist their recurrence rule as opaque text (the store owns
// the physical shape). The sweep parses that text once per offer into
// this closed variant set and interprets it — string handling stops at
// the parse boundary.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// A parsed recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    EveryNDays(u32),
    EveryNWeeks(u32),
    EveryNMonths(u32),
}

impl RecurrenceRule {
    /// First occurrence strictly after `now`, stepping forward from
    /// `from` (the previously scheduled occurrence).
    ///
    /// Returns `None` only if the computed timestamp overflows the
    /// calendar range, which a sweep reports as a per-offer failure.
    pub fn next_after(&self, from: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if from > now {
            return Some(from);
        }
        match *self {
            Self::EveryNDays(n) => step_days(from, now, i64::from(n)),
            Self::EveryNWeeks(n) => step_days(from, now, i64::from(n).checked_mul(7)?),
            Self::EveryNMonths(n) => {
                let mut candidate = from;
                while candidate <= now {
                    candidate = candidate.checked_add_months(Months::new(n))?;
                }
                Some(candidate)
            }
        }
    }
}

/// Fixed-length steps computed arithmetically rather than by looping,
/// so a long-stale `next_occurrence` costs the same as a fresh one.
fn step_days(from: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    let step = Duration::try_days(days)?;
    let behind = now - from;
    let periods = behind.num_seconds().checked_div(step.num_seconds())?;
    let advance = step.checked_mul(periods.checked_add(1)?.try_into().ok()?)?;
    let candidate = from.checked_add_signed(advance)?;
    // Sub-second remainders can land the estimate exactly on `now`.
    if candidate <= now {
        candidate.checked_add_signed(step)
    } else {
        Some(candidate)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EveryNDays(1) => write!(f, "daily"),
            Self::EveryNDays(n) => write!(f, "every {n} days"),
            Self::EveryNWeeks(1) => write!(f, "weekly"),
            Self::EveryNWeeks(n) => write!(f, "every {n} weeks"),
            Self::EveryNMonths(1) => write!(f, "monthly"),
            Self::EveryNMonths(n) => write!(f, "every {n} months"),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = EngineError;

    /// Accepted grammar: `daily` | `weekly` | `monthly` |
    /// `every <n> day(s)|week(s)|month(s)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| EngineError::MalformedRecurrencePattern {
            pattern: s.to_owned(),
            reason: reason.to_owned(),
        };

        let text = s.trim().to_lowercase();
        match text.as_str() {
            "" => return Err(malformed("empty pattern")),
            "daily" => return Ok(Self::EveryNDays(1)),
            "weekly" => return Ok(Self::EveryNWeeks(1)),
            "monthly" => return Ok(Self::EveryNMonths(1)),
            _ => {}
        }

        let mut words = text.split_whitespace();
        if words.next() != Some("every") {
            return Err(malformed("expected `every <n> <unit>`"));
        }
        let n: u32 = words
            .next()
            .ok_or_else(|| malformed("missing interval"))?
            .parse()
            .map_err(|_| malformed("interval is not a number"))?;
        if n == 0 {
            return Err(malformed("interval must be at least 1"));
        }
        let unit = words.next().ok_or_else(|| malformed("missing unit"))?;
        if words.next().is_some() {
            return Err(malformed("trailing tokens after unit"));
        }
        match unit {
            "day" | "days" => Ok(Self::EveryNDays(n)),
            "week" | "weeks" => Ok(Self::EveryNWeeks(n)),
            "month" | "months" => Ok(Self::EveryNMonths(n)),
            other => Err(malformed(&format!("unknown unit {other:?}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn parses_shorthand_forms() {
        assert_eq!(
            "daily".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNDays(1)
        );
        assert_eq!(
            "weekly".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNWeeks(1)
        );
        assert_eq!(
            "monthly".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNMonths(1)
        );
    }

    #[test]
    fn parses_every_n_forms() {
        assert_eq!(
            "every 3 days".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNDays(3)
        );
        assert_eq!(
            "every 1 day".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNDays(1)
        );
        assert_eq!(
            "  Every 2 Weeks ".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNWeeks(2)
        );
        assert_eq!(
            "every 6 months".parse::<RecurrenceRule>().unwrap(),
            RecurrenceRule::EveryNMonths(6)
        );
    }

    #[test]
    fn rejects_malformed_patterns() {
        for bad in [
            "",
            "fortnightly",
            "every days",
            "every x days",
            "every 0 days",
            "every 3 fortnights",
            "every 3 days extra",
        ] {
            let err = bad.parse::<RecurrenceRule>().unwrap_err();
            assert!(
                matches!(err, EngineError::MalformedRecurrencePattern { .. }),
                "pattern {bad:?} gave unexpected error: {err}"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for rule in [
            RecurrenceRule::EveryNDays(1),
            RecurrenceRule::EveryNDays(4),
            RecurrenceRule::EveryNWeeks(1),
            RecurrenceRule::EveryNWeeks(2),
            RecurrenceRule::EveryNMonths(1),
            RecurrenceRule::EveryNMonths(3),
        ] {
            let parsed: RecurrenceRule = rule.to_string().parse().unwrap();
            assert_eq!(parsed, rule);
        }
    }

    #[test]
    fn next_after_is_strictly_in_the_future() {
        let rule = RecurrenceRule::EveryNDays(3);
        let from = ts(2026, 3, 1, 10, 0, 0);

        // `now` exactly on an occurrence: the next one is returned.
        let next = rule.next_after(from, from).unwrap();
        assert_eq!(next, ts(2026, 3, 4, 10, 0, 0));

        // `now` between occurrences.
        let next = rule.next_after(from, ts(2026, 3, 5, 0, 0, 0)).unwrap();
        assert_eq!(next, ts(2026, 3, 7, 10, 0, 0));
    }

    #[test]
    fn next_after_skips_long_gaps_without_drifting() {
        let rule = RecurrenceRule::EveryNWeeks(2);
        let from = ts(2020, 1, 6, 9, 0, 0);
        let now = ts(2026, 8, 24, 12, 0, 0);

        let next = rule.next_after(from, now).unwrap();
        assert!(next > now);
        // Still aligned to the original phase.
        let offset = next - from;
        assert_eq!(offset.num_seconds() % (14 * 24 * 3600), 0);
    }

    #[test]
    fn next_after_returns_future_from_unchanged() {
        let rule = RecurrenceRule::EveryNDays(1);
        let from = ts(2026, 9, 1, 0, 0, 0);
        let now = ts(2026, 8, 24, 0, 0, 0);
        assert_eq!(rule.next_after(from, now).unwrap(), from);
    }

    #[test]
    fn monthly_steps_respect_calendar_lengths() {
        let rule = RecurrenceRule::EveryNMonths(1);
        let from = ts(2026, 1, 31, 8, 0, 0);
        let next = rule.next_after(from, from).unwrap();
        // chrono clamps to the end of the shorter month.
        assert_eq!(next, ts(2026, 2, 28, 8, 0, 0));
    }
}
