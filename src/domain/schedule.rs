// Recurring schedule arithmetic - calendar steps and occurrence sequences
use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_OCCURRENCE_LIMIT: usize = 50;
pub const DEFAULT_REMINDER_LEAD_DAYS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid frequency unit '{0}' (expected week, month or year)")]
    InvalidUnit(String),

    #[error("frequency interval must be at least 1")]
    InvalidInterval,

    #[error("occurrence limit must be at least 1")]
    InvalidLimit,

    #[error("invalid start date '{0}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidStartDate(String),

    #[error("invalid frequency '{0}' (expected <interval>_<unit>s)")]
    InvalidFrequency(String),

    #[error("date arithmetic left the representable calendar range")]
    DateOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Week,
    Month,
    Year,
}

impl FrequencyUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyUnit::Week => "week",
            FrequencyUnit::Month => "month",
            FrequencyUnit::Year => "year",
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyUnit {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weeks" => Ok(FrequencyUnit::Week),
            "month" | "months" => Ok(FrequencyUnit::Month),
            "year" | "years" => Ok(FrequencyUnit::Year),
            _ => Err(ScheduleError::InvalidUnit(s.trim().to_string())),
        }
    }
}

/// Advance `date` by `interval` units.
///
/// Month and year steps clamp to the last day of the target month when the
/// day-of-month does not exist there (Jan 31 + 1 month = Feb 29 in a leap
/// year). Time of day is preserved.
pub fn step(
    date: DateTime<Utc>,
    unit: FrequencyUnit,
    interval: u32,
) -> Result<DateTime<Utc>, ScheduleError> {
    if interval == 0 {
        return Err(ScheduleError::InvalidInterval);
    }

    let next = match unit {
        FrequencyUnit::Week => date.checked_add_days(Days::new(u64::from(interval) * 7)),
        FrequencyUnit::Month => date.checked_add_months(Months::new(interval)),
        FrequencyUnit::Year => interval
            .checked_mul(12)
            .and_then(|months| date.checked_add_months(Months::new(months))),
    };

    next.ok_or(ScheduleError::DateOutOfRange)
}

/// A validated recurrence: every `interval` units.
///
/// On the wire a frequency is written as `<interval>_<unit>s`, e.g. `2_weeks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    unit: FrequencyUnit,
    interval: u32,
}

impl Frequency {
    pub fn new(unit: FrequencyUnit, interval: u32) -> Result<Self, ScheduleError> {
        if interval == 0 {
            return Err(ScheduleError::InvalidInterval);
        }
        Ok(Self { unit, interval })
    }

    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn step(&self, date: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        step(date, self.unit, self.interval)
    }

    /// Lazy sequence of occurrences after `start` (exclusive).
    pub fn occurrences(&self, start: DateTime<Utc>) -> Occurrences {
        Occurrences {
            current: start,
            frequency: *self,
            exhausted: false,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}s", self.interval, self.unit)
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidFrequency(s.to_string());

        let (interval, unit) = s.split_once('_').ok_or_else(invalid)?;
        if interval.is_empty() || !interval.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let interval: u32 = interval.parse().map_err(|_| invalid())?;
        let unit = match unit {
            "weeks" => FrequencyUnit::Week,
            "months" => FrequencyUnit::Month,
            "years" => FrequencyUnit::Year,
            _ => return Err(invalid()),
        };

        Frequency::new(unit, interval).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Frequency {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.to_string()
    }
}

/// Unbounded occurrence sequence; each item is one step after the previous.
/// Ends only when chrono's representable range runs out.
#[derive(Debug, Clone)]
pub struct Occurrences {
    current: DateTime<Utc>,
    frequency: Frequency,
    exhausted: bool,
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        match self.frequency.step(self.current) {
            Ok(next) => {
                self.current = next;
                Some(next)
            }
            Err(_) => {
                self.exhausted = true;
                None
            }
        }
    }
}

impl FusedIterator for Occurrences {}

/// First `limit` occurrences after `start_date`.
pub fn generate(
    start_date: DateTime<Utc>,
    unit: FrequencyUnit,
    interval: u32,
    limit: usize,
) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
    let frequency = Frequency::new(unit, interval)?;
    if limit == 0 {
        return Err(ScheduleError::InvalidLimit);
    }

    let occurrences: Vec<DateTime<Utc>> = frequency.occurrences(start_date).take(limit).collect();
    if occurrences.len() < limit {
        return Err(ScheduleError::DateOutOfRange);
    }

    Ok(occurrences)
}

/// First occurrence strictly after `now`. An occurrence equal to `now` counts as passed.
pub fn find_next(sequence: &[DateTime<Utc>], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    sequence.iter().copied().find(|occurrence| *occurrence > now)
}

/// `next` moved back by `lead_days` calendar days.
///
/// `None` when there is no next occurrence. A reminder that would fall before
/// the earliest representable date is also `None`; the occurrence itself is
/// still valid in that case.
pub fn reminder_date(next: Option<DateTime<Utc>>, lead_days: u32) -> Option<DateTime<Utc>> {
    next.and_then(|date| date.checked_sub_days(Days::new(u64::from(lead_days))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_step_is_always_later() {
        let dates = [day(2024, 1, 31), day(2024, 2, 29), day(2023, 12, 31), day(2025, 6, 15)];
        let units = [FrequencyUnit::Week, FrequencyUnit::Month, FrequencyUnit::Year];

        for date in dates {
            for unit in units {
                for interval in [1, 2, 5, 13] {
                    let next = step(date, unit, interval).unwrap();
                    assert!(next > date, "{} + {} {} was not later", date, interval, unit);
                }
            }
        }
    }

    #[test]
    fn test_step_weeks() {
        assert_eq!(step(day(2024, 11, 8), FrequencyUnit::Week, 1).unwrap(), day(2024, 11, 15));
        assert_eq!(step(day(2024, 12, 25), FrequencyUnit::Week, 2).unwrap(), day(2025, 1, 8));
    }

    #[test]
    fn test_step_preserves_time_of_day() {
        let date = Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 5).unwrap();
        let next = step(date, FrequencyUnit::Month, 1).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 4, 10, 14, 30, 5).unwrap());
    }

    #[test]
    fn test_month_overflow_clamps_to_end_of_month() {
        assert_eq!(step(day(2024, 1, 31), FrequencyUnit::Month, 1).unwrap(), day(2024, 2, 29));
        assert_eq!(step(day(2025, 1, 31), FrequencyUnit::Month, 1).unwrap(), day(2025, 2, 28));
        assert_eq!(step(day(2024, 8, 31), FrequencyUnit::Month, 1).unwrap(), day(2024, 9, 30));
        assert_eq!(step(day(2024, 11, 30), FrequencyUnit::Month, 3).unwrap(), day(2025, 2, 28));
    }

    #[test]
    fn test_year_step_on_leap_day() {
        assert_eq!(step(day(2024, 2, 29), FrequencyUnit::Year, 1).unwrap(), day(2025, 2, 28));
        assert_eq!(step(day(2024, 2, 29), FrequencyUnit::Year, 4).unwrap(), day(2028, 2, 29));
        assert_eq!(step(day(2023, 7, 4), FrequencyUnit::Year, 2).unwrap(), day(2025, 7, 4));
    }

    #[test]
    fn test_invalid_interval() {
        assert_eq!(
            step(day(2024, 1, 1), FrequencyUnit::Week, 0),
            Err(ScheduleError::InvalidInterval)
        );
        assert_eq!(Frequency::new(FrequencyUnit::Month, 0), Err(ScheduleError::InvalidInterval));
    }

    #[test]
    fn test_invalid_unit() {
        assert_eq!(
            "fortnight".parse::<FrequencyUnit>(),
            Err(ScheduleError::InvalidUnit("fortnight".to_string()))
        );
        assert_eq!(" Month ".parse::<FrequencyUnit>(), Ok(FrequencyUnit::Month));
        assert_eq!("years".parse::<FrequencyUnit>(), Ok(FrequencyUnit::Year));
    }

    #[test]
    fn test_step_out_of_range() {
        assert_eq!(
            step(DateTime::<Utc>::MAX_UTC, FrequencyUnit::Week, 1),
            Err(ScheduleError::DateOutOfRange)
        );
    }

    #[test]
    fn test_generate_weekly() {
        let occurrences = generate(day(2024, 11, 8), FrequencyUnit::Week, 1, 5).unwrap();
        assert_eq!(
            occurrences,
            vec![
                day(2024, 11, 15),
                day(2024, 11, 22),
                day(2024, 11, 29),
                day(2024, 12, 6),
                day(2024, 12, 13),
            ]
        );
    }

    #[test]
    fn test_generate_is_strictly_increasing_with_exact_length() {
        for unit in [FrequencyUnit::Week, FrequencyUnit::Month, FrequencyUnit::Year] {
            let occurrences = generate(day(2024, 1, 31), unit, 1, DEFAULT_OCCURRENCE_LIMIT).unwrap();
            assert_eq!(occurrences.len(), DEFAULT_OCCURRENCE_LIMIT);
            assert!(occurrences[0] > day(2024, 1, 31));
            assert!(occurrences.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn test_generate_month_clamp_is_sticky() {
        let occurrences = generate(day(2024, 1, 31), FrequencyUnit::Month, 1, 3).unwrap();
        assert_eq!(occurrences, vec![day(2024, 2, 29), day(2024, 3, 29), day(2024, 4, 29)]);
    }

    #[test]
    fn test_generate_rejects_bad_arguments() {
        assert_eq!(
            generate(day(2024, 1, 1), FrequencyUnit::Week, 0, 5),
            Err(ScheduleError::InvalidInterval)
        );
        assert_eq!(
            generate(day(2024, 1, 1), FrequencyUnit::Week, 1, 0),
            Err(ScheduleError::InvalidLimit)
        );
    }

    #[test]
    fn test_occurrences_are_restartable() {
        let frequency = Frequency::new(FrequencyUnit::Week, 3).unwrap();
        let first: Vec<_> = frequency.occurrences(day(2024, 1, 1)).take(4).collect();
        let second: Vec<_> = frequency.occurrences(day(2024, 1, 1)).take(4).collect();
        assert_eq!(first, second);
        assert_eq!(first[3], day(2024, 3, 25));
    }

    #[test]
    fn test_find_next_and_reminder() {
        let occurrences = generate(day(2024, 11, 8), FrequencyUnit::Week, 1, 5).unwrap();

        let next = find_next(&occurrences, day(2024, 11, 20));
        assert_eq!(next, Some(day(2024, 11, 22)));
        assert_eq!(reminder_date(next, 3), Some(day(2024, 11, 19)));
        assert_eq!(reminder_date(next, 0), next);
    }

    #[test]
    fn test_find_next_is_strictly_after_now() {
        let occurrences = generate(day(2024, 11, 8), FrequencyUnit::Week, 1, 5).unwrap();

        assert_eq!(find_next(&occurrences, day(2024, 11, 22)), Some(day(2024, 11, 29)));
        assert_eq!(find_next(&occurrences, day(2024, 12, 13)), None);
    }

    #[test]
    fn test_exhausted_sequence() {
        let occurrences = generate(day(2024, 11, 8), FrequencyUnit::Week, 1, 1).unwrap();
        let next = find_next(&occurrences, day(2024, 11, 20));

        assert_eq!(next, None);
        assert_eq!(reminder_date(next, DEFAULT_REMINDER_LEAD_DAYS), None);
        assert_eq!(find_next(&[], day(2024, 11, 20)), None);
    }

    #[test]
    fn test_reminder_before_earliest_date() {
        let earliest = DateTime::<Utc>::MIN_UTC;
        assert_eq!(reminder_date(Some(earliest), 3), None);
        assert_eq!(reminder_date(Some(earliest), 0), Some(earliest));
    }

    #[test]
    fn test_frequency_wire_format() {
        let frequency = Frequency::new(FrequencyUnit::Week, 2).unwrap();
        assert_eq!(frequency.to_string(), "2_weeks");
        assert_eq!("2_weeks".parse::<Frequency>(), Ok(frequency));
        assert_eq!(
            "1_months".parse::<Frequency>(),
            Frequency::new(FrequencyUnit::Month, 1)
        );

        assert_eq!(
            "weekly".parse::<Frequency>(),
            Err(ScheduleError::InvalidFrequency("weekly".to_string()))
        );
        for malformed in ["0_years", "1_week", "2_ Weeks", "2_Weeks", " 2_weeks", "+2_weeks", "_weeks"] {
            assert_eq!(
                malformed.parse::<Frequency>(),
                Err(ScheduleError::InvalidFrequency(malformed.to_string())),
                "{:?} should be rejected",
                malformed
            );
        }

        let json = serde_json::to_string(&frequency).unwrap();
        assert_eq!(json, "\"2_weeks\"");
    }
}
