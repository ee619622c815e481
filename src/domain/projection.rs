// Schedule projection - turns plan form input into upcoming maintenance dates
use super::schedule::{
    find_next, generate, reminder_date, Frequency, FrequencyUnit, ScheduleError,
    DEFAULT_OCCURRENCE_LIMIT, DEFAULT_REMINDER_LEAD_DAYS,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Raw plan fields as submitted by the equipment profile form.
/// Any of them may be missing or blank while the user is still editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub frequency_unit: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_text")]
    pub frequency_interval: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseText {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn deserialize_loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseText>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        LooseText::Text(text) => text,
        LooseText::Integer(number) => number.to_string(),
        LooseText::Float(number) => number.to_string(),
    }))
}

/// A complete, validated plan ready for projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePlan {
    pub start: DateTime<Utc>,
    pub frequency: Frequency,
}

impl PlanInput {
    pub fn new(start_date: &str, frequency_unit: &str, frequency_interval: &str) -> Self {
        Self {
            start_date: Some(start_date.to_string()),
            frequency_unit: Some(frequency_unit.to_string()),
            frequency_interval: Some(frequency_interval.to_string()),
        }
    }

    /// `Ok(None)` when the input is incomplete (a field is missing, blank or
    /// the interval is zero). Malformed non-empty values are errors.
    pub fn parse(&self) -> Result<Option<SchedulePlan>, ScheduleError> {
        let (Some(start), Some(unit), Some(interval)) = (
            non_blank(&self.start_date),
            non_blank(&self.frequency_unit),
            non_blank(&self.frequency_interval),
        ) else {
            return Ok(None);
        };

        let interval = parse_interval(interval)?;
        if interval == 0 {
            return Ok(None);
        }

        let unit: FrequencyUnit = unit.parse()?;
        let start = parse_start_date(start)?;

        Ok(Some(SchedulePlan {
            start,
            frequency: Frequency::new(unit, interval)?,
        }))
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_interval(raw: &str) -> Result<u32, ScheduleError> {
    let value: i64 = raw.parse().map_err(|_| ScheduleError::InvalidInterval)?;
    u32::try_from(value).map_err(|_| ScheduleError::InvalidInterval)
}

/// Accepts a date-only value (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_start_date(raw: &str) -> Result<DateTime<Utc>, ScheduleError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| ScheduleError::InvalidStartDate(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionSettings {
    pub occurrence_limit: usize,
    pub reminder_lead_days: u32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            occurrence_limit: DEFAULT_OCCURRENCE_LIMIT,
            reminder_lead_days: DEFAULT_REMINDER_LEAD_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub occurrences: Vec<DateTime<Utc>>,
    pub next_occurrence: Option<DateTime<Utc>>,
    pub reminder_date: Option<DateTime<Utc>>,
}

impl Projection {
    /// The "no schedule configured" projection.
    pub fn empty() -> Self {
        Self {
            occurrences: Vec::new(),
            next_occurrence: None,
            reminder_date: None,
        }
    }
}

pub fn project_plan(
    plan: &SchedulePlan,
    now: DateTime<Utc>,
    settings: &ProjectionSettings,
) -> Result<Projection, ScheduleError> {
    let occurrences = generate(
        plan.start,
        plan.frequency.unit(),
        plan.frequency.interval(),
        settings.occurrence_limit,
    )?;
    let next_occurrence = find_next(&occurrences, now);
    let reminder_date = reminder_date(next_occurrence, settings.reminder_lead_days);

    Ok(Projection {
        occurrences,
        next_occurrence,
        reminder_date,
    })
}

pub fn project(
    input: &PlanInput,
    now: DateTime<Utc>,
    settings: &ProjectionSettings,
) -> Result<Projection, ScheduleError> {
    match input.parse()? {
        Some(plan) => project_plan(&plan, now, settings),
        None => Ok(Projection::empty()),
    }
}
