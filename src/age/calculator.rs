use chrono::{DateTime, Datelike, Duration, Months, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use crate::core::types::{AgeBreakdown, DerivedRecord, Record};

pub const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Divisor for ranking-grade years. Fixed 365-day years, not 365.25.
pub const MS_PER_RANKING_YEAR: i64 = MS_PER_DAY * 365;

/// UTC offset of `time_zone` as observed at `at`, in seconds.
/// Missing or unknown zone ids fall back to UTC.
pub fn utc_offset_at(time_zone: Option<&str>, at: DateTime<Utc>) -> i64 {
    time_zone
        .and_then(|id| id.parse::<Tz>().ok())
        .map(|tz| tz.offset_from_utc_datetime(&at.naive_utc()).fix().local_minus_utc() as i64)
        .unwrap_or(0)
}

/// Both instants shifted by the end zone's offset at `end`.
fn shifted_interval(
    birth: DateTime<Utc>,
    end: DateTime<Utc>,
    end_time_zone: Option<&str>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let offset = Duration::seconds(utc_offset_at(end_time_zone, end));
    (birth + offset, end + offset)
}

/// Whole calendar years from `start` to `end`. Feb-29 anniversaries land on Feb-28.
fn whole_calendar_years(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let mut years = (end.year() - start.year()) as i64;
    while years > 0 && add_years(start, years).is_none_or(|anniversary| anniversary > end) {
        years -= 1;
    }
    years.max(0)
}

fn add_years(start: DateTime<Utc>, years: i64) -> Option<DateTime<Utc>> {
    let months = u32::try_from(years.checked_mul(12)?).ok()?;
    start.checked_add_months(Months::new(months))
}

/// Calendar years plus remaining whole days, as observed in the end zone.
pub fn age_breakdown(
    birth: DateTime<Utc>,
    end: DateTime<Utc>,
    end_time_zone: Option<&str>,
) -> AgeBreakdown {
    let (start, stop) = shifted_interval(birth, end, end_time_zone);
    if stop < start {
        return AgeBreakdown::default();
    }

    let years = whole_calendar_years(start, stop);
    let anniversary = add_years(start, years).unwrap_or(start);
    let days = (stop - anniversary).num_milliseconds().div_euclid(MS_PER_DAY);

    AgeBreakdown { years, days }
}

/// Millisecond length of the interval. The zone shift moves both ends
/// equally, so this is the raw instant difference.
pub fn age_duration(
    birth: DateTime<Utc>,
    end: DateTime<Utc>,
    end_time_zone: Option<&str>,
) -> i64 {
    let (start, stop) = shifted_interval(birth, end, end_time_zone);
    (stop - start).num_milliseconds()
}

/// Unrounded 365-day years.
pub fn age_in_years(age_ms: i64) -> f64 {
    age_ms as f64 / MS_PER_RANKING_YEAR as f64
}

/// Rounded 365-day years used for eligibility and age filters.
/// Halves round to even, matching the store's `$round`.
pub fn rounded_age_in_years(age_ms: i64) -> f64 {
    age_in_years(age_ms).round_ties_even()
}

/// End of a record's lifetime: death, or the captured "now".
pub fn end_instant(record: &Record, now: DateTime<Utc>) -> DateTime<Utc> {
    record.personal.date_of_death.unwrap_or(now)
}

/// Age values shown on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeObject {
    pub time_components: AgeBreakdown,
    pub total_milliseconds: i64,
}

impl AgeObject {
    /// `None` when the stored birth value cannot be parsed.
    pub fn for_record(record: &Record, now: DateTime<Utc>) -> Option<Self> {
        let birth = record.personal.birth_instant()?;
        let end = end_instant(record, now);
        let zone = record.age_time_zone();

        Some(AgeObject {
            time_components: age_breakdown(birth, end, zone),
            total_milliseconds: age_duration(birth, end, zone),
        })
    }
}

/// Attach the per-request derived fields to a record.
pub fn derive_fields(record: Record, now: DateTime<Utc>) -> DerivedRecord {
    let age_ms = record
        .personal
        .birth_instant()
        .map(|birth| (end_instant(&record, now) - birth).num_milliseconds());

    DerivedRecord {
        record,
        current_date: Some(now),
        age_in_milliseconds: age_ms,
        age_in_years: age_ms.map(age_in_years),
        rounded_age_in_years: age_ms.map(rounded_age_in_years),
    }
}
