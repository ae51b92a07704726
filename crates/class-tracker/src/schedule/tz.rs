//! Time zone helpers: zone lookup, wall-clock localisation and parsing of
//! caller-supplied reference instants.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::{OffsetComponents, Tz};

use super::error::ScheduleError;

/// Naive forms accepted for a reference instant, read as wall-clock time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset-bearing forms beyond RFC 3339: minute precision and basic offsets.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Resolves an IANA zone name such as `America/New_York`.
pub fn parse_zone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_e| ScheduleError::UnknownTimezone(name.to_string()))
}

/// Places a wall-clock date-time in `tz`.
///
/// A time repeated by a DST fold takes its standard-time reading. A time
/// skipped by a DST gap is read with the offset in force before the gap,
/// which lands just past it (02:30 in a 02:00-03:00 gap becomes 03:30).
pub fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, second) => {
            if first.offset().dst_offset() == Duration::zero() {
                first
            } else {
                second
            }
        }
        LocalResult::None => across_gap(tz, local),
    }
}

fn across_gap(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    let offset_before = (1..=24)
        .filter_map(|hours| local.checked_sub_signed(Duration::hours(hours)))
        .find_map(|probe| tz.from_local_datetime(&probe).earliest())
        .map(|dt| dt.offset().fix())
        .unwrap_or_else(|| Utc.fix());

    let utc = local - Duration::seconds(i64::from(offset_before.local_minus_utc()));
    tz.from_utc_datetime(&utc)
}

/// The first instant of `date` in `tz`.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    localize(tz, date.and_time(NaiveTime::MIN))
}

/// Parses a caller-supplied reference instant.
///
/// Values with an offset (RFC 3339, `Z`, `±HH:MM` or `±HHMM`, seconds
/// optional) are converted into `tz`.
/// Values without an offset are wall-clock time in `tz`; a bare date means
/// local midnight.
pub fn parse_reference(value: &str, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    let trimmed = value.trim();
    let invalid = || ScheduleError::InvalidReferenceInstant {
        value: value.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&tz));
    }
    // `Z` is spelled as a numeric offset so one format list covers both
    let zulu = trimmed
        .strip_suffix(['Z', 'z'])
        .map(|rest| format!("{rest}+00:00"));
    let with_offset = zulu.as_deref().unwrap_or(trimmed);
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(with_offset, format).ok())
    {
        return Ok(dt.with_timezone(&tz));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
    {
        return Ok(localize(tz, naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(start_of_day(tz, date));
    }

    Err(invalid())
}
