/// Schedule engine: expands the weekly template and answers "next class"
/// and "today's classes" for a reference instant.
///
/// Everything here is a pure function of its arguments. The fallback zone
/// is passed in by the caller and the clock is only read when no reference
/// instant is supplied.
mod error;
mod expand;
pub mod tz;
mod week;

pub use error::ScheduleError;
pub use expand::{expand, Occurrence, HORIZON_DAYS};
pub use week::{resolve_week, UnscheduledCourse, WeekDay, WeekOverview, WeekSlot};

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::model::{Config, Course, Location};

/// Whether the next class has already started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStatus {
    Upcoming,
    InProgress,
}

/// One occurrence as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledClass {
    pub course_id: String,
    pub course_code: String,
    pub course_title: String,
    pub color: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub location: Option<Location>,
    pub instructors: Vec<String>,
}

impl From<&Occurrence<'_>> for ScheduledClass {
    fn from(occurrence: &Occurrence<'_>) -> Self {
        let course = occurrence.course;
        ScheduledClass {
            course_id: course.course_id.clone(),
            course_code: course.code.clone(),
            course_title: course.title.clone(),
            color: course.color.clone(),
            start: occurrence.start.fixed_offset(),
            end: occurrence.end.fixed_offset(),
            location: occurrence.location.cloned(),
            instructors: course.instructors.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextMeeting {
    #[serde(flatten)]
    pub class: ScheduledClass,
    /// Whole minutes until the start, never negative
    pub minutes_until: u64,
    pub status: NextStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextResult {
    pub now: DateTime<FixedOffset>,
    pub next: NextMeeting,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayResult {
    pub now: DateTime<FixedOffset>,
    pub items: Vec<ScheduledClass>,
}

/// Picks the zone for `config`: its manual-mode setting when present,
/// otherwise `fallback`.
pub fn zone_for(config: &Config, fallback: Tz) -> Result<Tz, ScheduleError> {
    match config.timezone() {
        Some(name) => tz::parse_zone(name),
        None => Ok(fallback),
    }
}

/// Parses `now` in `tz`, or reads the clock when it is absent.
pub fn reference_instant(now: Option<&str>, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    match now {
        Some(value) => tz::parse_reference(value, tz),
        None => Ok(Utc::now().with_timezone(&tz)),
    }
}

/// The nearest class that is in progress or still to come, if any.
pub fn next_at(courses: &[Course], now: DateTime<Tz>) -> Option<NextMeeting> {
    let occurrences = expand(courses, now);
    let next = occurrences.first()?;

    let status = if next.is_in_progress(&now) {
        NextStatus::InProgress
    } else {
        NextStatus::Upcoming
    };
    let millis = (next.start - now).num_milliseconds();
    let minutes_until = (millis as f64 / 60_000.0).round().max(0.0) as u64;

    Some(NextMeeting {
        class: ScheduledClass::from(next),
        minutes_until,
        status,
    })
}

/// Every class starting on `now`'s local calendar day, ordered by start.
pub fn today_at(courses: &[Course], now: DateTime<Tz>) -> Vec<ScheduledClass> {
    let tz = now.timezone();
    let today = now.date_naive();
    // Scan from the previous midnight so classes that already started or
    // finished today are still inside the window.
    let scan_from = today
        .pred_opt()
        .map(|yesterday| tz::start_of_day(tz, yesterday))
        .unwrap_or_else(|| tz::start_of_day(tz, today));

    expand(courses, scan_from)
        .iter()
        .filter(|occurrence| occurrence.start.date_naive() == today)
        .map(ScheduledClass::from)
        .collect()
}

/// Resolves the next class for `config`.
///
/// `now` is an optional ISO-8601 override read in the configured zone.
/// Returns `Ok(None)` when nothing is scheduled within the horizon.
pub fn resolve_next(
    config: &Config,
    now: Option<&str>,
    fallback: Tz,
) -> Result<Option<NextResult>, ScheduleError> {
    let tz = zone_for(config, fallback)?;
    let now = reference_instant(now, tz)?;

    Ok(next_at(&config.courses, now).map(|next| NextResult {
        now: now.fixed_offset(),
        next,
    }))
}

/// Resolves today's classes for `config`.
pub fn resolve_today(
    config: &Config,
    now: Option<&str>,
    fallback: Tz,
) -> Result<TodayResult, ScheduleError> {
    let tz = zone_for(config, fallback)?;
    let now = reference_instant(now, tz)?;

    Ok(TodayResult {
        now: now.fixed_offset(),
        items: today_at(&config.courses, now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClockTime, Meeting, Weekday};
    use chrono::{Datelike, NaiveDate, Timelike};
    use serde_json::json;

    const NEW_YORK: Tz = Tz::America__New_York;

    fn config_with(courses: serde_json::Value) -> Config {
        serde_json::from_value(json!({
            "data_source": { "mode": "manual", "manual": { "timezone": "America/New_York" } },
            "profile": { "student_name": "Ada" },
            "notifications": { "enabled": false },
            "ui": {},
            "courses": courses
        }))
        .unwrap()
    }

    fn cs101() -> Config {
        config_with(json!([{
            "course_id": "cs101",
            "code": "CS101",
            "title": "Intro to Computing",
            "color": "#2563EB",
            "instructors": ["Grace Hopper"],
            "location_default": { "building": "Hall", "room": "101" },
            "meetings": [{ "weekday": "mon", "start": "09:00", "end": "09:50" }]
        }]))
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap();
        tz::localize(NEW_YORK, naive)
    }

    #[test]
    fn test_status_and_countdown() {
        let config = config_with(json!([{
            "course_id": "math",
            "code": "MATH20",
            "title": "Calculus",
            "meetings": [{ "weekday": "tue", "start": "09:00", "end": "10:15" }]
        }]));

        // Tuesday 2024-01-09
        let during = next_at(&config.courses, at(2024, 1, 9, 9, 30)).unwrap();
        assert_eq!(during.status, NextStatus::InProgress);
        assert_eq!(during.minutes_until, 0);

        let before = next_at(&config.courses, at(2024, 1, 9, 8, 45)).unwrap();
        assert_eq!(before.status, NextStatus::Upcoming);
        assert_eq!(before.minutes_until, 15);
    }

    #[test]
    fn test_next_from_sunday_night() {
        let config = cs101();

        // Sunday 2024-01-07 23:00 is ten hours before Monday 09:00
        let result = resolve_next(&config, Some("2024-01-07T23:00:00"), NEW_YORK)
            .unwrap()
            .unwrap();
        assert_eq!(result.next.class.course_code, "CS101");
        assert_eq!(result.next.class.start.weekday(), chrono::Weekday::Mon);
        assert_eq!(result.next.class.start.hour(), 9);
        assert_eq!(result.next.minutes_until, 600);
        assert_eq!(result.next.status, NextStatus::Upcoming);

        let earlier = resolve_next(&config, Some("2024-01-07T22:00:00"), NEW_YORK)
            .unwrap()
            .unwrap();
        assert_eq!(earlier.next.minutes_until, 660);
    }

    #[test]
    fn test_next_reports_course_details() {
        let config = cs101();
        let next = next_at(&config.courses, at(2024, 1, 8, 8, 0)).unwrap();

        assert_eq!(next.class.course_id, "cs101");
        assert_eq!(next.class.course_title, "Intro to Computing");
        assert_eq!(next.class.color, "#2563EB");
        assert_eq!(next.class.instructors, vec!["Grace Hopper".to_string()]);
        let location = next.class.location.unwrap();
        assert_eq!((location.building.as_str(), location.room.as_str()), ("Hall", "101"));
        assert_eq!(next.class.end - next.class.start, chrono::Duration::minutes(50));
    }

    #[test]
    fn test_rounding_of_partial_minutes() {
        let config = cs101();
        // 08:59:31 leaves 29 seconds, 08:59:29 leaves 31 seconds
        let rounds_down = resolve_next(&config, Some("2024-01-08T08:59:31"), NEW_YORK)
            .unwrap()
            .unwrap();
        assert_eq!(rounds_down.next.minutes_until, 0);
        let rounds_up = resolve_next(&config, Some("2024-01-08T08:59:29"), NEW_YORK)
            .unwrap()
            .unwrap();
        assert_eq!(rounds_up.next.minutes_until, 1);
    }

    #[test]
    fn test_today_includes_class_in_progress() {
        let config = cs101();

        let result = resolve_today(&config, Some("2024-01-08T09:10:00"), NEW_YORK).unwrap();

        assert_eq!(result.items.len(), 1);
        let item = &result.items[0];
        assert_eq!(item.start.naive_local(), at(2024, 1, 8, 9, 0).naive_local());
        assert_eq!(result.now.naive_local(), at(2024, 1, 8, 9, 10).naive_local());
    }

    #[test]
    fn test_today_includes_finished_classes() {
        let config = cs101();
        let items = today_at(&config.courses, at(2024, 1, 8, 23, 59));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_today_only_returns_local_date() {
        let meetings: Vec<serde_json::Value> = Weekday::ALL
            .iter()
            .flat_map(|day| {
                [("00:00", "00:30"), ("12:00", "13:00"), ("23:00", "23:59")]
                    .map(|(start, end)| json!({ "weekday": day.key(), "start": start, "end": end }))
            })
            .collect();
        let config = config_with(json!([{
            "course_id": "all", "code": "ALL", "title": "Everything", "meetings": meetings
        }]));

        for day in 7..=14 {
            for hour in [0, 11, 23] {
                let now = at(2024, 1, day, hour, 15);
                let items = today_at(&config.courses, now);
                assert_eq!(items.len(), 3, "day {day} hour {hour}");
                assert!(items
                    .iter()
                    .all(|item| item.start.date_naive() == now.date_naive()));
                assert!(items.windows(2).all(|pair| pair[0].start <= pair[1].start));
            }
        }
    }

    #[test]
    fn test_today_in_other_zone() {
        let mut config = cs101();
        config.data_source.manual = None;

        // 2024-01-08 09:10 in Tokyo is still Sunday evening in New York
        let tokyo = resolve_today(&config, Some("2024-01-08T09:10:00"), Tz::Asia__Tokyo).unwrap();
        assert_eq!(tokyo.items.len(), 1);
        assert_eq!(tokyo.items[0].start.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_empty_configuration() {
        let config = config_with(json!([]));

        assert_eq!(resolve_next(&config, Some("2024-01-08T09:00:00"), NEW_YORK), Ok(None));
        let today = resolve_today(&config, Some("2024-01-08T09:00:00"), NEW_YORK).unwrap();
        assert!(today.items.is_empty());
    }

    #[test]
    fn test_idempotent_with_explicit_now() {
        let config = cs101();
        let now = Some("2024-01-08T09:10:00");

        assert_eq!(
            resolve_next(&config, now, NEW_YORK),
            resolve_next(&config, now, NEW_YORK)
        );
        assert_eq!(
            resolve_today(&config, now, NEW_YORK),
            resolve_today(&config, now, NEW_YORK)
        );
    }

    #[test]
    fn test_minutes_until_never_negative() {
        let config = config_with(json!([{
            "course_id": "lab", "code": "LAB", "title": "Lab",
            "meetings": [
                { "weekday": "mon", "start": "08:00", "end": "12:00" },
                { "weekday": "wed", "start": "13:00", "end": "13:30" }
            ]
        }]));

        let mut seen_upcoming = 0;
        for hour in 0..24 {
            for (minute, second) in [(0, 0), (30, 0), (59, 29), (59, 31)] {
                let naive = NaiveDate::from_ymd_opt(2024, 1, 8)
                    .unwrap()
                    .and_hms_opt(hour, minute, second)
                    .unwrap();
                let now = tz::localize(NEW_YORK, naive);
                let next = next_at(&config.courses, now).unwrap();

                let until = next.class.start.with_timezone(&Utc) - now.with_timezone(&Utc);
                match next.status {
                    NextStatus::InProgress => {
                        assert!(until <= chrono::Duration::zero());
                        assert_eq!(next.minutes_until, 0);
                    }
                    NextStatus::Upcoming => {
                        seen_upcoming += 1;
                        assert!(until > chrono::Duration::zero());
                        let expected = (until.num_seconds() as f64 / 60.0).round() as u64;
                        assert_eq!(next.minutes_until, expected, "at {naive}");
                        assert!(next.minutes_until.abs_diff(until.num_minutes() as u64) <= 1);
                    }
                }
            }
        }
        assert!(seen_upcoming > 0);

        // 07:59:31 is 29 seconds out and rounds down to zero while upcoming
        let close = next_at(&config.courses, at(2024, 1, 8, 7, 59) + chrono::Duration::seconds(31)).unwrap();
        assert_eq!(close.status, NextStatus::Upcoming);
        assert_eq!(close.minutes_until, 0);
    }

    #[test]
    fn test_bad_inputs_are_rejected() {
        let config = cs101();
        assert!(matches!(
            resolve_next(&config, Some(""), NEW_YORK),
            Err(ScheduleError::InvalidReferenceInstant { .. })
        ));
        assert!(matches!(
            resolve_today(&config, Some("not a date"), NEW_YORK),
            Err(ScheduleError::InvalidReferenceInstant { .. })
        ));

        let mut unknown_zone = cs101();
        unknown_zone.data_source.manual.as_mut().unwrap().timezone = "Nowhere/City".to_string();
        assert_eq!(
            resolve_next(&unknown_zone, None, NEW_YORK),
            Err(ScheduleError::UnknownTimezone("Nowhere/City".to_string()))
        );
    }

    #[test]
    fn test_one_occurrence_per_meeting() {
        let mut config = cs101();
        config.courses[0].meetings.push(Meeting {
            weekday: Weekday::Thu,
            start: ClockTime::from_hm(14, 0).unwrap(),
            end: ClockTime::from_hm(15, 0).unwrap(),
            location_override: None,
        });

        for day in 7..=14 {
            let occurrences = expand(&config.courses, at(2024, 1, day, 0, 0));
            assert!(occurrences.len() <= config.courses[0].meetings.len());
        }
    }

    #[test]
    fn test_next_serializes_flat() {
        let config = cs101();
        let result = resolve_next(&config, Some("2024-01-08T08:45:00"), NEW_YORK)
            .unwrap()
            .unwrap();
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["next"]["course_code"], "CS101");
        assert_eq!(value["next"]["status"], "upcoming");
        assert_eq!(value["next"]["minutes_until"], 15);
        assert_eq!(value["next"]["start"], "2024-01-08T09:00:00-05:00");
        assert_eq!(value["next"]["location"]["building"], "Hall");
    }
}
