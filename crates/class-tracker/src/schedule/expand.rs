//! Projection of weekly meeting templates onto concrete dates.

use chrono::{DateTime, Datelike, Days};
use chrono_tz::Tz;

use super::tz::localize;
use crate::model::{Course, Location, Meeting, Weekday};

/// Number of calendar days scanned forward from the reference date.
pub const HORIZON_DAYS: u64 = 7;

/// A dated, timed instance of a meeting. Derived on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence<'a> {
    pub course: &'a Course,
    pub meeting: &'a Meeting,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Effective location after override resolution
    pub location: Option<&'a Location>,
}

impl Occurrence<'_> {
    /// True while `now` lies in `[start, end)`.
    pub fn is_in_progress(&self, now: &DateTime<Tz>) -> bool {
        self.start <= *now && *now < self.end
    }
}

/// Expands every meeting of every course into the occurrences that have not
/// yet ended within the horizon starting at `reference`'s local date.
///
/// Start and end are built from the meeting's wall-clock times in
/// `reference`'s zone. An occurrence ending exactly at `reference` is
/// dropped; one in progress is kept. The result is ordered by start, ties
/// keeping course and meeting input order.
pub fn expand(courses: &[Course], reference: DateTime<Tz>) -> Vec<Occurrence<'_>> {
    let tz = reference.timezone();
    let first_date = reference.date_naive();
    let dates: Vec<_> = (0..HORIZON_DAYS)
        .filter_map(|offset| first_date.checked_add_days(Days::new(offset)))
        .collect();

    let mut occurrences = Vec::new();
    for course in courses {
        for meeting in &course.meetings {
            for date in dates
                .iter()
                .filter(|date| Weekday::from(date.weekday()) == meeting.weekday)
            {
                let start = localize(tz, date.and_time(meeting.start.as_naive()));
                let end = localize(tz, date.and_time(meeting.end.as_naive()));
                if end <= reference {
                    continue;
                }

                occurrences.push(Occurrence {
                    course,
                    meeting,
                    start,
                    end,
                    location: course.effective_location(meeting),
                });
            }
        }
    }

    occurrences.sort_by_key(|occurrence| occurrence.start);
    occurrences
}
