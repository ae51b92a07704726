//! Timeless weekly view of the schedule template.

use serde::Serialize;

use crate::model::{ClockTime, Config, Course, Location, Weekday};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSlot {
    pub course_id: String,
    pub course_code: String,
    pub course_title: String,
    pub color: String,
    pub start: ClockTime,
    pub end: ClockTime,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekDay {
    pub weekday: Weekday,
    pub slots: Vec<WeekSlot>,
}

/// A course with no meetings yet, typically fresh from a Canvas import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnscheduledCourse {
    pub course_id: String,
    pub course_code: String,
    pub course_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOverview {
    /// Monday through Sunday
    pub days: Vec<WeekDay>,
    pub unscheduled: Vec<UnscheduledCourse>,
}

/// Groups every meeting under its weekday, each day ordered by start time.
pub fn resolve_week(config: &Config) -> WeekOverview {
    week_of(&config.courses)
}

fn week_of(courses: &[Course]) -> WeekOverview {
    let mut days: Vec<WeekDay> = Weekday::ALL
        .iter()
        .map(|&weekday| WeekDay {
            weekday,
            slots: Vec::new(),
        })
        .collect();

    for course in courses {
        for meeting in &course.meetings {
            let index = usize::from(meeting.weekday.number() - 1);
            days[index].slots.push(WeekSlot {
                course_id: course.course_id.clone(),
                course_code: course.code.clone(),
                course_title: course.title.clone(),
                color: course.color.clone(),
                start: meeting.start,
                end: meeting.end,
                location: course.effective_location(meeting).cloned(),
            });
        }
    }
    for day in &mut days {
        day.slots.sort_by_key(|slot| slot.start);
    }

    let unscheduled = courses
        .iter()
        .filter(|course| course.meetings.is_empty())
        .map(|course| UnscheduledCourse {
            course_id: course.course_id.clone(),
            course_code: course.code.clone(),
            course_title: course.title.clone(),
        })
        .collect();

    WeekOverview { days, unscheduled }
}
