//! The stored configuration document: data source, profile, courses and
//! the presentation settings the web client reads back.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::error::ValidationError;
use super::types::Course;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data_source: DataSource,
    pub profile: Profile,
    #[serde(default)]
    pub courses: Vec<Course>,
    pub notifications: Notifications,
    pub ui: UiSettings,
    #[serde(default)]
    pub shortcuts: Shortcuts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    Manual,
    Canvas,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub mode: DataSourceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<ManualSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSource {
    /// IANA zone name, e.g. `America/New_York`
    pub timezone: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSource {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub sync: CanvasSync,
}

impl fmt::Debug for CanvasSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasSource")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("sync", &self.sync)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSync {
    #[serde(default = "yes")]
    pub courses: bool,
    #[serde(default)]
    pub assignments: bool,
    #[serde(default)]
    pub locations: bool,
}

impl Default for CanvasSync {
    fn default() -> Self {
        Self {
            courses: true,
            assignments: false,
            locations: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub student_name: String,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub week_start: WeekStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    BeforeClass,
    RoomChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Stored for the web client; nothing on the server schedules reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifications {
    pub enabled: bool,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub quiet_hours: QuietHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeSection {
    NextClass,
    TodayOverview,
    WeekTimeline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeLayout {
    pub sections: Vec<HomeSection>,
}

impl Default for HomeLayout {
    fn default() -> Self {
        Self {
            sections: vec![
                HomeSection::NextClass,
                HomeSection::TodayOverview,
                HomeSection::WeekTimeline,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub home_layout: HomeLayout,
    #[serde(default = "yes")]
    pub show_map_links: bool,
    #[serde(default = "yes")]
    pub show_instructor: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            home_layout: HomeLayout::default(),
            show_map_links: true,
            show_instructor: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub id: String,
    pub label: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcuts {
    #[serde(default)]
    pub quick_actions: Vec<Shortcut>,
}

fn yes() -> bool {
    true
}

impl Config {
    /// Builds the configuration written on first start: manual mode in the
    /// given zone, no courses, a 15 minute reminder and a map shortcut.
    pub fn starter(timezone: &str) -> Self {
        Config {
            data_source: DataSource {
                mode: DataSourceMode::Manual,
                manual: Some(ManualSource {
                    timezone: timezone.to_string(),
                }),
                canvas: None,
            },
            profile: Profile {
                student_name: "Student".to_string(),
                school_name: String::new(),
                semester: String::new(),
                week_start: WeekStart::Monday,
            },
            courses: Vec::new(),
            notifications: Notifications {
                enabled: true,
                reminders: vec![Reminder {
                    kind: ReminderKind::BeforeClass,
                    minutes: 15,
                }],
                quiet_hours: QuietHours::default(),
            },
            ui: UiSettings::default(),
            shortcuts: Shortcuts {
                quick_actions: vec![Shortcut {
                    id: "open_next_class_map".to_string(),
                    label: "Open Map".to_string(),
                    action: "map:next".to_string(),
                }],
            },
        }
    }

    /// The zone configured for manual mode, if any.
    pub fn timezone(&self) -> Option<&str> {
        self.data_source
            .manual
            .as_ref()
            .map(|m| m.timezone.as_str())
            .filter(|tz| !tz.trim().is_empty())
    }

    /// Checks the rules serde cannot express. Runs once when a
    /// configuration enters the system, never inside the schedule engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(timezone) = self.timezone() {
            timezone
                .trim()
                .parse::<chrono_tz::Tz>()
                .map_err(|_e| ValidationError::UnknownTimezone(timezone.to_string()))?;
        }
        if let Some(canvas) = &self.data_source.canvas {
            check_url("data_source.canvas.base_url", &canvas.base_url)?;
        }

        let mut seen = HashSet::new();
        for course in &self.courses {
            if course.course_id.trim().is_empty() {
                return Err(ValidationError::Blank {
                    field: "course_id".to_string(),
                });
            }
            if !seen.insert(course.course_id.as_str()) {
                return Err(ValidationError::DuplicateCourseId {
                    course_id: course.course_id.clone(),
                });
            }
            validate_course(course)?;
        }

        Ok(())
    }
}

fn validate_course(course: &Course) -> Result<(), ValidationError> {
    if let Some(join_url) = &course.online.join_url {
        check_url(&format!("{}.online.join_url", course.course_id), join_url)?;
    }
    if let Some(map_url) = course.location_default.as_ref().and_then(|l| l.map_url.as_ref()) {
        check_url(&format!("{}.location_default.map_url", course.course_id), map_url)?;
    }

    for meeting in &course.meetings {
        if meeting.end <= meeting.start {
            return Err(ValidationError::EndNotAfterStart {
                course_id: course.course_id.clone(),
                weekday: meeting.weekday,
                start: meeting.start,
                end: meeting.end,
            });
        }
        if let Some(map_url) = meeting
            .location_override
            .as_ref()
            .and_then(|l| l.map_url.as_ref())
        {
            check_url(&format!("{}.location_override.map_url", course.course_id), map_url)?;
        }
    }

    Ok(())
}

fn check_url(field: &str, value: &str) -> Result<(), ValidationError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        })
}
