use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// Supervised study sessions an attendance row can cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyType {
    #[serde(rename = "Prep1 19:10-20:00")]
    Prep1,
    #[serde(rename = "Prep2 21:10-22:00")]
    Prep2,
    #[serde(rename = "Saturday Study Time")]
    Saturday,
    #[serde(rename = "Sunday Study Time")]
    Sunday,
    #[serde(rename = "Extra/Special Study Time")]
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "Year 9")]
    Year9,
    #[serde(rename = "Year 10")]
    Year10,
    #[serde(rename = "Year 11")]
    Year11,
    #[serde(rename = "Year 12")]
    Year12,
    #[serde(rename = "Year 13")]
    Year13,
}

/// One attendance row, owned by the supervisor who recorded it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub supervisor_id: String,
    pub date: NaiveDate,
    pub attendance_status: AttendanceStatus,
    pub study_types: Vec<StudyType>,
    pub grade_level: GradeLevel,
    #[serde(default)]
    pub is_late: bool,
    #[serde(default)]
    pub is_noise: bool,
    #[serde(default)]
    pub is_leave_early: bool,
    #[serde(default)]
    pub is_doing_nothing: bool,
    #[serde(default)]
    pub absent_reason: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Most recent first; same-date rows fall back to ascending id.
pub fn newest_first(a: &AttendanceRecord, b: &AttendanceRecord) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_newest_first(records: &mut [AttendanceRecord]) {
    records.sort_by(newest_first);
}

/// Attendance submission from a supervisor, before it has an id or owner
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub student_id: String,
    pub attendance_status: AttendanceStatus,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub study_types: Vec<StudyType>,
    #[serde(default)]
    pub grade_level: Option<GradeLevel>,
    #[serde(default)]
    pub is_late: bool,
    #[serde(default)]
    pub is_noise: bool,
    #[serde(default)]
    pub is_leave_early: bool,
    #[serde(default)]
    pub is_doing_nothing: bool,
    #[serde(default)]
    pub absent_reason: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}
