use crate::core::error::{RecordError, ValidationError};
use crate::models::account::StudentRecord;
use crate::models::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, StudyType};
use crate::models::identity::{Identity, Role};
use crate::store::DataStore;
use crate::validation::params::{optional, parse_date, require};
use tracing::{info, warn};

/// Students assigned to the supervisor behind `identity`
pub async fn students_for(store: &dyn DataStore, identity: &Identity) -> Result<Vec<StudentRecord>, RecordError> {
    let Identity::Supervisor(supervisor) = identity else {
        return Err(RecordError::Forbidden("view assigned students"));
    };
    Ok(store.students_by_supervisor(&supervisor.id).await?)
}

/// Students assigned to `supervisor_id`. Administrators may look at any
/// supervisor; a supervisor only at their own list.
pub async fn roster(
    store: &dyn DataStore,
    identity: &Identity,
    supervisor_id: &str,
) -> Result<Vec<StudentRecord>, RecordError> {
    match identity {
        Identity::Admin(_) => {
            if store.account(Role::Supervisor, supervisor_id).await?.is_none() {
                return Err(RecordError::SupervisorNotFound(supervisor_id.to_string()));
            }
        }
        Identity::Supervisor(supervisor) if supervisor.id == supervisor_id => {}
        Identity::Supervisor(supervisor) => {
            warn!(
                supervisor_id = %supervisor.id,
                requested = %supervisor_id,
                "Supervisor asked for another supervisor's students"
            );
            return Err(RecordError::OtherRoster);
        }
        _ => return Err(RecordError::Forbidden("view assigned students")),
    }
    Ok(store.students_by_supervisor(supervisor_id).await?)
}

/// Records one attendance row on behalf of a supervisor.
///
/// The row is always owned by the calling supervisor, and the student must
/// be assigned to them.
pub async fn record(
    store: &dyn DataStore,
    identity: &Identity,
    submission: NewAttendance,
) -> Result<AttendanceRecord, RecordError> {
    let Identity::Supervisor(supervisor) = identity else {
        return Err(RecordError::Forbidden("record attendance"));
    };

    let student_id = require("student_id", &submission.student_id)?;
    let date = parse_date(&submission.date)?;

    let student = store
        .student(&student_id)
        .await?
        .ok_or_else(|| RecordError::StudentNotFound(student_id.clone()))?;

    if student.supervisor_id.as_deref() != Some(supervisor.id.as_str()) {
        warn!(
            supervisor_id = %supervisor.id,
            student_id = %student_id,
            "Attendance submission for unassigned student"
        );
        return Err(RecordError::NotAssigned(student_id));
    }

    let grade_level = submission
        .grade_level
        .or(student.grade_level)
        .ok_or_else(|| ValidationError::MissingField("grade_level".to_string()))?;

    let absent_reason = match submission.attendance_status {
        AttendanceStatus::Present => None,
        AttendanceStatus::Absent => optional(submission.absent_reason.as_deref()),
    };

    let record = AttendanceRecord {
        id: String::new(),
        student_id,
        supervisor_id: supervisor.id.clone(),
        date,
        attendance_status: submission.attendance_status,
        study_types: dedup_study_types(submission.study_types),
        grade_level,
        is_late: submission.is_late,
        is_noise: submission.is_noise,
        is_leave_early: submission.is_leave_early,
        is_doing_nothing: submission.is_doing_nothing,
        absent_reason,
        comments: optional(submission.comments.as_deref()),
    };

    let created = store.insert_attendance(record).await?;

    info!(
        record_id = %created.id,
        supervisor_id = %created.supervisor_id,
        student_id = %created.student_id,
        date = %created.date,
        status = ?created.attendance_status,
        "Attendance recorded"
    );

    Ok(created)
}

/// Keeps first occurrences in order; an empty selection means first prep
fn dedup_study_types(types: Vec<StudyType>) -> Vec<StudyType> {
    let mut out: Vec<StudyType> = Vec::with_capacity(types.len());
    for t in types {
        if !out.contains(&t) {
            out.push(t);
        }
    }
    if out.is_empty() {
        out.push(StudyType::Prep1);
    }
    out
}
