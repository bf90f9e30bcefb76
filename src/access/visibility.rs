use crate::core::error::VisibilityError;
use crate::models::attendance::{sort_newest_first, AttendanceRecord};
use crate::models::identity::Identity;
use crate::store::{name_fragment, AttendanceFilter, DataStore};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Decides which attendance rows an identity may read.
///
/// Failures never widen access: any store error yields an empty result.
pub struct VisibilityFilter {
    store: Arc<dyn DataStore>,
}

impl VisibilityFilter {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Attendance visible to `identity`, most recent first
    pub async fn visible_records(&self, identity: &Identity) -> Vec<AttendanceRecord> {
        match self.try_visible_records(identity).await {
            Ok(records) => {
                debug!(
                    user_id = %identity.id(),
                    role = %identity.role(),
                    records = records.len(),
                    "Attendance records visible"
                );
                records
            }
            Err(e) => {
                error!(
                    user_id = %identity.id(),
                    role = %identity.role(),
                    error = %e,
                    "Attendance visibility query failed, returning no records"
                );
                Vec::new()
            }
        }
    }

    async fn try_visible_records(&self, identity: &Identity) -> Result<Vec<AttendanceRecord>, VisibilityError> {
        let Some(filter) = self.scope(identity).await? else {
            return Ok(Vec::new());
        };

        let mut records = self.store.attendance(&filter).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// The store predicate for `identity`, or `None` when nothing is visible
    async fn scope(&self, identity: &Identity) -> Result<Option<AttendanceFilter>, VisibilityError> {
        let filter = match identity {
            Identity::Admin(_) => Some(AttendanceFilter::All),
            Identity::Supervisor(p) => Some(AttendanceFilter::Supervisor(p.id.clone())),
            Identity::Student(p) => Some(AttendanceFilter::Student(p.id.clone())),
            Identity::Parent(p) => self.child_of(&p.id, &p.name).await?.map(AttendanceFilter::Student),
        };
        Ok(filter)
    }

    /// Linked child first; otherwise a unique case-insensitive match of the
    /// parent's name inside some student's `parent_name`.
    async fn child_of(&self, parent_id: &str, parent_name: &str) -> Result<Option<String>, VisibilityError> {
        let Some(parent) = self.store.parent(parent_id).await? else {
            info!(parent_id = %parent_id, "Parent record not found");
            return Ok(None);
        };

        if let Some(student_id) = parent.student_id.filter(|id| !id.is_empty()) {
            return Ok(Some(student_id));
        }

        let Some(name) = name_fragment(parent_name) else {
            info!(parent_id = %parent_id, "Parent not linked and has no name to match");
            return Ok(None);
        };

        let candidates = self.store.students_by_parent_name(&name).await?;
        match candidates.as_slice() {
            [student] => {
                info!(
                    parent_id = %parent_id,
                    student_id = %student.id,
                    "Parent matched to student by name"
                );
                Ok(Some(student.id.clone()))
            }
            [] => {
                info!(parent_id = %parent_id, "Parent not linked to any student");
                Ok(None)
            }
            several => {
                info!(
                    parent_id = %parent_id,
                    candidates = several.len(),
                    "Parent name matches several students, showing nothing"
                );
                Ok(None)
            }
        }
    }
}
