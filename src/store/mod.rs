//! Access to the hosted relational data service.
//!
//! Everything above this module talks to a [`DataStore`]; the REST
//! implementation speaks PostgREST, the memory one backs development runs
//! and tests.

pub mod memory;
pub mod rest;

use crate::core::error::StoreError;
use crate::models::account::{Account, ParentRecord, StudentRecord};
use crate::models::attendance::AttendanceRecord;
use crate::models::identity::Role;
use async_trait::async_trait;

pub const ATTENDANCE_TABLE: &str = "attendance";

/// Usable part of a parent-name search: trimmed, with the `*` wildcard
/// removed. `None` when nothing remains, which must match no one.
pub fn name_fragment(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '*').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Row-level predicate applied by the store when reading attendance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceFilter {
    All,
    Student(String),
    Supervisor(String),
}

/// Table-scoped reads and writes against the data service.
///
/// Implementations return attendance most recent first (date descending,
/// then id ascending).
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Rows of a role table whose username equals `username` exactly
    async fn find_by_username(&self, role: Role, username: &str) -> Result<Vec<Account>, StoreError>;

    async fn list_accounts(&self, role: Role) -> Result<Vec<Account>, StoreError>;

    async fn account(&self, role: Role, id: &str) -> Result<Option<Account>, StoreError>;

    async fn count_accounts(&self, role: Role) -> Result<usize, StoreError>;

    /// Inserts the row and returns it with its assigned id
    async fn insert_account(&self, role: Role, account: Account) -> Result<Account, StoreError>;

    /// Overwrites the row with `account.id`. Returns `None` when no row had
    /// that id.
    async fn update_account(&self, role: Role, account: Account) -> Result<Option<Account>, StoreError>;

    /// Returns false when no row had that id
    async fn delete_account(&self, role: Role, id: &str) -> Result<bool, StoreError>;

    async fn parent(&self, id: &str) -> Result<Option<ParentRecord>, StoreError>;

    async fn student(&self, id: &str) -> Result<Option<StudentRecord>, StoreError>;

    /// Students whose `parent_name` contains `fragment`, ignoring case.
    /// A fragment with nothing left after [`name_fragment`] matches no one.
    async fn students_by_parent_name(&self, fragment: &str) -> Result<Vec<StudentRecord>, StoreError>;

    async fn students_by_supervisor(&self, supervisor_id: &str) -> Result<Vec<StudentRecord>, StoreError>;

    async fn attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Inserts the record and returns it with its assigned id
    async fn insert_attendance(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError>;
}
