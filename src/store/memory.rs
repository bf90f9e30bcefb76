use crate::core::error::StoreError;
use crate::models::account::{Account, ParentRecord, StudentRecord};
use crate::models::attendance::{sort_newest_first, AttendanceRecord};
use crate::models::identity::Role;
use crate::store::{name_fragment, AttendanceFilter, DataStore, ATTENDANCE_TABLE};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::time::Duration;

/// In-process data store.
///
/// Used when `backend.kind = "memory"` and throughout the tests. Individual
/// tables can be made to fail or to respond slowly.
pub struct MemoryStore {
    accounts: DashMap<Role, Vec<Account>>,
    attendance: DashMap<String, AttendanceRecord>,
    failing: DashSet<String>,
    latency: DashMap<String, Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            attendance: DashMap::new(),
            failing: DashSet::new(),
            latency: DashMap::new(),
        }
    }

    /// Add a row without any uniqueness checks. Assigns an id if empty.
    pub fn seed_account(&self, role: Role, mut account: Account) -> Account {
        if account.id.is_empty() {
            account.id = uuid::Uuid::new_v4().to_string();
        }
        self.accounts.entry(role).or_default().push(account.clone());
        account
    }

    pub fn seed_attendance(&self, mut record: AttendanceRecord) -> AttendanceRecord {
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
        }
        self.attendance.insert(record.id.clone(), record.clone());
        record
    }

    /// Every subsequent call touching `table` fails with `Unavailable`
    pub fn fail_table(&self, table: &str) {
        self.failing.insert(table.to_string());
    }

    pub fn restore_table(&self, table: &str) {
        self.failing.remove(table);
    }

    /// Every subsequent call touching `table` sleeps first
    pub fn set_latency(&self, table: &str, delay: Duration) {
        self.latency.insert(table.to_string(), delay);
    }

    pub fn attendance_len(&self) -> usize {
        self.attendance.len()
    }

    async fn touch(&self, table: &str) -> Result<(), StoreError> {
        let delay = self.latency.get(table).map(|d| *d.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(table) {
            return Err(StoreError::Unavailable(table.to_string()));
        }
        Ok(())
    }

    fn rows(&self, role: Role) -> Vec<Account> {
        self.accounts
            .get(&role)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn find_by_username(&self, role: Role, username: &str) -> Result<Vec<Account>, StoreError> {
        self.touch(role.table()).await?;
        Ok(self
            .rows(role)
            .into_iter()
            .filter(|a| a.username == username)
            .collect())
    }

    async fn list_accounts(&self, role: Role) -> Result<Vec<Account>, StoreError> {
        self.touch(role.table()).await?;
        let mut rows = self.rows(role);
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn account(&self, role: Role, id: &str) -> Result<Option<Account>, StoreError> {
        self.touch(role.table()).await?;
        Ok(self.rows(role).into_iter().find(|a| a.id == id))
    }

    async fn count_accounts(&self, role: Role) -> Result<usize, StoreError> {
        self.touch(role.table()).await?;
        Ok(self.accounts.get(&role).map(|rows| rows.len()).unwrap_or(0))
    }

    async fn update_account(&self, role: Role, account: Account) -> Result<Option<Account>, StoreError> {
        self.touch(role.table()).await?;
        let Some(mut rows) = self.accounts.get_mut(&role) else {
            return Ok(None);
        };
        if rows
            .iter()
            .any(|a| a.id != account.id && a.username == account.username)
        {
            return Err(StoreError::Conflict(role.table().to_string()));
        }
        match rows.iter_mut().find(|a| a.id == account.id) {
            Some(row) => {
                *row = account.clone();
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    async fn insert_account(&self, role: Role, account: Account) -> Result<Account, StoreError> {
        self.touch(role.table()).await?;
        if self.rows(role).iter().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(role.table().to_string()));
        }
        Ok(self.seed_account(role, account))
    }

    async fn delete_account(&self, role: Role, id: &str) -> Result<bool, StoreError> {
        self.touch(role.table()).await?;
        let mut removed = false;
        if let Some(mut rows) = self.accounts.get_mut(&role) {
            let before = rows.len();
            rows.retain(|a| a.id != id);
            removed = rows.len() != before;
        }
        Ok(removed)
    }

    async fn parent(&self, id: &str) -> Result<Option<ParentRecord>, StoreError> {
        self.touch(Role::Parent.table()).await?;
        Ok(self
            .rows(Role::Parent)
            .iter()
            .find(|a| a.id == id)
            .map(Account::to_parent))
    }

    async fn student(&self, id: &str) -> Result<Option<StudentRecord>, StoreError> {
        self.touch(Role::Student.table()).await?;
        Ok(self
            .rows(Role::Student)
            .iter()
            .find(|a| a.id == id)
            .map(Account::to_student))
    }

    async fn students_by_parent_name(&self, fragment: &str) -> Result<Vec<StudentRecord>, StoreError> {
        self.touch(Role::Student.table()).await?;
        let Some(needle) = name_fragment(fragment).map(|f| f.to_lowercase()) else {
            return Ok(Vec::new());
        };
        Ok(self
            .rows(Role::Student)
            .iter()
            .filter(|a| {
                a.parent_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .map(Account::to_student)
            .collect())
    }

    async fn students_by_supervisor(&self, supervisor_id: &str) -> Result<Vec<StudentRecord>, StoreError> {
        self.touch(Role::Student.table()).await?;
        let mut students: Vec<StudentRecord> = self
            .rows(Role::Student)
            .iter()
            .filter(|a| a.supervisor_id.as_deref() == Some(supervisor_id))
            .map(Account::to_student)
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.touch(ATTENDANCE_TABLE).await?;
        let mut records: Vec<AttendanceRecord> = self
            .attendance
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|r| match filter {
                AttendanceFilter::All => true,
                AttendanceFilter::Student(id) => &r.student_id == id,
                AttendanceFilter::Supervisor(id) => &r.supervisor_id == id,
            })
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn insert_attendance(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        self.touch(ATTENDANCE_TABLE).await?;
        Ok(self.seed_attendance(record))
    }
}
