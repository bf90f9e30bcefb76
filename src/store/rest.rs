use crate::core::error::StoreError;
use crate::models::account::{Account, ParentRecord, StudentRecord};
use crate::models::attendance::{AttendanceRecord, AttendanceStatus, GradeLevel, StudyType};
use crate::models::identity::Role;
use crate::store::{name_fragment, AttendanceFilter, DataStore, ATTENDANCE_TABLE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

const ATTENDANCE_ORDER: &str = "date.desc,id.asc";

/// Client for a PostgREST-style data service (`{base_url}/rest/v1/{table}`)
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Attendance as stored upstream: a legacy single `study_type` column
/// alongside the nullable `study_types` array.
#[derive(Debug, Serialize, Deserialize)]
struct AttendanceRow {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    student_id: String,
    supervisor_id: String,
    date: NaiveDate,
    attendance_status: AttendanceStatus,
    study_type: StudyType,
    #[serde(default)]
    study_types: Option<Vec<StudyType>>,
    grade_level: GradeLevel,
    #[serde(default)]
    is_late: Option<bool>,
    #[serde(default)]
    is_noise: Option<bool>,
    #[serde(default)]
    is_leave_early: Option<bool>,
    #[serde(default)]
    is_doing_nothing: Option<bool>,
    #[serde(default)]
    absent_reason: Option<String>,
    #[serde(default)]
    comments: Option<String>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let study_types = match row.study_types {
            Some(types) if !types.is_empty() => types,
            _ => vec![row.study_type],
        };

        Self {
            id: row.id,
            student_id: row.student_id,
            supervisor_id: row.supervisor_id,
            date: row.date,
            attendance_status: row.attendance_status,
            study_types,
            grade_level: row.grade_level,
            is_late: row.is_late.unwrap_or(false),
            is_noise: row.is_noise.unwrap_or(false),
            is_leave_early: row.is_leave_early.unwrap_or(false),
            is_doing_nothing: row.is_doing_nothing.unwrap_or(false),
            absent_reason: row.absent_reason,
            comments: row.comments,
        }
    }
}

impl From<AttendanceRecord> for AttendanceRow {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            supervisor_id: record.supervisor_id,
            date: record.date,
            attendance_status: record.attendance_status,
            study_type: record.study_types.first().copied().unwrap_or(StudyType::Prep1),
            study_types: Some(record.study_types),
            grade_level: record.grade_level,
            is_late: Some(record.is_late),
            is_noise: Some(record.is_noise),
            is_leave_early: Some(record.is_leave_early),
            is_doing_nothing: Some(record.is_doing_nothing),
            absent_reason: record.absent_reason,
            comments: record.comments,
        }
    }
}

/// PostgREST equality predicate
fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// PostgREST case-insensitive containment predicate. `*` is the
/// wildcard and is removed; the LIKE metacharacters `\`, `%` and `_` are
/// escaped so they match literally. `None` when nothing is left to match.
fn ilike_contains(fragment: &str) -> Option<String> {
    let fragment = name_fragment(fragment)?;
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Some(format!("ilike.*{}*", escaped))
}

fn attendance_query(filter: &AttendanceFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "*".to_string()), ("order", ATTENDANCE_ORDER.to_string())];
    match filter {
        AttendanceFilter::All => {}
        AttendanceFilter::Student(id) => query.push(("student_id", eq(id))),
        AttendanceFilter::Supervisor(id) => query.push(("supervisor_id", eq(id))),
    }
    query
}

impl RestStore {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, table: &str, request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        let response = request.send().await.map_err(|e| StoreError::Request {
            table: table.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(table.to_string()));
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                table: table.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Vec<T>>().await.map_err(|e| StoreError::Decode {
            table: table.to_string(),
            reason: e.to_string(),
        })
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>, StoreError> {
        let request = self.request(Method::GET, table).query(query);
        self.send(table, request).await
    }

    /// PATCH the rows matching `query` and return the first updated row
    async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<Option<T>, StoreError> {
        let request = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(query)
            .json(body);

        Ok(self.send::<T>(table, request).await?.into_iter().next())
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T, StoreError> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&[body]);

        self.send::<T>(table, request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode {
                table: table.to_string(),
                reason: "insert returned no rows".to_string(),
            })
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn find_by_username(&self, role: Role, username: &str) -> Result<Vec<Account>, StoreError> {
        self.select(role.table(), &[("select", "*".to_string()), ("username", eq(username))])
            .await
    }

    async fn list_accounts(&self, role: Role) -> Result<Vec<Account>, StoreError> {
        self.select(role.table(), &[("select", "*".to_string()), ("order", "name.asc,id.asc".to_string())])
            .await
    }

    async fn account(&self, role: Role, id: &str) -> Result<Option<Account>, StoreError> {
        let rows: Vec<Account> = self
            .select(role.table(), &[("select", "*".to_string()), ("id", eq(id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn count_accounts(&self, role: Role) -> Result<usize, StoreError> {
        let rows: Vec<serde_json::Value> = self.select(role.table(), &[("select", "id".to_string())]).await?;
        Ok(rows.len())
    }

    async fn insert_account(&self, role: Role, account: Account) -> Result<Account, StoreError> {
        self.insert(role.table(), &account).await
    }

    async fn update_account(&self, role: Role, mut account: Account) -> Result<Option<Account>, StoreError> {
        let id = std::mem::take(&mut account.id);
        self.update(role.table(), &[("id", eq(&id))], &account).await
    }

    async fn delete_account(&self, role: Role, id: &str) -> Result<bool, StoreError> {
        let request = self
            .request(Method::DELETE, role.table())
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id))]);

        let deleted: Vec<serde_json::Value> = self.send(role.table(), request).await?;
        Ok(!deleted.is_empty())
    }

    async fn parent(&self, id: &str) -> Result<Option<ParentRecord>, StoreError> {
        let rows: Vec<ParentRecord> = self
            .select(
                Role::Parent.table(),
                &[("select", "id,name,student_id".to_string()), ("id", eq(id))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn student(&self, id: &str) -> Result<Option<StudentRecord>, StoreError> {
        let rows: Vec<Account> = self
            .select(Role::Student.table(), &[("select", "*".to_string()), ("id", eq(id))])
            .await?;
        Ok(rows.first().map(Account::to_student))
    }

    async fn students_by_parent_name(&self, fragment: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let Some(pattern) = ilike_contains(fragment) else {
            return Ok(Vec::new());
        };
        let rows: Vec<Account> = self
            .select(
                Role::Student.table(),
                &[("select", "*".to_string()), ("parent_name", pattern)],
            )
            .await?;
        Ok(rows.iter().map(Account::to_student).collect())
    }

    async fn students_by_supervisor(&self, supervisor_id: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let rows: Vec<Account> = self
            .select(
                Role::Student.table(),
                &[
                    ("select", "*".to_string()),
                    ("supervisor_id", eq(supervisor_id)),
                    ("order", "name.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(Account::to_student).collect())
    }

    async fn attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows: Vec<AttendanceRow> = self.select(ATTENDANCE_TABLE, &attendance_query(filter)).await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn insert_attendance(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let row = AttendanceRow::from(record);
        let created: AttendanceRow = self.insert(ATTENDANCE_TABLE, &row).await?;
        Ok(created.into())
    }
}
