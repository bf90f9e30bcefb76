//! Fixtures shared by unit tests.
//!
//! The seeded store holds:
//!
//! | id  | table      | username | password  | notes                                  |
//! |-----|------------|----------|-----------|----------------------------------------|
//! | A1  | admin      | root     | rootpw    |                                        |
//! | SV1 | supervisor | msmith   | sv-pw     | supervises S1, S2                      |
//! | SV2 | supervisor | tjones   | sv2-pw    | supervises S3, S4                      |
//! | P1  | parent     | jdoe     | pw1       | linked to S1                           |
//! | P2  | parent     | akim     | pw2       | unlinked, name matches S2 only         |
//! | P3  | parent     | lee      | pw3       | unlinked, name matches S3 and S4       |
//! | P4  | parent     | zed      | pw4       | unlinked, name matches nobody          |
//! | S1  | student    | alice    | alice-pw  | parent_name "John Doe"                 |
//! | S2  | student    | bob      | bob-pw    | parent_name "Mrs Anna Kim"             |
//! | S3  | student    | carl     | carl-pw   | parent_name "Bruce Lee"                |
//! | S4  | student    | dina     | dina-pw   | parent_name "Lee Chen"                 |
//!
//! Attendance: R1 (S1, SV1, 03-01), R2 (S1, SV1, 03-03), R3 (S2, SV1, 03-02),
//! R4 (S3, SV2, 03-03), R5 (S1, SV2, 03-03), all in 2024.

use crate::auth::password::PasswordHasher;
use crate::core::config::{
    BackendConfig, BackendKind, BootstrapConfig, Config, LoggingConfig, ServerConfig, SessionConfig,
};
use crate::core::state::AppState;
use crate::models::account::Account;
use crate::models::attendance::{AttendanceRecord, AttendanceStatus, GradeLevel, StudyType};
use crate::models::identity::{Identity, Principal, Role};
use crate::store::memory::MemoryStore;
use crate::store::DataStore;
use std::sync::Arc;

/// Minimum-cost Argon2 so tests stay fast
pub fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(8, 1, 1).unwrap()
}

/// Account row with a placeholder hash that never verifies
pub fn account(id: &str, username: &str, name: &str) -> Account {
    Account {
        id: id.to_string(),
        username: username.to_string(),
        password_hash: "unset".to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", username),
        gender: None,
        contact: None,
        date_of_birth: None,
        student_id: None,
        grade_level: None,
        room: None,
        stream: None,
        parent_name: None,
        supervisor_id: None,
    }
}

/// Account row whose hash verifies `password`
pub fn credential(id: &str, username: &str, password: &str, name: &str) -> Account {
    let mut row = account(id, username, name);
    row.password_hash = cheap_hasher().hash(password).unwrap();
    row
}

fn student(id: &str, username: &str, password: &str, name: &str, parent: &str, supervisor: &str) -> Account {
    let mut row = credential(id, username, password, name);
    row.grade_level = Some(GradeLevel::Year10);
    row.room = Some("B12".to_string());
    row.stream = Some("A".to_string());
    row.parent_name = Some(parent.to_string());
    row.supervisor_id = Some(supervisor.to_string());
    row
}

pub fn attendance(id: &str, student_id: &str, supervisor_id: &str, date: &str) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        student_id: student_id.to_string(),
        supervisor_id: supervisor_id.to_string(),
        date: date.parse().unwrap(),
        attendance_status: AttendanceStatus::Present,
        study_types: vec![StudyType::Prep1],
        grade_level: GradeLevel::Year10,
        is_late: false,
        is_noise: false,
        is_leave_early: false,
        is_doing_nothing: false,
        absent_reason: None,
        comments: None,
    }
}

pub fn identity(role: Role, id: &str, name: &str) -> Identity {
    Identity::from_role(
        role,
        Principal {
            id: id.to_string(),
            name: name.to_string(),
            username: id.to_lowercase(),
            email: format!("{}@example.com", id.to_lowercase()),
        },
    )
}

pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();

    store.seed_account(Role::Admin, credential("A1", "root", "rootpw", "Head Admin"));

    store.seed_account(Role::Supervisor, credential("SV1", "msmith", "sv-pw", "Mary Smith"));
    store.seed_account(Role::Supervisor, credential("SV2", "tjones", "sv2-pw", "Tom Jones"));

    let mut linked = credential("P1", "jdoe", "pw1", "John Doe");
    linked.student_id = Some("S1".to_string());
    store.seed_account(Role::Parent, linked);
    store.seed_account(Role::Parent, credential("P2", "akim", "pw2", "Anna Kim"));
    store.seed_account(Role::Parent, credential("P3", "lee", "pw3", "Lee"));
    store.seed_account(Role::Parent, credential("P4", "zed", "pw4", "Zed Zulu"));

    store.seed_account(Role::Student, student("S1", "alice", "alice-pw", "Alice", "John Doe", "SV1"));
    store.seed_account(Role::Student, student("S2", "bob", "bob-pw", "Bob", "Mrs Anna Kim", "SV1"));
    store.seed_account(Role::Student, student("S3", "carl", "carl-pw", "Carl", "Bruce Lee", "SV2"));
    store.seed_account(Role::Student, student("S4", "dina", "dina-pw", "Dina", "Lee Chen", "SV2"));

    store.seed_attendance(attendance("R1", "S1", "SV1", "2024-03-01"));
    store.seed_attendance(attendance("R2", "S1", "SV1", "2024-03-03"));
    store.seed_attendance(attendance("R3", "S2", "SV1", "2024-03-02"));
    store.seed_attendance(attendance("R4", "S3", "SV2", "2024-03-03"));
    store.seed_attendance(attendance("R5", "S1", "SV2", "2024-03-03"));

    store
}

/// Memory backend, no retries, short lookups
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            port: 8080,
            num_threads: 1,
        },
        backend: BackendConfig {
            kind: BackendKind::Memory,
            url: String::new(),
            api_key: String::new(),
            request_timeout_secs: 5,
            lookup_timeout_ms: 500,
            lookup_retries: 0,
            retry_backoff_ms: 1,
        },
        session: SessionConfig::default(),
        bootstrap: BootstrapConfig::default(),
        logging: LoggingConfig::default(),
    }
}

pub fn test_state_with(config: Config, store: MemoryStore) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let state = AppState::with_hasher(config, Arc::clone(&store) as Arc<dyn DataStore>, cheap_hasher());
    (state, store)
}

/// State over [`seeded_store`]
pub fn test_state() -> (Arc<AppState>, Arc<MemoryStore>) {
    let (state, store) = test_state_with(test_config(), seeded_store());
    (Arc::new(state), store)
}

/// Status and decoded JSON body of a handler response
pub async fn read_json<T: serde::de::DeserializeOwned>(
    response: axum::response::Response,
) -> (axum::http::StatusCode, T) {
    use http_body_util::BodyExt;

    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (parts.status, serde_json::from_slice(&bytes).unwrap())
}

/// Headers carrying a fresh session token for `identity`
pub fn bearer_for(state: &AppState, identity: Identity) -> axum::http::HeaderMap {
    let session = state.sessions.create(identity);
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {}", session.token).parse().unwrap(),
    );
    headers
}
