use crate::models::attendance::GradeLevel;
use crate::models::identity::Principal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// A row in one of the four role tables.
///
/// Role-specific columns are optional here; which of them a row carries
/// depends on the table it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub username: String,
    /// Argon2 PHC string, kept in the tables' `password` column
    #[serde(rename = "password")]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    /// Admins, supervisors and parents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Supervisors and parents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Supervisors and students
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    /// Parents: linked child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    /// Students: assigned supervisor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<String>,
}

impl Account {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }

    pub fn to_parent(&self) -> ParentRecord {
        ParentRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            student_id: self.student_id.clone(),
        }
    }

    pub fn to_student(&self) -> StudentRecord {
        StudentRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            grade_level: self.grade_level,
            room: self.room.clone(),
            stream: self.stream.clone(),
            parent_name: self.parent_name.clone(),
            supervisor_id: self.supervisor_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub grade_level: Option<GradeLevel>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

/// Account as shown to administrators: everything except the hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<String>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            name: account.name,
            email: account.email,
            gender: account.gender,
            contact: account.contact,
            date_of_birth: account.date_of_birth,
            student_id: account.student_id,
            grade_level: account.grade_level,
            room: account.room,
            stream: account.stream,
            parent_name: account.parent_name,
            supervisor_id: account.supervisor_id,
        }
    }
}

/// Account creation request. The password arrives in plaintext and is
/// hashed before it reaches the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub grade_level: Option<GradeLevel>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

/// Partial edit of an existing account. Absent fields keep their value;
/// fields that do not belong to the target table are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    /// Plaintext, hashed before storage
    pub password: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub contact: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub student_id: Option<String>,
    pub grade_level: Option<GradeLevel>,
    pub room: Option<String>,
    pub stream: Option<String>,
    pub parent_name: Option<String>,
    pub supervisor_id: Option<String>,
}

/// Row count of each role table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub admin: usize,
    pub supervisor: usize,
    pub parent: usize,
    pub student: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_drops_password_hash() {
        let account = Account {
            id: "S1".to_string(),
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            gender: None,
            contact: None,
            date_of_birth: NaiveDate::from_ymd_opt(2008, 5, 17),
            student_id: None,
            grade_level: Some(GradeLevel::Year11),
            room: Some("B12".to_string()),
            stream: Some("A".to_string()),
            parent_name: Some("John Doe".to_string()),
            supervisor_id: Some("SV1".to_string()),
        };

        let json = serde_json::to_string(&AccountSummary::from(account)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"room\":\"B12\""));
        assert!(json.contains("\"date_of_birth\":\"2008-05-17\""));
    }

    #[test]
    fn test_account_insert_body_omits_empty_id() {
        let account = Account {
            id: String::new(),
            username: "root".to_string(),
            password_hash: "h".to_string(),
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            gender: Some(Gender::Female),
            contact: None,
            date_of_birth: None,
            student_id: None,
            grade_level: None,
            room: None,
            stream: None,
            parent_name: None,
            supervisor_id: None,
        };

        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("student_id").is_none());
        assert_eq!(json["password"], "h");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["gender"], "Female");
        assert!(json.get("contact").is_none());
    }
}
