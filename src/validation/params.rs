use crate::core::error::ValidationError;
use crate::models::account::{AccountUpdate, NewAccount};
use crate::models::identity::Role;
use chrono::NaiveDate;

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat(format!("date must be YYYY-MM-DD, got {:?}", value))
    })
}

/// Trimmed value, or `MissingField` if blank
pub fn require(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trimmed value with blanks collapsed to `None`
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if !email.contains('@') {
        return Err(ValidationError::InvalidFormat(format!(
            "email {:?} is not an address",
            email
        )));
    }
    Ok(())
}

fn check_stream(stream: &str) -> Result<(), ValidationError> {
    match stream {
        "A" | "B" | "C" | "D" => Ok(()),
        other => Err(ValidationError::InvalidFormat(format!(
            "stream must be one of A, B, C, D, got {:?}",
            other
        ))),
    }
}

/// Checks the fields each role table declares non-null
pub fn validate_new_account(role: Role, account: &NewAccount) -> Result<(), ValidationError> {
    require("username", &account.username)?;
    require("name", &account.name)?;
    check_email(&require("email", &account.email)?)?;

    // Passwords are not trimmed, only checked for presence
    if account.password.is_empty() {
        return Err(ValidationError::MissingField("password".to_string()));
    }

    if role != Role::Student && account.gender.is_none() {
        return Err(ValidationError::MissingField("gender".to_string()));
    }

    match role {
        Role::Supervisor => {
            if optional(account.room.as_deref()).is_none() {
                return Err(ValidationError::MissingField("room".to_string()));
            }
        }
        Role::Student => {
            if account.grade_level.is_none() {
                return Err(ValidationError::MissingField("grade_level".to_string()));
            }
            if optional(account.room.as_deref()).is_none() {
                return Err(ValidationError::MissingField("room".to_string()));
            }
            match optional(account.stream.as_deref()) {
                Some(stream) => check_stream(&stream)?,
                None => return Err(ValidationError::MissingField("stream".to_string())),
            }
        }
        Role::Admin | Role::Parent => {}
    }

    Ok(())
}

/// Checks the fields an edit supplies. Non-null columns may be left out
/// but not blanked.
pub fn validate_update(role: Role, update: &AccountUpdate) -> Result<(), ValidationError> {
    if let Some(username) = &update.username {
        require("username", username)?;
    }
    if let Some(name) = &update.name {
        require("name", name)?;
    }
    if let Some(email) = &update.email {
        check_email(&require("email", email)?)?;
    }
    if update.password.as_deref() == Some("") {
        return Err(ValidationError::MissingField("password".to_string()));
    }
    if matches!(role, Role::Supervisor | Role::Student) {
        if let Some(room) = &update.room {
            require("room", room)?;
        }
    }
    if role == Role::Student {
        if let Some(stream) = &update.stream {
            check_stream(&require("stream", stream)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::Gender;
    use crate::models::attendance::GradeLevel;

    fn new_account() -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            password: "pw".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            gender: Some(Gender::Female),
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

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("01/03/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_require_trims() {
        assert_eq!(require("name", "  Alice ").unwrap(), "Alice");
        assert!(matches!(
            require("name", "   "),
            Err(ValidationError::MissingField(f)) if f == "name"
        ));
    }

    #[test]
    fn test_optional_collapses_blank() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" x ")), Some("x".to_string()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn test_admin_and_parent_need_only_common_fields() {
        assert!(validate_new_account(Role::Admin, &new_account()).is_ok());
        assert!(validate_new_account(Role::Parent, &new_account()).is_ok());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut account = new_account();
        account.email = "not-an-email".to_string();
        assert!(validate_new_account(Role::Admin, &account).is_err());
    }

    #[test]
    fn test_supervisor_needs_room() {
        let mut account = new_account();
        assert!(validate_new_account(Role::Supervisor, &account).is_err());
        account.room = Some("Block C".to_string());
        assert!(validate_new_account(Role::Supervisor, &account).is_ok());
    }

    #[test]
    fn test_student_needs_grade_room_and_stream() {
        let mut account = new_account();
        account.grade_level = Some(GradeLevel::Year10);
        account.room = Some("B12".to_string());
        assert!(validate_new_account(Role::Student, &account).is_err());

        account.stream = Some("E".to_string());
        assert!(validate_new_account(Role::Student, &account).is_err());

        account.stream = Some("B".to_string());
        assert!(validate_new_account(Role::Student, &account).is_ok());
    }

    #[test]
    fn test_gender_required_except_for_students() {
        let mut account = new_account();
        account.gender = None;
        for role in [Role::Admin, Role::Parent, Role::Supervisor] {
            assert!(matches!(
                validate_new_account(role, &account),
                Err(ValidationError::MissingField(f)) if f == "gender"
            ));
        }

        account.grade_level = Some(GradeLevel::Year9);
        account.room = Some("B12".to_string());
        account.stream = Some("A".to_string());
        assert!(validate_new_account(Role::Student, &account).is_ok());
    }

    #[test]
    fn test_update_accepts_partial_edits() {
        let update = AccountUpdate {
            name: Some("Alice B".to_string()),
            ..Default::default()
        };
        assert!(validate_update(Role::Student, &update).is_ok());
        assert!(validate_update(Role::Admin, &AccountUpdate::default()).is_ok());
    }

    #[test]
    fn test_update_rejects_blanked_fields() {
        let blank_name = AccountUpdate {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_update(Role::Parent, &blank_name).is_err());

        let empty_password = AccountUpdate {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_update(Role::Admin, &empty_password).is_err());

        let bad_email = AccountUpdate {
            email: Some("nowhere".to_string()),
            ..Default::default()
        };
        assert!(validate_update(Role::Supervisor, &bad_email).is_err());

        let bad_stream = AccountUpdate {
            stream: Some("Z".to_string()),
            ..Default::default()
        };
        assert!(validate_update(Role::Student, &bad_stream).is_err());
        // Stream is not a parent column, so it is ignored there
        assert!(validate_update(Role::Parent, &bad_stream).is_ok());
    }
}
