//! Account administration over the four role tables.
//!
//! Usernames are unique across all role tables: a name already used in any
//! of them is rejected at write time, so logins never rely on probe order
//! to disambiguate accounts created here.

use crate::auth::password::PasswordHasher;
use crate::core::error::{AccountError, StoreError, ValidationError};
use crate::models::account::{Account, AccountSummary, AccountUpdate, NewAccount, UserCounts};
use crate::models::identity::{Identity, Role, PROBE_ORDER};
use crate::store::DataStore;
use crate::validation::params::{optional, validate_new_account, validate_update};
use tracing::{info, warn};

fn require_admin(identity: &Identity) -> Result<(), AccountError> {
    match identity {
        Identity::Admin(_) => Ok(()),
        _ => {
            warn!(
                user_id = %identity.id(),
                role = %identity.role(),
                "Account administration attempted by non-admin"
            );
            Err(AccountError::Forbidden)
        }
    }
}

/// Role tables that already hold `username`
pub async fn username_owners(store: &dyn DataStore, username: &str) -> Result<Vec<Role>, StoreError> {
    let mut owners = Vec::new();
    for role in PROBE_ORDER {
        if !store.find_by_username(role, username).await?.is_empty() {
            owners.push(role);
        }
    }
    Ok(owners)
}

pub async fn list(store: &dyn DataStore, identity: &Identity, role: Role) -> Result<Vec<AccountSummary>, AccountError> {
    require_admin(identity)?;
    let accounts = store.list_accounts(role).await?;
    Ok(accounts.into_iter().map(AccountSummary::from).collect())
}

pub async fn create(
    store: &dyn DataStore,
    hasher: &PasswordHasher,
    identity: &Identity,
    role: Role,
    new: NewAccount,
) -> Result<AccountSummary, AccountError> {
    require_admin(identity)?;
    let created = insert_account(store, hasher, role, new).await?;

    info!(
        created_by = %identity.id(),
        role = %role,
        account_id = %created.id,
        username = %created.username,
        "Account created"
    );

    Ok(created.into())
}

/// Whether rows of the `role` table carry the optional `column`
fn has_column(role: Role, column: &str) -> bool {
    match column {
        "gender" => role != Role::Student,
        "contact" => matches!(role, Role::Supervisor | Role::Parent),
        "date_of_birth" | "room" => matches!(role, Role::Supervisor | Role::Student),
        "student_id" => role == Role::Parent,
        "grade_level" | "stream" | "parent_name" | "supervisor_id" => role == Role::Student,
        _ => false,
    }
}

/// A parent's child and a student's supervisor must exist
async fn check_links(store: &dyn DataStore, account: &Account) -> Result<(), AccountError> {
    if let Some(student_id) = &account.student_id {
        if store.student(student_id).await?.is_none() {
            return Err(AccountError::Invalid(ValidationError::InvalidFormat(format!(
                "student {} does not exist",
                student_id
            ))));
        }
    }
    if let Some(supervisor_id) = &account.supervisor_id {
        if store.account(Role::Supervisor, supervisor_id).await?.is_none() {
            return Err(AccountError::Invalid(ValidationError::InvalidFormat(format!(
                "supervisor {} does not exist",
                supervisor_id
            ))));
        }
    }
    Ok(())
}

async fn ensure_username_free(store: &dyn DataStore, username: &str) -> Result<(), AccountError> {
    let owners = username_owners(store, username).await?;
    if !owners.is_empty() {
        info!(username = %username, owners = ?owners, "Username already taken");
        return Err(AccountError::UsernameTaken(username.to_string()));
    }
    Ok(())
}

/// Validates, checks global username uniqueness, hashes and inserts.
/// Shared by the admin endpoint and the startup bootstrap.
///
/// The check and the insert are separate requests; callers serialize
/// writers with `AppState::account_writes`.
pub async fn insert_account(
    store: &dyn DataStore,
    hasher: &PasswordHasher,
    role: Role,
    new: NewAccount,
) -> Result<Account, AccountError> {
    validate_new_account(role, &new)?;

    let username = new.username.trim().to_string();
    ensure_username_free(store, &username).await?;

    let password_hash = hasher
        .hash(&new.password)
        .map_err(|e| AccountError::Hash(e.to_string()))?;

    let account = Account {
        id: String::new(),
        username,
        password_hash,
        name: new.name.trim().to_string(),
        email: new.email.trim().to_string(),
        gender: new.gender.filter(|_| has_column(role, "gender")),
        contact: optional(new.contact.as_deref()).filter(|_| has_column(role, "contact")),
        date_of_birth: new.date_of_birth.filter(|_| has_column(role, "date_of_birth")),
        student_id: optional(new.student_id.as_deref()).filter(|_| has_column(role, "student_id")),
        grade_level: new.grade_level.filter(|_| has_column(role, "grade_level")),
        room: optional(new.room.as_deref()).filter(|_| has_column(role, "room")),
        stream: optional(new.stream.as_deref()).filter(|_| has_column(role, "stream")),
        parent_name: optional(new.parent_name.as_deref()).filter(|_| has_column(role, "parent_name")),
        supervisor_id: optional(new.supervisor_id.as_deref()).filter(|_| has_column(role, "supervisor_id")),
    };
    check_links(store, &account).await?;

    match store.insert_account(role, account).await {
        Ok(created) => Ok(created),
        Err(StoreError::Conflict(_)) => Err(AccountError::UsernameTaken(new.username.trim().to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Applies the supplied fields to an existing account. A new password is
/// hashed; a new username must be free in every role table.
pub async fn update(
    store: &dyn DataStore,
    hasher: &PasswordHasher,
    identity: &Identity,
    role: Role,
    id: &str,
    changes: AccountUpdate,
) -> Result<AccountSummary, AccountError> {
    require_admin(identity)?;
    validate_update(role, &changes)?;

    let Some(mut account) = store.account(role, id).await? else {
        return Err(AccountError::NotFound(format!("{} {}", role, id)));
    };

    if let Some(username) = changes.username.as_deref().map(str::trim) {
        if username != account.username {
            ensure_username_free(store, username).await?;
            account.username = username.to_string();
        }
    }

    let password_changed = changes.password.is_some();
    if let Some(password) = &changes.password {
        account.password_hash = hasher
            .hash(password)
            .map_err(|e| AccountError::Hash(e.to_string()))?;
    }

    if let Some(name) = &changes.name {
        account.name = name.trim().to_string();
    }
    if let Some(email) = &changes.email {
        account.email = email.trim().to_string();
    }
    if has_column(role, "gender") && changes.gender.is_some() {
        account.gender = changes.gender;
    }
    if has_column(role, "contact") {
        if let Some(contact) = optional(changes.contact.as_deref()) {
            account.contact = Some(contact);
        }
    }
    if has_column(role, "date_of_birth") && changes.date_of_birth.is_some() {
        account.date_of_birth = changes.date_of_birth;
    }
    if has_column(role, "student_id") {
        if let Some(student_id) = optional(changes.student_id.as_deref()) {
            account.student_id = Some(student_id);
        }
    }
    if has_column(role, "grade_level") && changes.grade_level.is_some() {
        account.grade_level = changes.grade_level;
    }
    if has_column(role, "room") {
        if let Some(room) = optional(changes.room.as_deref()) {
            account.room = Some(room);
        }
    }
    if has_column(role, "stream") {
        if let Some(stream) = optional(changes.stream.as_deref()) {
            account.stream = Some(stream);
        }
    }
    if has_column(role, "parent_name") {
        if let Some(parent_name) = optional(changes.parent_name.as_deref()) {
            account.parent_name = Some(parent_name);
        }
    }
    if has_column(role, "supervisor_id") {
        if let Some(supervisor_id) = optional(changes.supervisor_id.as_deref()) {
            account.supervisor_id = Some(supervisor_id);
        }
    }
    check_links(store, &account).await?;

    let username = account.username.clone();
    let updated = match store.update_account(role, account).await {
        Ok(Some(updated)) => updated,
        Ok(None) => return Err(AccountError::NotFound(format!("{} {}", role, id))),
        Err(StoreError::Conflict(_)) => return Err(AccountError::UsernameTaken(username)),
        Err(e) => return Err(e.into()),
    };

    info!(
        updated_by = %identity.id(),
        role = %role,
        account_id = %id,
        password_changed,
        "Account updated"
    );

    Ok(updated.into())
}

/// Number of accounts in each role table
pub async fn overview(store: &dyn DataStore, identity: &Identity) -> Result<UserCounts, AccountError> {
    require_admin(identity)?;
    Ok(UserCounts {
        admin: store.count_accounts(Role::Admin).await?,
        supervisor: store.count_accounts(Role::Supervisor).await?,
        parent: store.count_accounts(Role::Parent).await?,
        student: store.count_accounts(Role::Student).await?,
    })
}

pub async fn delete(store: &dyn DataStore, identity: &Identity, role: Role, id: &str) -> Result<(), AccountError> {
    require_admin(identity)?;

    if role == Role::Admin && identity.id() == id {
        return Err(AccountError::Invalid(ValidationError::InvalidFormat(
            "administrators cannot delete their own account".to_string(),
        )));
    }

    if !store.delete_account(role, id).await? {
        return Err(AccountError::NotFound(format!("{} {}", role, id)));
    }

    info!(deleted_by = %identity.id(), role = %role, account_id = %id, "Account deleted");
    Ok(())
}
