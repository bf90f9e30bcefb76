use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::accounts::insert_account;
use crate::core::config::{BackendKind, Config};
use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::models::account::NewAccount;
use crate::models::identity::Role;
use crate::store::{memory::MemoryStore, rest::RestStore, DataStore};

/// Outcome of the startup admin check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    NotConfigured,
    AlreadyPresent,
    Created,
    /// The username belongs to a non-admin account
    Skipped,
}

pub fn build_store(config: &Config) -> Result<Arc<dyn DataStore>> {
    let store: Arc<dyn DataStore> = match config.backend.kind {
        BackendKind::Rest => {
            let store = RestStore::new(
                config.backend.url.clone(),
                config.backend.api_key.clone(),
                Duration::from_secs(config.backend.request_timeout_secs),
            )
            .context("Failed to create data service client")?;
            info!(url = %config.backend.url, "Using REST data service");
            Arc::new(store)
        }
        BackendKind::Memory => {
            warn!("Using in-memory data store, nothing will be persisted");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

// this runs at boot time
pub async fn ensure_bootstrap_admin(state: &AppState) -> Result<Bootstrap> {
    let b = &state.config.bootstrap;
    let (Some(username), Some(password), Some(name), Some(email), Some(gender)) = (
        &b.admin_username,
        &b.admin_password,
        &b.admin_name,
        &b.admin_email,
        b.admin_gender,
    ) else {
        return Ok(Bootstrap::NotConfigured);
    };

    let existing = state
        .store
        .find_by_username(Role::Admin, username.trim())
        .await
        .context("Failed to look up bootstrap admin")?;

    if !existing.is_empty() {
        info!(username = %username, "Bootstrap admin already present");
        return Ok(Bootstrap::AlreadyPresent);
    }

    let new = NewAccount {
        username: username.clone(),
        password: password.clone(),
        name: name.clone(),
        email: email.clone(),
        gender: Some(gender),
        contact: None,
        date_of_birth: None,
        student_id: None,
        grade_level: None,
        room: None,
        stream: None,
        parent_name: None,
        supervisor_id: None,
    };

    let _guard = state.account_writes.lock().await;
    match insert_account(state.store.as_ref(), &state.hasher, Role::Admin, new).await {
        Ok(admin) => {
            info!(username = %admin.username, account_id = %admin.id, "Bootstrap admin created");
            Ok(Bootstrap::Created)
        }
        Err(AccountError::UsernameTaken(username)) => {
            warn!(
                username = %username,
                "Bootstrap admin username belongs to another role, not creating admin"
            );
            Ok(Bootstrap::Skipped)
        }
        Err(e) => Err(e).context("Failed to create bootstrap admin"),
    }
}
