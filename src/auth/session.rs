use crate::models::identity::{Identity, Role};
use crate::utils::time::{current_timestamp, has_expired};
use dashmap::DashMap;
use tracing::{debug, info};

/// A logged-in identity bound to an opaque bearer token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
    /// Unix timestamp
    pub issued_at: i64,
    /// Unix timestamp
    pub expires_at: i64,
}

/// Server-side session registry.
///
/// Sessions are created on login and end on logout or when their TTL runs
/// out; expired entries are dropped on access and by [`purge_expired`].
///
/// [`purge_expired`]: SessionStore::purge_expired
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl_seconds: i64,
}

fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_seconds,
        }
    }

    pub fn create(&self, identity: Identity) -> Session {
        self.create_at(identity, current_timestamp())
    }

    pub fn create_at(&self, identity: Identity, now: i64) -> Session {
        let session = Session {
            token: generate_token(),
            identity,
            issued_at: now,
            expires_at: now + self.ttl_seconds,
        };

        info!(
            user_id = %session.identity.id(),
            role = %session.identity.role(),
            expires_at = session.expires_at,
            "Session created"
        );

        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.get_at(token, current_timestamp())
    }

    /// Returns the session unless it is unknown or expired. Expired
    /// sessions are removed.
    pub fn get_at(&self, token: &str, now: i64) -> Option<Session> {
        let session = self.sessions.get(token).map(|entry| entry.value().clone())?;
        if has_expired(session.expires_at, now) {
            self.sessions.remove(token);
            debug!(user_id = %session.identity.id(), "Session expired");
            return None;
        }
        Some(session)
    }

    /// Ends a session. Returns false if the token was not active.
    pub fn invalidate(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                info!(user_id = %session.identity.id(), "Session invalidated");
                true
            }
            None => false,
        }
    }

    /// Ends every session of the account `id` in the `role` table.
    /// Returns how many were removed.
    pub fn invalidate_identity(&self, role: Role, id: &str) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !(session.identity.role() == role && session.identity.id() == id));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!(user_id = %id, role = %role, removed, "Sessions invalidated for account");
        }
        removed
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(current_timestamp())
    }

    pub fn purge_expired_at(&self, now: i64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !has_expired(session.expires_at, now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
