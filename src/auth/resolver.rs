use crate::auth::password::verify_password;
use crate::core::error::AuthError;
use crate::models::account::Account;
use crate::models::identity::{Identity, Role, PROBE_ORDER};
use crate::store::DataStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of looking up one role table
#[derive(Debug)]
enum Probe {
    Match(Account),
    NoMatch,
    Failed(String),
}

/// Maps a username/password pair to exactly one role-tagged identity.
///
/// All four role tables are queried concurrently; the answers are then
/// read in [`PROBE_ORDER`] and the first table that either matched or
/// failed decides the outcome, which is what a sequential probe would have
/// returned.
pub struct CredentialResolver {
    store: Arc<dyn DataStore>,
    lookup_timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn DataStore>, lookup_timeout: Duration, retries: u32, backoff: Duration) -> Self {
        Self {
            store,
            lookup_timeout,
            retries,
            backoff,
        }
    }

    pub async fn resolve(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let (admin, supervisor, parent, student) = tokio::join!(
            self.probe(Role::Admin, username, password),
            self.probe(Role::Supervisor, username, password),
            self.probe(Role::Parent, username, password),
            self.probe(Role::Student, username, password),
        );

        let probes = PROBE_ORDER.into_iter().zip([admin, supervisor, parent, student]);
        decide(username, probes)
    }

    async fn probe(&self, role: Role, username: &str, password: &str) -> Probe {
        let mut attempt = 0u32;
        loop {
            let reason = match tokio::time::timeout(
                self.lookup_timeout,
                self.store.find_by_username(role, username),
            )
            .await
            {
                Ok(Ok(rows)) => return verify_rows(role, username, password, rows).await,
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("lookup in {} timed out after {:?}", role.table(), self.lookup_timeout),
            };

            if attempt >= self.retries {
                return Probe::Failed(reason);
            }

            let delay = self.backoff * 2u32.saturating_pow(attempt);
            warn!(
                table = role.table(),
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %reason,
                "Credential lookup failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Argon2 verification is CPU-bound, so it runs on the blocking pool
async fn verify_rows(role: Role, username: &str, password: &str, rows: Vec<Account>) -> Probe {
    if rows.is_empty() {
        return Probe::NoMatch;
    }

    let username = username.to_string();
    let password = password.to_string();
    match tokio::task::spawn_blocking(move || match_rows(role, &username, &password, rows)).await {
        Ok(probe) => probe,
        Err(e) => Probe::Failed(format!("password check for {} failed: {}", role.table(), e)),
    }
}

fn match_rows(role: Role, username: &str, password: &str, rows: Vec<Account>) -> Probe {
    let mut matches: Vec<Account> = rows
        .into_iter()
        .filter(|row| row.username == username && verify_password(&row.password_hash, password))
        .collect();

    match matches.len() {
        0 => Probe::NoMatch,
        1 => Probe::Match(matches.remove(0)),
        n => {
            warn!(
                table = role.table(),
                username = %username,
                rows = n,
                "Several rows share these credentials, ignoring table"
            );
            Probe::NoMatch
        }
    }
}

fn decide(username: &str, probes: impl IntoIterator<Item = (Role, Probe)>) -> Result<Identity, AuthError> {
    let mut winner: Option<(Role, Account)> = None;
    let mut shadowed: Vec<Role> = Vec::new();

    for (role, probe) in probes {
        match probe {
            Probe::Failed(reason) if winner.is_none() => {
                warn!(table = role.table(), error = %reason, "Credential lookup unavailable");
                return Err(AuthError::ResolverUnavailable(reason));
            }
            Probe::Match(account) => {
                if winner.is_none() {
                    winner = Some((role, account));
                } else {
                    shadowed.push(role);
                }
            }
            _ => {}
        }
    }

    match winner {
        Some((role, account)) => {
            if !shadowed.is_empty() {
                let shadowed: Vec<&str> = shadowed.iter().map(|r| r.as_str()).collect();
                warn!(
                    username = %username,
                    resolved_role = %role,
                    shadowed_roles = ?shadowed,
                    "Credentials match several role tables, using the earliest in probe order"
                );
            }
            info!(username = %username, role = %role, "Credentials resolved");
            Ok(Identity::from_role(role, account.principal()))
        }
        None => {
            debug!(username = %username, "No role table matched");
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::auth::password::PasswordHasher;
    use crate::testing::{account, credential, seeded_store};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn resolver(store: Arc<MemoryStore>) -> CredentialResolver {
        CredentialResolver::new(store, Duration::from_millis(500), 0, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_each_role_table_resolves_to_its_role() {
        let store = Arc::new(seeded_store());
        let resolver = resolver(store);

        let cases = [
            ("root", "rootpw", Role::Admin, "A1"),
            ("msmith", "sv-pw", Role::Supervisor, "SV1"),
            ("jdoe", "pw1", Role::Parent, "P1"),
            ("alice", "alice-pw", Role::Student, "S1"),
        ];

        for (username, password, role, id) in cases {
            let identity = resolver.resolve(username, password).await.unwrap();
            assert_eq!(identity.role(), role, "{}", username);
            assert_eq!(identity.id(), id);
            assert_eq!(identity.username(), username);
        }
    }

    #[tokio::test]
    async fn test_unknown_credentials_are_invalid() {
        let resolver = resolver(Arc::new(seeded_store()));

        assert_eq!(
            resolver.resolve("nobody", "pw").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            resolver.resolve("jdoe", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_username_match_is_case_sensitive() {
        let resolver = resolver(Arc::new(seeded_store()));
        assert_eq!(
            resolver.resolve("JDOE", "pw1").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_empty_input_is_invalid() {
        let resolver = resolver(Arc::new(seeded_store()));
        assert_eq!(resolver.resolve("", "pw1").await.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(resolver.resolve("jdoe", "").await.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_duplicate_credentials_resolve_to_earlier_table() {
        let store = Arc::new(MemoryStore::new());
        store.seed_account(Role::Student, credential("S9", "twin", "same-pw", "Twin Student"));
        store.seed_account(Role::Supervisor, credential("SV9", "twin", "same-pw", "Twin Supervisor"));
        store.seed_account(Role::Parent, credential("P9", "twin", "same-pw", "Twin Parent"));

        let identity = resolver(store).resolve("twin", "same-pw").await.unwrap();
        assert_eq!(identity.role(), Role::Supervisor);
        assert_eq!(identity.id(), "SV9");
    }

    #[tokio::test]
    async fn test_admin_wins_over_every_other_table() {
        let store = Arc::new(MemoryStore::new());
        for (role, id) in [(Role::Student, "S9"), (Role::Parent, "P9"), (Role::Admin, "A9")] {
            store.seed_account(role, credential(id, "dup", "pw", "Dup"));
        }

        let identity = resolver(store).resolve("dup", "pw").await.unwrap();
        assert!(matches!(identity, Identity::Admin(_)));
    }

    #[tokio::test]
    async fn test_same_username_different_passwords_picks_matching_table() {
        let store = Arc::new(MemoryStore::new());
        store.seed_account(Role::Admin, credential("A9", "sam", "admin-pw", "Sam Admin"));
        store.seed_account(Role::Student, credential("S9", "sam", "student-pw", "Sam Student"));

        let identity = resolver(store).resolve("sam", "student-pw").await.unwrap();
        assert_eq!(identity.role(), Role::Student);
    }

    #[tokio::test]
    async fn test_two_matching_rows_in_one_table_fall_through() {
        let store = Arc::new(MemoryStore::new());
        store.seed_account(Role::Admin, credential("A8", "pair", "pw", "First"));
        store.seed_account(Role::Admin, credential("A9", "pair", "pw", "Second"));
        store.seed_account(Role::Student, credential("S9", "pair", "pw", "Student"));

        let identity = resolver(store).resolve("pair", "pw").await.unwrap();
        assert_eq!(identity.role(), Role::Student);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unavailable_not_invalid() {
        let store = Arc::new(seeded_store());
        store.fail_table("admin_users");

        let err = resolver(store).resolve("jdoe", "pw1").await.unwrap_err();
        assert!(matches!(err, AuthError::ResolverUnavailable(_)));
    }

    #[tokio::test]
    async fn test_failure_after_a_match_does_not_matter() {
        let store = Arc::new(seeded_store());
        store.fail_table("student_users");

        let identity = resolver(store).resolve("jdoe", "pw1").await.unwrap();
        assert_eq!(identity.role(), Role::Parent);
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_unavailable() {
        let store = Arc::new(seeded_store());
        store.set_latency("supervisor_users", Duration::from_millis(300));

        let resolver = CredentialResolver::new(store, Duration::from_millis(20), 0, Duration::from_millis(1));
        let err = resolver.resolve("jdoe", "pw1").await.unwrap_err();
        assert!(matches!(err, AuthError::ResolverUnavailable(reason) if reason.contains("timed out")));
    }

    #[tokio::test]
    async fn test_retries_recover_once_table_is_back() {
        let store = Arc::new(seeded_store());
        store.fail_table("admin_users");

        let resolver = CredentialResolver::new(
            Arc::clone(&store) as Arc<dyn DataStore>,
            Duration::from_millis(500),
            3,
            Duration::from_millis(30),
        );

        let restore = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                store.restore_table("admin_users");
            })
        };

        let identity = resolver.resolve("root", "rootpw").await.unwrap();
        restore.await.unwrap();
        assert_eq!(identity.role(), Role::Admin);
    }

    #[tokio::test]
    async fn test_scenario_parent_login() {
        let resolver = resolver(Arc::new(seeded_store()));
        let identity = resolver.resolve("jdoe", "pw1").await.unwrap();

        assert!(matches!(identity, Identity::Parent(_)));
        assert_eq!(identity.name(), "John Doe");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_check_lets_other_tasks_run() {
        let store = Arc::new(MemoryStore::new());
        let mut row = account("S9", "slow", "Slow Hash");
        row.password_hash = PasswordHasher::new(4096, 2, 1).unwrap().hash("slow-pw").unwrap();
        store.seed_account(Role::Student, row);

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let other = tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        // On a single-threaded runtime the other task can only have run if
        // the resolver yielded while the hash was being checked
        let identity = resolver(store).resolve("slow", "slow-pw").await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(identity.id(), "S9");
        other.await.unwrap();
    }
}
