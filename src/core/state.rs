// Application state (AppState)

use crate::access::visibility::VisibilityFilter;
use crate::auth::password::PasswordHasher;
use crate::auth::resolver::CredentialResolver;
use crate::auth::session::SessionStore;
use crate::core::config::Config;
use crate::store::DataStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Shared application state
///
/// Contains all shared components that are accessed by request handlers.
/// All fields are wrapped in Arc for efficient cloning across threads.
#[derive(Clone)]
pub struct AppState {
    /// Backing data service
    pub store: Arc<dyn DataStore>,

    /// Username/password to identity
    pub resolver: Arc<CredentialResolver>,

    /// Attendance read scoping
    pub visibility: Arc<VisibilityFilter>,

    /// Active login sessions
    pub sessions: Arc<SessionStore>,

    pub hasher: Arc<PasswordHasher>,

    /// Held across the username check and the write when creating or
    /// editing accounts. Only serializes writers in this process.
    pub account_writes: Arc<Mutex<()>>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DataStore>) -> Self {
        Self::with_hasher(config, store, PasswordHasher::default())
    }

    pub fn with_hasher(config: Config, store: Arc<dyn DataStore>, hasher: PasswordHasher) -> Self {
        let config = Arc::new(config);

        let resolver = Arc::new(CredentialResolver::new(
            Arc::clone(&store),
            Duration::from_millis(config.backend.lookup_timeout_ms),
            config.backend.lookup_retries,
            Duration::from_millis(config.backend.retry_backoff_ms),
        ));

        let visibility = Arc::new(VisibilityFilter::new(Arc::clone(&store)));

        Self {
            store,
            resolver,
            visibility,
            sessions: Arc::new(SessionStore::new(config.session.ttl_seconds)),
            hasher: Arc::new(hasher),
            account_writes: Arc::new(Mutex::new(())),
            config,
        }
    }
}
