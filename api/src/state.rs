use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;

use crate::auth::AuthManager;
use crate::auth_middleware::{Authenticator, JwtAuthenticator};
use crate::config::AppConfig;
use crate::store::ContactStore;

/// Collaborators shared by every controller, wired once at startup
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
    pub authenticator: Arc<dyn Authenticator>,
    pub contacts: Arc<ContactStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let auth = Arc::new(AuthManager::new(
            &config.jwt_secret,
            Duration::hours(config.token_ttl_hours),
        ));
        Self {
            authenticator: Arc::new(JwtAuthenticator::new(Arc::clone(&auth))),
            auth,
            contacts: Arc::new(ContactStore::new()),
            started_at: Instant::now(),
        }
    }
}
