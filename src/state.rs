//! Application state shared by all handlers.

use chrono::Duration;

use crate::config::Config;
use crate::db::DbPool;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database (credentials, catalog, observations, challenges)
    pub db: DbPool,

    /// Lifetime of newly issued sessions
    pub session_ttl: Duration,

    /// Whether session cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: DbPool, config: &Config) -> Self {
        Self {
            db,
            session_ttl: config.session_ttl(),
            secure_cookies: config.secure_cookies,
        }
    }

    /// Fresh in-memory database with default settings
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let db = crate::db::init_in_memory().expect("in-memory database");
        Self::new(db, &Config::default())
    }
}
