//! Authentication: password hashing, sessions, the route gate and the
//! login/register/logout handlers.
//!
//! The flow is `Anonymous -> Authenticating -> Authenticated`, with
//! `Rejected` as the terminal failure. Unknown usernames and wrong passwords
//! are indistinguishable to callers.

pub mod db;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session;

use chrono::Duration;
use std::sync::LazyLock;

use crate::db::{is_constraint_violation, try_lock, DbPool};
use crate::error::{AppError, StorageContext};

pub use handlers::*;
pub use middleware::{require_session, AuthUser, OptionalAuth};
pub use session::SESSION_COOKIE_NAME;

/// Hash checked against when the username is unknown, so that path costs the
/// same derivation as a real check.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| password::hash_password("unknown-user").ok());

/// Derive the unknown-user hash up front, so the first failed login does not
/// pay for it.
pub fn prepare_dummy_hash() {
    if LazyLock::force(&DUMMY_HASH).is_none() {
        tracing::warn!("Could not derive the unknown-user hash");
    }
}

/// Check a username/password pair and open a session on success.
///
/// Returns `None` for any credential failure. A corrupt stored hash is an
/// error, not a failed login. The lock is released while the password is
/// derived.
pub fn authenticate(
    pool: &DbPool,
    username: &str,
    password: &str,
    ttl: Duration,
) -> Result<Option<String>, AppError> {
    let credentials = {
        let conn = try_lock(pool)?;
        db::get_credentials(&conn, username).storage("select user by username")?
    };

    let Some((user_id, stored)) = credentials else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = password::verify_password(dummy, password);
        }
        return Ok(None);
    };

    match password::verify_password(&stored, password) {
        Ok(true) => {}
        Ok(false) => return Ok(None),
        Err(e) => {
            tracing::warn!("Password check failed for user {}", user_id);
            return Err(e);
        }
    }

    let conn = try_lock(pool)?;
    let session_id = session::create_session(&conn, user_id, ttl).storage("insert session")?;
    tracing::info!("User {} logged in", user_id);
    Ok(Some(session_id))
}

/// Create an account, returns the new user ID.
///
/// Any uniqueness failure is reported as [`AppError::DuplicateUser`] without
/// naming the field. No session is created.
pub fn register(pool: &DbPool, username: &str, password: &str, email: &str) -> Result<i64, AppError> {
    let password_hash = password::hash_password(password)?;

    let conn = try_lock(pool)?;
    match db::create_user(&conn, username, email, &password_hash) {
        Ok(user_id) => {
            tracing::info!("Registered user {}", user_id);
            Ok(user_id)
        }
        Err(e) if is_constraint_violation(&e) => Err(AppError::DuplicateUser),
        Err(e) => Err(e).storage("insert user"),
    }
}
