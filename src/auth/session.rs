//! Session issuance and the session cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;
use rand_core::{OsRng, RngCore};
use rusqlite::{Connection, Result};

use super::db as auth_db;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "sid";

/// Session lifetime used when none is configured (45 minutes)
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 45;

const TOKEN_BYTES: usize = 32;

/// Generate a new session ID: 32 random bytes, hex-encoded
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issue a session for `user_id` valid for `ttl`, returns the token
pub fn create_session(conn: &Connection, user_id: i64, ttl: Duration) -> Result<String> {
    let session_id = generate_session_id();
    auth_db::insert_session(conn, &session_id, user_id, ttl)?;
    Ok(session_id)
}

/// Cookie handing the session token to the browser.
///
/// `Max-Age` matches the server-side expiry so both lapse together.
pub fn session_cookie(session_id: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Cookie that makes the browser drop the session token
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build()
}
