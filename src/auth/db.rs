//! Credential store operations (users and sessions tables).

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::db::timestamp;

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UserInfo {
    #[serde(skip)]
    pub id: i64,
    pub username: String,
    pub email: String,
}

// ==================== Users ====================

/// Create a new user, returns the user ID.
///
/// Fails with a constraint violation if the username is taken in any casing.
pub fn create_user(conn: &Connection, username: &str, email: &str, password_hash: &str) -> Result<i64> {
    let now = timestamp(Utc::now());
    conn.execute(
        "INSERT INTO users (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![username, email, password_hash, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get login credentials by username (case-insensitive), returns (user_id, password_hash)
pub fn get_credentials(conn: &Connection, username: &str) -> Result<Option<(i64, String)>> {
    conn.query_row(
        "SELECT id, password_hash FROM users WHERE username = ?1",
        params![username],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

/// Resolve a username (case-insensitive) to its ID
pub fn get_user_id_by_username(conn: &Connection, username: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
    .optional()
}

/// Get a user by ID
pub fn get_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<UserInfo>> {
    conn.query_row(
        "SELECT id, username, email FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(UserInfo {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
            })
        },
    )
    .optional()
}

// ==================== Sessions ====================

/// Store a new session, returns its expiry.
///
/// A plain INSERT: an ID collision surfaces as a constraint error and never
/// replaces someone else's session.
pub fn insert_session(
    conn: &Connection,
    session_id: &str,
    user_id: i64,
    ttl: Duration,
) -> Result<DateTime<Utc>> {
    let now = Utc::now();
    let expires = now + ttl;
    conn.execute(
        "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![session_id, user_id, timestamp(now), timestamp(expires)],
    )?;
    Ok(expires)
}

/// Validate a session, returns its user ID if it exists and has not expired.
///
/// Expiry is fixed at creation; looking a session up does not extend it.
pub fn verify_session(conn: &Connection, session_id: &str) -> Result<Option<i64>> {
    let now = timestamp(Utc::now());
    conn.query_row(
        "SELECT user_id FROM sessions WHERE id = ?1 AND expires_at > ?2",
        params![session_id, now],
        |row| row.get(0),
    )
    .optional()
}

/// Delete a session (logout). Absent sessions are ignored.
pub fn delete_session(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
    Ok(())
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let now = timestamp(Utc::now());
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::is_constraint_violation;
    use crate::testing::TestEnv;

    fn user_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_username_is_case_insensitive() {
        let env = TestEnv::new().unwrap();
        let id = create_user(&env.conn, "Alice", "a@x.com", "salt:hash").unwrap();

        assert_eq!(get_credentials(&env.conn, "alice").unwrap(), Some((id, "salt:hash".to_string())));
        assert_eq!(get_user_id_by_username(&env.conn, "ALICE").unwrap(), Some(id));
        assert_eq!(get_user_id_by_username(&env.conn, "bob").unwrap(), None);
    }

    #[test]
    fn test_duplicate_username_any_case() {
        let env = TestEnv::new().unwrap();
        create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();

        let err = create_user(&env.conn, "ALICE", "other@x.com", "s:h").unwrap_err();
        assert!(is_constraint_violation(&err));
        assert_eq!(user_count(&env.conn), 1);
    }

    #[test]
    fn test_get_user_by_id() {
        let env = TestEnv::new().unwrap();
        let id = create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();

        let user = get_user_by_id(&env.conn, id).unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
        assert!(get_user_by_id(&env.conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_session_round_trip() {
        let env = TestEnv::new().unwrap();
        let id = create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();

        insert_session(&env.conn, "token", id, Duration::minutes(45)).unwrap();
        assert_eq!(verify_session(&env.conn, "token").unwrap(), Some(id));
        assert_eq!(verify_session(&env.conn, "garbage").unwrap(), None);
    }

    #[test]
    fn test_expired_session_is_absent() {
        let env = TestEnv::new().unwrap();
        let id = create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();

        insert_session(&env.conn, "stale", id, Duration::minutes(-1)).unwrap();
        assert_eq!(verify_session(&env.conn, "stale").unwrap(), None);

        // The row is still there until cleanup runs
        let rows: i64 = env
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_session_id_collision_is_an_error() {
        let env = TestEnv::new().unwrap();
        let alice = create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();
        let bob = create_user(&env.conn, "bob", "b@x.com", "s:h").unwrap();

        insert_session(&env.conn, "same", alice, Duration::minutes(5)).unwrap();
        assert!(insert_session(&env.conn, "same", bob, Duration::minutes(5)).is_err());
        assert_eq!(verify_session(&env.conn, "same").unwrap(), Some(alice));
    }

    #[test]
    fn test_delete_session() {
        let env = TestEnv::new().unwrap();
        let id = create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();
        insert_session(&env.conn, "token", id, Duration::minutes(45)).unwrap();

        delete_session(&env.conn, "token").unwrap();
        assert_eq!(verify_session(&env.conn, "token").unwrap(), None);
        // Deleting again is fine
        delete_session(&env.conn, "token").unwrap();
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let env = TestEnv::new().unwrap();
        let id = create_user(&env.conn, "alice", "a@x.com", "s:h").unwrap();
        insert_session(&env.conn, "live", id, Duration::minutes(45)).unwrap();
        insert_session(&env.conn, "dead", id, Duration::minutes(-5)).unwrap();

        assert_eq!(cleanup_expired_sessions(&env.conn).unwrap(), 1);
        assert_eq!(verify_session(&env.conn, "live").unwrap(), Some(id));
    }
}
