pub mod challenges;
pub mod observations;
pub mod schema;
pub mod species;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug, thiserror::Error)]
#[error("Database unavailable")]
pub struct DbLockError;

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
    pool.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
        DbLockError
    })
}

/// Open (creating if needed) the database at `path` and run migrations.
pub fn init_db(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let conn = Connection::open(path)?;
    prepare(conn)
}

/// In-memory database with the full schema.
pub fn init_in_memory() -> Result<DbPool> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<DbPool> {
    conn.pragma_update(None, "foreign_keys", true)?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Close the connection at shutdown.
///
/// Succeeds only once every other handle to the pool has been dropped;
/// otherwise the connection is left to close when the last handle goes.
pub fn close(pool: DbPool) {
    match Arc::try_unwrap(pool) {
        Ok(mutex) => {
            let conn = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
            match conn.close() {
                Ok(()) => tracing::info!("Database closed"),
                Err((_, e)) => tracing::warn!("Failed to close database: {}", e),
            }
        }
        Err(_) => tracing::warn!("Database still in use at shutdown, leaving it to drop"),
    }
}

/// Canonical text form of a timestamp.
///
/// Fixed precision and a `Z` suffix make lexical order match time order,
/// which every `expires_at > ?` style comparison relies on.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, reporting failures as a column conversion error.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Whether an error is a UNIQUE / PRIMARY KEY / FOREIGN KEY violation
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Build a `LIKE` pattern matching `term` anywhere, lowercased, with
/// wildcards in the term escaped (use with `ESCAPE '\'`).
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
