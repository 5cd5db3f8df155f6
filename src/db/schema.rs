//! Database schema with version-gated migrations.
//!
//! Each migration:
//! 1. Checks if the current schema version is less than the target version
//! 2. Runs the migration SQL within a transaction
//! 3. Records the new version in the `db_version` table
//!
//! New databases walk every migration once; existing databases only run the
//! ones they have not seen yet.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

use super::timestamp;

/// Current schema version. Increment when adding a migration.
pub const SCHEMA_VERSION: i32 = 4;

/// Bring the schema up to [`SCHEMA_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Bootstrap: the version table has to exist before we can read it
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS db_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL,
            description TEXT
        );
        "#,
    )?;

    let current_version = get_schema_version(conn)?;
    tracing::debug!("schema version: {}", current_version);

    if current_version < 1 {
        migrate(conn, 1, "Create credential store (users, sessions)", V1_CREDENTIALS)?;
    }
    if current_version < 2 {
        migrate(conn, 2, "Add species catalog (species, species_range, media)", V2_CATALOG)?;
    }
    if current_version < 3 {
        migrate(conn, 3, "Add observations", V3_OBSERVATIONS)?;
    }
    if current_version < 4 {
        migrate(conn, 4, "Add challenges, participants, invitations and scores", V4_CHALLENGES)?;
    }

    Ok(())
}

/// Get current schema version (0 if no versions recorded)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM db_version",
        [],
        |row| row.get(0),
    )
}

fn migrate(conn: &Connection, version: i32, description: &str, sql: &str) -> Result<()> {
    tracing::info!("Running migration v{}→v{}: {}", version - 1, version, description);

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        params![version, timestamp(Utc::now()), description],
    )?;
    tx.commit()?;

    tracing::info!("Recorded schema version {} - {}", version, description);
    Ok(())
}

// ============================================================
// MIGRATIONS
// ============================================================

const V1_CREDENTIALS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE COLLATE NOCASE,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

const V2_CATALOG: &str = r#"
    CREATE TABLE IF NOT EXISTS species (
        scientific_name TEXT PRIMARY KEY,
        common_name TEXT NOT NULL,
        family TEXT,
        order_name TEXT,
        diet TEXT,
        conservation_status TEXT
    );

    CREATE TABLE IF NOT EXISTS species_range (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        species_scientific_name TEXT NOT NULL,
        season TEXT NOT NULL,
        geom TEXT NOT NULL,
        FOREIGN KEY (species_scientific_name) REFERENCES species(scientific_name) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS media (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        species_scientific_name TEXT NOT NULL,
        media_type TEXT NOT NULL,
        url TEXT NOT NULL,
        license TEXT,
        contributor TEXT,
        FOREIGN KEY (species_scientific_name) REFERENCES species(scientific_name) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_species_common_name ON species(common_name);
    CREATE INDEX IF NOT EXISTS idx_species_range_species ON species_range(species_scientific_name);
    CREATE INDEX IF NOT EXISTS idx_media_species ON media(species_scientific_name);
"#;

const V3_OBSERVATIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS observations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        species_scientific_name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        observed_at TEXT NOT NULL,
        approved INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (species_scientific_name) REFERENCES species(scientific_name)
    );

    CREATE INDEX IF NOT EXISTS idx_observations_user ON observations(user_id);
    CREATE INDEX IF NOT EXISTS idx_observations_observed_at ON observations(observed_at);
"#;

const V4_CHALLENGES: &str = r#"
    CREATE TABLE IF NOT EXISTS challenge (
        name TEXT PRIMARY KEY,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        lc_points REAL NOT NULL DEFAULT 0,
        nt_points REAL NOT NULL DEFAULT 0,
        vu_points REAL NOT NULL DEFAULT 0,
        en_points REAL NOT NULL DEFAULT 0,
        cr_points REAL NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS challenge_participants (
        challenge_name TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        PRIMARY KEY (challenge_name, user_id),
        FOREIGN KEY (challenge_name) REFERENCES challenge(name) ON DELETE CASCADE,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS challenge_invitations (
        challenge_name TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        invited_by INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (challenge_name, user_id),
        FOREIGN KEY (challenge_name) REFERENCES challenge(name) ON DELETE CASCADE,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (invited_by) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_challenge_participants_user ON challenge_participants(user_id);
    CREATE INDEX IF NOT EXISTS idx_challenge_invitations_user ON challenge_invitations(user_id);

    -- Per-participant scores: observations inside the challenge window,
    -- weighted by the challenge's points for the species' conservation status
    CREATE VIEW IF NOT EXISTS user_challenge_points AS
    SELECT
        cp.challenge_name,
        u.id AS user_id,
        u.username,
        SUM(CASE WHEN s.conservation_status = 'LC' THEN c.lc_points ELSE 0 END) AS lc_score,
        SUM(CASE WHEN s.conservation_status = 'NT' THEN c.nt_points ELSE 0 END) AS nt_score,
        SUM(CASE WHEN s.conservation_status = 'VU' THEN c.vu_points ELSE 0 END) AS vu_score,
        SUM(CASE WHEN s.conservation_status = 'EN' THEN c.en_points ELSE 0 END) AS en_score,
        SUM(CASE WHEN s.conservation_status = 'CR' THEN c.cr_points ELSE 0 END) AS cr_score
    FROM challenge_participants cp
    JOIN challenge c ON c.name = cp.challenge_name
    JOIN users u ON u.id = cp.user_id
    LEFT JOIN observations o
        ON o.user_id = cp.user_id
        AND o.observed_at >= c.start_date
        AND o.observed_at <= c.end_date
    LEFT JOIN species s ON s.scientific_name = o.species_scientific_name
    GROUP BY cp.challenge_name, u.id, u.username;
"#;
