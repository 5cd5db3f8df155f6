//! Test utilities for database setup.
//!
//! Provides helpers that reuse the authoritative schema initialization,
//! so test code never duplicates table definitions.

use rusqlite::Connection;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

use crate::db::species::{import_catalog, Catalog};

/// Test environment with a file-backed database using the real schema.
///
/// The database lives in a temporary directory that is removed on drop.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Connection with all migrations applied and foreign keys enforced
    pub conn: Connection,
}

impl TestEnv {
    /// Create an empty database.
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("birdspot.db"))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        crate::db::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Create a database seeded with [`sample_catalog`].
    pub fn with_catalog() -> rusqlite::Result<Self> {
        let env = Self::new()?;
        import_catalog(&env.conn, &sample_catalog())?;
        Ok(env)
    }

    /// Insert a user with a throwaway password hash, returning the user id.
    pub fn add_user(&self, username: &str) -> rusqlite::Result<i64> {
        crate::auth::db::create_user(
            &self.conn,
            username,
            &format!("{}@example.com", username),
            "00:00",
        )
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

/// Three species covering distinct conservation statuses, with one range
/// and one image for the pintail.
pub fn sample_catalog() -> Catalog {
    serde_json::from_value(json!({
        "species": [
            {
                "scientific_name": "Anas acuta",
                "common_name": "Northern Pintail",
                "family": "Anatidae",
                "order_name": "Anseriformes",
                "diet": "Omnivore",
                "conservation_status": "LC"
            },
            {
                "scientific_name": "Aquila adalberti",
                "common_name": "Spanish Imperial Eagle",
                "family": "Accipitridae",
                "order_name": "Accipitriformes",
                "diet": "Carnivore",
                "conservation_status": "Vulnerable"
            },
            {
                "scientific_name": "Pica pica",
                "common_name": "Eurasian Magpie",
                "family": "Corvidae",
                "order_name": "Passeriformes",
                "diet": "Omnivore",
                "conservation_status": "LC"
            }
        ],
        "ranges": [
            {
                "species_scientific_name": "Anas acuta",
                "season": "breeding",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[10.0, 60.0], [30.0, 60.0], [30.0, 70.0], [10.0, 60.0]]]
                }
            },
            {
                "species_scientific_name": "Anas acuta",
                "season": "nonbreeding",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-10.0, 35.0], [10.0, 35.0], [10.0, 45.0], [-10.0, 35.0]]]
                }
            }
        ],
        "media": [
            {
                "species_scientific_name": "Anas acuta",
                "url": "https://example.org/pintail.jpg",
                "license": "CC BY 4.0",
                "contributor": "J. Birder"
            }
        ]
    }))
    .expect("sample catalog is valid")
}
